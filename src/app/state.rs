// ==========================================
// 订阅配送管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 所有仓储共用同一个 Arc<Mutex<Connection>>
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    BillingApi, CityCenterApi, CouponApi, DashboardApi, DeliveryApi, InventoryApi, PricingApi,
    SubscriberApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    CityCenterRepository, CouponRepository, InventoryAllocationRepository, MissedDeliveryRepository,
    PaymentCycleRepository, PriceRuleRepository, SubscriberRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub pricing_api: Arc<PricingApi>,
    pub billing_api: Arc<BillingApi>,
    pub delivery_api: Arc<DeliveryApi>,
    pub inventory_api: Arc<InventoryApi>,
    pub city_center_api: Arc<CityCenterApi>,
    pub subscriber_api: Arc<SubscriberApi>,
    pub coupon_api: Arc<CouponApi>,
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let subscriber_repo = Arc::new(SubscriberRepository::from_connection(conn.clone()));
        let price_rule_repo = Arc::new(PriceRuleRepository::from_connection(conn.clone()));
        let missed_delivery_repo = Arc::new(MissedDeliveryRepository::from_connection(conn.clone()));
        let allocation_repo = Arc::new(InventoryAllocationRepository::from_connection(conn.clone()));
        let payment_cycle_repo = Arc::new(PaymentCycleRepository::from_connection(conn.clone()));
        let city_center_repo = Arc::new(CityCenterRepository::from_connection(conn.clone()));
        let coupon_repo = Arc::new(CouponRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let pricing_api = Arc::new(PricingApi::new(
            price_rule_repo,
            subscriber_repo.clone(),
            config_manager.clone(),
        ));

        let billing_api = Arc::new(BillingApi::new(
            pricing_api.clone(),
            payment_cycle_repo.clone(),
            config_manager.clone(),
        ));

        let delivery_api = Arc::new(DeliveryApi::new(
            missed_delivery_repo.clone(),
            subscriber_repo.clone(),
        ));

        let inventory_api = Arc::new(InventoryApi::new(
            allocation_repo,
            subscriber_repo.clone(),
            missed_delivery_repo,
            config_manager.clone(),
        ));

        let city_center_api = Arc::new(CityCenterApi::new(city_center_repo));
        let coupon_api = Arc::new(CouponApi::new(coupon_repo));
        let dashboard_api = Arc::new(DashboardApi::new(subscriber_repo.clone(), payment_cycle_repo));
        let subscriber_api = Arc::new(SubscriberApi::new(subscriber_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            pricing_api,
            billing_api,
            delivery_api,
            inventory_api,
            city_center_api,
            subscriber_api,
            coupon_api,
            dashboard_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// 优先级: SUBSCRIPTION_OPS_DB_PATH > 用户数据目录/subscription-ops/ > ./subscription_ops.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SUBSCRIPTION_OPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./subscription_ops.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("subscription-ops");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("subscription_ops.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_on_temp_db() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);
        assert_eq!(state.config_manager.get_default_daily_price().unwrap(), 8.0);
        assert!(state.city_center_api.list().unwrap().is_empty());
        assert!(state.coupon_api.list(false).unwrap().is_empty());
        assert_eq!(state.subscriber_api.lookups().unwrap().landmarks.len(), 0);
    }
}
