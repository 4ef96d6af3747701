// ==========================================
// 订阅配送管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 逐日计价解析、库存消耗推算与结余核算
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 纯计算
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::PriceScopeType;

// 领域实体
pub use domain::{
    CityCenter, ConsumptionRecord, Coupon, DailyPrice, InventoryAllocation, InventorySummary,
    MissedDelivery, PaymentCycle, PriceRule, Subscriber,
};

// 引擎
pub use engine::{InventoryReconciler, PriceResolver};

// API
pub use api::{
    BillingApi, CouponApi, DashboardApi, DeliveryApi, InventoryApi, PricingApi, SubscriberApi,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订阅配送管理系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
