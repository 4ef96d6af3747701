// ==========================================
// 订阅配送管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::domain::pricing::DEFAULT_DAILY_PRICE;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 全局作用域 ID
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![GLOBAL_SCOPE, key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取非负数值配置; 缺失或格式错误时回退默认值
    fn get_non_negative_f64(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => {
                tracing::warn!(config_key = key, raw_value = %value, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式,键有序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let config_map = stmt
            .query_map(params![GLOBAL_SCOPE], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 计价配置 =====

    /// 基准每日单价（无 default 规则时使用）
    pub fn get_default_daily_price(&self) -> RepositoryResult<f64> {
        self.get_non_negative_f64(config_keys::DEFAULT_DAILY_PRICE, DEFAULT_DAILY_PRICE)
    }

    /// 新建缴费周期的默认产品代码
    pub fn get_default_product_code(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(config_keys::DEFAULT_PRODUCT_CODE, "DEFAULT")?;
        let trimmed = value.trim();
        Ok(if trimmed.is_empty() { "DEFAULT".to_string() } else { trimmed.to_string() })
    }

    // ===== 导入配置 =====

    /// 单条分配记录数量上限
    pub fn get_max_allocation_quantity(&self) -> RepositoryResult<f64> {
        self.get_non_negative_f64(config_keys::MAX_ALLOCATION_QUANTITY, 100_000.0)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 计价
    pub const DEFAULT_DAILY_PRICE: &str = "pricing/default_daily_price";

    // 缴费
    pub const DEFAULT_PRODUCT_CODE: &str = "billing/default_product_code";

    // 导入
    pub const MAX_ALLOCATION_QUANTITY: &str = "import/max_allocation_quantity";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = setup();
        assert_eq!(cfg.get_default_daily_price().unwrap(), 8.0);
        assert_eq!(cfg.get_max_allocation_quantity().unwrap(), 100_000.0);
        assert_eq!(cfg.get_default_product_code().unwrap(), "DEFAULT");
    }

    #[test]
    fn test_override_and_invalid_value() {
        let cfg = setup();
        cfg.set_global_config_value(config_keys::DEFAULT_DAILY_PRICE, "9.5").unwrap();
        assert_eq!(cfg.get_default_daily_price().unwrap(), 9.5);

        cfg.set_global_config_value(config_keys::DEFAULT_DAILY_PRICE, "-1").unwrap();
        assert_eq!(cfg.get_default_daily_price().unwrap(), 8.0);

        cfg.set_global_config_value(config_keys::DEFAULT_DAILY_PRICE, "abc").unwrap();
        assert_eq!(cfg.get_default_daily_price().unwrap(), 8.0);
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let cfg = setup();
        cfg.set_global_config_value("b", "2").unwrap();
        cfg.set_global_config_value("a", "1").unwrap();
        assert_eq!(cfg.get_config_snapshot().unwrap(), r#"{"a":"1","b":"2"}"#);
    }
}
