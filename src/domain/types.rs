// ==========================================
// 订阅配送管理系统 - 领域类型定义
// ==========================================
// 计价规则作用域: unit > center > city > default
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计价作用域 (Price Scope Type)
// ==========================================
// 红线: 只支持四种作用域,优先级固定
// 序列化格式: snake_case (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceScopeType {
    Unit,    // 单元(精确到小区/楼栋)
    Center,  // 配送中心
    City,    // 城市
    Default, // 全局默认(生效日起向后延续)
}

impl fmt::Display for PriceScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PriceScopeType {
    /// 按精确匹配顺序排列的作用域（不含 default）
    pub const PRECEDENCE: [PriceScopeType; 3] =
        [PriceScopeType::Unit, PriceScopeType::Center, PriceScopeType::City];

    /// 从数据库字符串解析（大小写/空白不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "unit" => Some(PriceScopeType::Unit),
            "center" => Some(PriceScopeType::Center),
            "city" => Some(PriceScopeType::City),
            "default" => Some(PriceScopeType::Default),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PriceScopeType::Unit => "unit",
            PriceScopeType::Center => "center",
            PriceScopeType::City => "city",
            PriceScopeType::Default => "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_type_parse() {
        assert_eq!(PriceScopeType::from_str(" City "), Some(PriceScopeType::City));
        assert_eq!(PriceScopeType::from_str("DEFAULT"), Some(PriceScopeType::Default));
        assert_eq!(PriceScopeType::from_str("region"), None);
    }

    #[test]
    fn test_scope_type_serde() {
        let json = serde_json::to_string(&PriceScopeType::Center).unwrap();
        assert_eq!(json, "\"center\"");
        let back: PriceScopeType = serde_json::from_str("\"unit\"").unwrap();
        assert_eq!(back, PriceScopeType::Unit);
    }
}
