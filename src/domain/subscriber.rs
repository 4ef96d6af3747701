// ==========================================
// 订阅配送管理系统 - 订户领域模型
// ==========================================
// unit / city / center_name 是计价规则与库存分配可指向的三个作用域
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Subscriber - 订户
// ==========================================
// 核心计算只读取快照,不修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub name: String,

    // ===== 联系方式 =====
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    // ===== 作用域字段 =====
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub center_name: Option<String>,

    // ===== 其他 =====
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl Subscriber {
    /// 已归属配送中心时返回中心名; 缺失或空串视为未归属
    ///
    /// 仅含空白的中心名原样保留, 作为独立分组
    pub fn assigned_center(&self) -> Option<&str> {
        self.center_name.as_deref().filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_center(center: Option<&str>) -> Subscriber {
        Subscriber {
            id: "s1".to_string(),
            center_name: center.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_assigned_center_only_drops_missing_or_empty() {
        assert_eq!(with_center(None).assigned_center(), None);
        assert_eq!(with_center(Some("")).assigned_center(), None);
        assert_eq!(with_center(Some("  ")).assigned_center(), Some("  "));
        assert_eq!(with_center(Some("Naini")).assigned_center(), Some("Naini"));
    }
}

/// 订户局部更新
///
/// None 表示不修改; Some("") 表示清空该字段（name 除外）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub unit: Option<String>,
    pub city: Option<String>,
    pub center_name: Option<String>,
    pub plan: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub address: Option<String>,
}

/// 订户分页查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// 按姓名/电话模糊搜索
    pub search: Option<String>,
    pub city: Option<String>,
    pub unit: Option<String>,
    pub center_name: Option<String>,
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items: Vec<T>,
}

/// 下拉选项（去重后的作用域取值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lookups {
    pub units: Vec<String>,
    pub cities: Vec<String>,
    pub center_names: Vec<String>,
    pub landmarks: Vec<String>,
}
