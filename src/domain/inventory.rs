// ==========================================
// 订阅配送管理系统 - 库存领域模型
// ==========================================
// 分配记录为实存; 消耗与结余为推算值,不落库
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryAllocation - 库存分配
// ==========================================
// 某日向配送中心库存池追加的数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAllocation {
    #[serde(default)]
    pub id: Option<String>,
    /// 对应 Subscriber.center_name
    pub center: String,
    pub date: NaiveDate,
    /// 分配数量（如: 升）
    pub quantity: f64,
    /// 操作人
    #[serde(default)]
    pub added_by: String,
}

/// 分配记录查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationFilter {
    pub center: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

// ==========================================
// 推算实体
// ==========================================

/// 单个中心单日的推算消耗
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub center: String,
    pub date: NaiveDate,
    pub consumed: u32,
}

/// 中心截至某日的库存结余
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub center: String,
    pub total_allocated: f64,
    pub total_consumed: f64,
    /// 不为负: 不建模欠货
    pub remaining: f64,
}
