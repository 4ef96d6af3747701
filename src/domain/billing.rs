// ==========================================
// 订阅配送管理系统 - 缴费周期领域模型
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PaymentCycle - 缴费周期
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCycle {
    pub id: String,
    pub subscriber: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: f64,
    pub is_due: bool,
    pub is_flagged: bool,
    pub last_payment: Option<NaiveDate>,
    pub product_code: String,
    pub note: Option<String>,
    pub invoice_link: Option<String>,
    pub payment_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 缴费周期局部更新（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCyclePatch {
    pub is_due: Option<bool>,
    pub is_flagged: Option<bool>,
    pub last_payment: Option<NaiveDate>,
    pub note: Option<String>,
    pub invoice_link: Option<String>,
    pub payment_link: Option<String>,
}

/// 缴费周期查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentCycleFilter {
    pub is_due: Option<bool>,
    /// 格式 YYYY-MM; 与周期有交集即命中
    pub month: Option<String>,
    pub subscriber: Option<String>,
}
