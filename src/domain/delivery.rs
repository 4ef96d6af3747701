// ==========================================
// 订阅配送管理系统 - 漏送记录领域模型
// ==========================================
// 例外制记录: 只存漏送日,无记录即视为已送达
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedDelivery {
    pub id: String,
    /// 订户ID
    pub subscriber: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}
