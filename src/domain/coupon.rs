// ==========================================
// 订阅配送管理系统 - 优惠券领域模型
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Coupon - 优惠券
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub name: String,
    /// 抵扣金额
    pub amount: f64,
    /// 三态: Some(false) 停用; Some(true)/None 视为启用
    #[serde(default)]
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_effective(&self) -> bool {
        self.is_active != Some(false)
    }
}

/// 新建优惠券的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponDraft {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// 优惠券局部更新（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub is_active: Option<bool>,
}
