// ==========================================
// 订阅配送管理系统 - 计价规则领域模型
// ==========================================
// unit/center/city 规则只在 date 当天生效
// default 规则自 date 起生效,直到被更晚的 default 规则取代
// ==========================================

use crate::domain::types::PriceScopeType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 未配置任何规则时的每日单价
pub const DEFAULT_DAILY_PRICE: f64 = 8.0;

// ==========================================
// PriceRule - 计价规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: String,

    /// 生效日（default 作用域为起始生效日）; 缺失时 default 规则视为最早
    #[serde(default)]
    pub date: Option<NaiveDate>,

    pub scope_type: PriceScopeType,

    /// 作用域取值（default 作用域忽略）
    #[serde(default)]
    pub scope_value: String,

    pub price: f64,

    /// 三态: Some(false) 停用; Some(true)/None 视为启用
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl PriceRule {
    pub fn is_effective(&self) -> bool {
        self.is_active != Some(false)
    }
}

/// 新建/修改计价规则的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRuleDraft {
    pub date: NaiveDate,
    pub scope_type: PriceScopeType,
    #[serde(default)]
    pub scope_value: String,
    pub price: f64,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// 单日计价明细
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub price: f64,
}
