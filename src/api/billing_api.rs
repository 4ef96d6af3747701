// ==========================================
// 订阅配送管理系统 - 缴费 API
// ==========================================
// 职责: 周期报价、缴费周期维护
// 周期金额 = 周期内逐日单价之和（不扣除漏送日）
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::pricing_api::PricingApi;
use crate::config::config_manager::ConfigManager;
use crate::domain::billing::{PaymentCycle, PaymentCycleFilter, PaymentCyclePatch};
use crate::domain::pricing::DailyPrice;
use crate::engine::calendar::days_inclusive;
use crate::repository::db_utils::new_id;
use crate::repository::payment_cycle_repo::PaymentCycleRepository;

// ==========================================
// DTO
// ==========================================

/// 周期报价
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleQuote {
    pub subscriber_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
    pub total: f64,
    pub daily: Vec<DailyPrice>,
}

/// 新建缴费周期的输入; amount 由报价得出
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPaymentCycle {
    pub subscriber: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_due: Option<bool>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

// ==========================================
// BillingApi - 缴费 API
// ==========================================
pub struct BillingApi {
    pricing_api: Arc<PricingApi>,
    payment_cycle_repo: Arc<PaymentCycleRepository>,
    config_manager: Arc<ConfigManager>,
}

impl BillingApi {
    pub fn new(
        pricing_api: Arc<PricingApi>,
        payment_cycle_repo: Arc<PaymentCycleRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            pricing_api,
            payment_cycle_repo,
            config_manager,
        }
    }

    /// 计算订户 [start, end] 的周期报价（含逐日明细）
    ///
    /// end < start 时报价为 0、明细为空
    pub fn quote_cycle(
        &self,
        subscriber_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<CycleQuote> {
        let subscriber = self.pricing_api.load_subscriber(subscriber_id)?;
        let rules = if end < start {
            Vec::new()
        } else {
            self.pricing_api.rules_for_window(start, end)?
        };
        let resolver = self.pricing_api.resolver()?;

        let daily = resolver.daily_breakdown(&subscriber, start, end, &rules);
        let total: f64 = daily.iter().map(|d| d.price).sum();

        tracing::debug!(
            subscriber_id,
            %start,
            %end,
            rules = rules.len(),
            total,
            "周期报价完成"
        );

        Ok(CycleQuote {
            subscriber_id: subscriber.id,
            start,
            end,
            days: days_inclusive(start, end),
            total,
            daily,
        })
    }

    /// 新建缴费周期, 金额取报价合计
    pub fn create_payment_cycle(&self, input: NewPaymentCycle) -> ApiResult<PaymentCycle> {
        let start = input
            .start_date
            .ok_or_else(|| ApiError::InvalidInput("开始日期不能为空".to_string()))?;
        let end = input
            .end_date
            .ok_or_else(|| ApiError::InvalidInput("结束日期不能为空".to_string()))?;
        if end < start {
            return Err(ApiError::InvalidInput(format!(
                "结束日期({})早于开始日期({})",
                end, start
            )));
        }

        let quote = self.quote_cycle(&input.subscriber, start, end)?;

        let product_code = match input.product_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => self.config_manager.get_default_product_code()?,
        };

        let now = Utc::now();
        let cycle = PaymentCycle {
            id: new_id(),
            subscriber: quote.subscriber_id,
            start_date: start,
            end_date: end,
            amount: quote.total,
            is_due: input.is_due.unwrap_or(true),
            is_flagged: false,
            last_payment: None,
            product_code,
            note: input.note.filter(|n| !n.trim().is_empty()),
            invoice_link: None,
            payment_link: None,
            created_at: now,
            updated_at: now,
        };
        self.payment_cycle_repo.insert(&cycle)?;

        tracing::info!(
            cycle_id = %cycle.id,
            subscriber_id = %cycle.subscriber,
            amount = cycle.amount,
            "缴费周期已创建"
        );
        Ok(cycle)
    }

    pub fn list_payment_cycles(&self, filter: &PaymentCycleFilter) -> ApiResult<Vec<PaymentCycle>> {
        Ok(self.payment_cycle_repo.list(filter)?)
    }

    /// 更新缴费状态/备注等
    pub fn update_payment_cycle(
        &self,
        id: &str,
        patch: &PaymentCyclePatch,
    ) -> ApiResult<PaymentCycle> {
        if id.trim().is_empty() {
            return Err(ApiError::InvalidInput("缴费周期ID不能为空".to_string()));
        }
        let cycle = self.payment_cycle_repo.apply_patch(id, patch)?;
        tracing::info!(cycle_id = id, is_due = cycle.is_due, "缴费周期已更新");
        Ok(cycle)
    }

    pub fn delete_payment_cycle(&self, id: &str) -> ApiResult<()> {
        self.payment_cycle_repo.delete(id)?;
        tracing::info!(cycle_id = id, "缴费周期已删除");
        Ok(())
    }
}
