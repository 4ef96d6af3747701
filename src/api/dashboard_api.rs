// ==========================================
// 订阅配送管理系统 - 首页看板 API
// ==========================================
// 职责: 聚合订户与缴费周期, 输出首页统计
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::engine::calendar::{first_of_month, month_bounds};
use crate::repository::payment_cycle_repo::PaymentCycleRepository;
use crate::repository::subscriber_repo::SubscriberRepository;

/// 首页统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_subscribers: u64,
    /// 所有待缴周期的金额合计
    pub total_due_amount: f64,
    /// 本月内缴清的周期金额合计（按缴费日归月）
    pub revenue_this_month: f64,
    /// 本月新增订户数（按创建日归月）
    pub new_subscribers_this_month: u64,
}

// ==========================================
// DashboardApi - 首页看板 API
// ==========================================

/// 首页看板 API
///
/// 职责：
/// 1. 订户总数与本月新增
/// 2. 待缴总额与本月已收
pub struct DashboardApi {
    subscriber_repo: Arc<SubscriberRepository>,
    payment_cycle_repo: Arc<PaymentCycleRepository>,
}

impl DashboardApi {
    pub fn new(
        subscriber_repo: Arc<SubscriberRepository>,
        payment_cycle_repo: Arc<PaymentCycleRepository>,
    ) -> Self {
        Self {
            subscriber_repo,
            payment_cycle_repo,
        }
    }

    /// 以 today 所在自然月为"本月"计算统计
    #[tracing::instrument(skip(self))]
    pub fn get_stats(&self, today: NaiveDate) -> ApiResult<DashboardStats> {
        let (first, last) = month_bounds(&today.format("%Y-%m").to_string())
            .unwrap_or((first_of_month(today), today));

        let stats = DashboardStats {
            total_subscribers: self.subscriber_repo.count_all()?,
            total_due_amount: self.payment_cycle_repo.sum_due_amount()?,
            revenue_this_month: self.payment_cycle_repo.sum_paid_between(first, last)?,
            new_subscribers_this_month: self
                .subscriber_repo
                .count_created_between(first, last)?,
        };
        tracing::debug!(?stats, "看板统计完成");
        Ok(stats)
    }
}
