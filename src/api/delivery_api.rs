// ==========================================
// 订阅配送管理系统 - 漏送登记 API
// ==========================================
// 职责: 标记/取消漏送日, 按月查询
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::delivery::MissedDelivery;
use crate::engine::calendar::month_bounds;
use crate::repository::missed_delivery_repo::MissedDeliveryRepository;
use crate::repository::subscriber_repo::SubscriberRepository;

pub struct DeliveryApi {
    missed_delivery_repo: Arc<MissedDeliveryRepository>,
    subscriber_repo: Arc<SubscriberRepository>,
}

impl DeliveryApi {
    pub fn new(
        missed_delivery_repo: Arc<MissedDeliveryRepository>,
        subscriber_repo: Arc<SubscriberRepository>,
    ) -> Self {
        Self {
            missed_delivery_repo,
            subscriber_repo,
        }
    }

    /// 登记漏送; 同一订户同日重复登记返回 BusinessRuleViolation
    pub fn mark_missed(
        &self,
        subscriber_id: &str,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> ApiResult<MissedDelivery> {
        self.ensure_subscriber(subscriber_id)?;

        if self
            .missed_delivery_repo
            .find_by_subscriber_and_date(subscriber_id, date)?
            .is_some()
        {
            return Err(ApiError::BusinessRuleViolation(format!(
                "订户 {} 在 {} 已登记漏送",
                subscriber_id, date
            )));
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        let record = self.missed_delivery_repo.insert(subscriber_id, date, reason)?;
        tracing::info!(subscriber_id, %date, "漏送已登记");
        Ok(record)
    }

    /// 取消某日漏送登记
    pub fn unmark_missed(&self, subscriber_id: &str, date: NaiveDate) -> ApiResult<()> {
        let record = self
            .missed_delivery_repo
            .find_by_subscriber_and_date(subscriber_id, date)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("订户 {} 在 {} 无漏送登记", subscriber_id, date))
            })?;
        self.missed_delivery_repo.delete(&record.id)?;
        tracing::info!(subscriber_id, %date, "漏送登记已取消");
        Ok(())
    }

    /// 订户某月（YYYY-MM）的漏送记录, 按日期升序
    pub fn list_for_month(&self, subscriber_id: &str, month: &str) -> ApiResult<Vec<MissedDelivery>> {
        let (first, last) = month_bounds(month).ok_or_else(|| {
            ApiError::InvalidInput(format!("月份格式错误, 期望 YYYY-MM: {}", month))
        })?;
        Ok(self
            .missed_delivery_repo
            .list_for_subscriber(subscriber_id, first, last)?)
    }

    fn ensure_subscriber(&self, subscriber_id: &str) -> ApiResult<()> {
        if subscriber_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("订户ID不能为空".to_string()));
        }
        if self.subscriber_repo.find_by_id(subscriber_id)?.is_none() {
            return Err(ApiError::NotFound(format!("订户(id={})不存在", subscriber_id)));
        }
        Ok(())
    }
}
