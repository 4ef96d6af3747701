// ==========================================
// 订阅配送管理系统 - 订户 API
// ==========================================
// 职责: 订户维护、分页查询、下拉选项
// 输入的文本字段去除首尾空白; 可选字段为空时存为 NULL
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::subscriber::{Lookups, Paginated, Subscriber, SubscriberPatch, SubscriberQuery};
use crate::repository::subscriber_repo::SubscriberRepository;

pub struct SubscriberApi {
    subscriber_repo: Arc<SubscriberRepository>,
}

impl SubscriberApi {
    pub fn new(subscriber_repo: Arc<SubscriberRepository>) -> Self {
        Self { subscriber_repo }
    }

    /// 分页查询; 页码从 1 开始, 每页条数在仓储层限幅
    pub fn list(&self, query: &SubscriberQuery) -> ApiResult<Paginated<Subscriber>> {
        if query.page == Some(0) {
            return Err(ApiError::InvalidInput("页码从 1 开始".to_string()));
        }
        Ok(self.subscriber_repo.query(query)?)
    }

    pub fn get(&self, id: &str) -> ApiResult<Subscriber> {
        if id.trim().is_empty() {
            return Err(ApiError::InvalidInput("订户ID不能为空".to_string()));
        }
        self.subscriber_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("订户(id={})不存在", id)))
    }

    /// 新增订户; id 为空时由仓储生成
    pub fn create(&self, subscriber: Subscriber) -> ApiResult<Subscriber> {
        let subscriber = normalize(subscriber)?;
        let stored = self.subscriber_repo.insert(&subscriber)?;
        tracing::info!(subscriber_id = %stored.id, name = %stored.name, "订户已创建");
        Ok(stored)
    }

    /// 局部更新: 先读出现有记录, 合并 patch 后整体写回
    pub fn update(&self, id: &str, patch: SubscriberPatch) -> ApiResult<Subscriber> {
        let mut subscriber = self.get(id)?;

        if let Some(name) = patch.name {
            subscriber.name = name;
        }
        for (slot, value) in [
            (&mut subscriber.phone, patch.phone),
            (&mut subscriber.email, patch.email),
            (&mut subscriber.unit, patch.unit),
            (&mut subscriber.city, patch.city),
            (&mut subscriber.center_name, patch.center_name),
            (&mut subscriber.plan, patch.plan),
            (&mut subscriber.pincode, patch.pincode),
            (&mut subscriber.landmark, patch.landmark),
            (&mut subscriber.address, patch.address),
        ] {
            if value.is_some() {
                *slot = value;
            }
        }

        let subscriber = normalize(subscriber)?;
        self.subscriber_repo.update(&subscriber)?;
        tracing::info!(subscriber_id = id, "订户已更新");
        Ok(subscriber)
    }

    /// 删除订户; 其漏送与缴费记录随外键级联删除
    pub fn delete(&self, id: &str) -> ApiResult<()> {
        self.subscriber_repo.delete(id)?;
        tracing::info!(subscriber_id = id, "订户已删除");
        Ok(())
    }

    pub fn lookups(&self) -> ApiResult<Lookups> {
        Ok(self.subscriber_repo.lookups()?)
    }
}

/// 文本清洗与必填校验
fn normalize(mut subscriber: Subscriber) -> ApiResult<Subscriber> {
    subscriber.id = subscriber.id.trim().to_string();
    subscriber.name = subscriber.name.trim().to_string();
    if subscriber.name.is_empty() {
        return Err(ApiError::InvalidInput("订户姓名不能为空".to_string()));
    }

    for field in [
        &mut subscriber.phone,
        &mut subscriber.email,
        &mut subscriber.unit,
        &mut subscriber.city,
        &mut subscriber.center_name,
        &mut subscriber.plan,
        &mut subscriber.pincode,
        &mut subscriber.landmark,
        &mut subscriber.address,
    ] {
        *field = field
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }

    if let Some(email) = subscriber.email.as_deref() {
        if !email.contains('@') {
            return Err(ApiError::InvalidInput(format!("邮箱格式错误: {}", email)));
        }
    }
    Ok(subscriber)
}
