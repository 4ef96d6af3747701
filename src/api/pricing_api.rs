// ==========================================
// 订阅配送管理系统 - 计价规则 API
// ==========================================
// 职责: 计价规则维护、单日单价查询
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::pricing::{PriceRule, PriceRuleDraft};
use crate::domain::subscriber::Subscriber;
use crate::domain::types::PriceScopeType;
use crate::engine::price_resolver::PriceResolver;
use crate::repository::price_rule_repo::PriceRuleRepository;
use crate::repository::subscriber_repo::SubscriberRepository;

// ==========================================
// PricingApi - 计价规则 API
// ==========================================
pub struct PricingApi {
    price_rule_repo: Arc<PriceRuleRepository>,
    subscriber_repo: Arc<SubscriberRepository>,
    config_manager: Arc<ConfigManager>,
}

impl PricingApi {
    pub fn new(
        price_rule_repo: Arc<PriceRuleRepository>,
        subscriber_repo: Arc<SubscriberRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            price_rule_repo,
            subscriber_repo,
            config_manager,
        }
    }

    /// 查询窗口内可能生效的规则（含窗口结束前的 default 规则）
    pub fn list_rules(&self, start: NaiveDate, end: NaiveDate) -> ApiResult<Vec<PriceRule>> {
        if end < start {
            return Err(ApiError::InvalidInput(format!(
                "结束日期({})早于开始日期({})",
                end, start
            )));
        }
        Ok(self.price_rule_repo.list_for_window(start, end)?)
    }

    pub fn create_rule(&self, draft: PriceRuleDraft) -> ApiResult<PriceRule> {
        let draft = validate_draft(draft)?;
        let rule = self.price_rule_repo.insert(&draft)?;
        tracing::info!(
            rule_id = %rule.id,
            scope = %rule.scope_type,
            scope_value = %rule.scope_value,
            price = rule.price,
            "计价规则已创建"
        );
        Ok(rule)
    }

    pub fn update_rule(&self, id: &str, draft: PriceRuleDraft) -> ApiResult<PriceRule> {
        if id.trim().is_empty() {
            return Err(ApiError::InvalidInput("规则ID不能为空".to_string()));
        }
        let draft = validate_draft(draft)?;
        let rule = self.price_rule_repo.update(id, &draft)?;
        tracing::info!(rule_id = %rule.id, price = rule.price, "计价规则已更新");
        Ok(rule)
    }

    /// 停用规则（保留记录, 不再参与计价）
    pub fn deactivate_rule(&self, id: &str) -> ApiResult<()> {
        self.price_rule_repo.set_active(id, false)?;
        tracing::info!(rule_id = id, "计价规则已停用");
        Ok(())
    }

    pub fn delete_rule(&self, id: &str) -> ApiResult<()> {
        self.price_rule_repo.delete(id)?;
        tracing::info!(rule_id = id, "计价规则已删除");
        Ok(())
    }

    /// 查询订户某日的单价
    pub fn resolve_price(&self, subscriber_id: &str, date: NaiveDate) -> ApiResult<f64> {
        let subscriber = self.load_subscriber(subscriber_id)?;
        let rules = self.price_rule_repo.list_for_window(date, date)?;
        Ok(self.resolver()?.resolve_daily_price(&subscriber, date, &rules))
    }

    /// 基于当前配置的基准单价构建解析器
    pub(crate) fn resolver(&self) -> ApiResult<PriceResolver> {
        Ok(PriceResolver::with_baseline(
            self.config_manager.get_default_daily_price()?,
        ))
    }

    pub(crate) fn load_subscriber(&self, subscriber_id: &str) -> ApiResult<Subscriber> {
        if subscriber_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("订户ID不能为空".to_string()));
        }
        self.subscriber_repo
            .find_by_id(subscriber_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订户(id={})不存在", subscriber_id)))
    }

    pub(crate) fn rules_for_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Vec<PriceRule>> {
        Ok(self.price_rule_repo.list_for_window(start, end)?)
    }
}

/// 规则输入校验
///
/// - price 为有限非负数
/// - 非 default 作用域必须给出 scope_value; default 作用域的 scope_value 清空
fn validate_draft(mut draft: PriceRuleDraft) -> ApiResult<PriceRuleDraft> {
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "单价必须为非负数: {}",
            draft.price
        )));
    }

    draft.scope_value = draft.scope_value.trim().to_string();
    match draft.scope_type {
        PriceScopeType::Default => draft.scope_value.clear(),
        scope if draft.scope_value.is_empty() => {
            return Err(ApiError::InvalidInput(format!(
                "作用域 {} 的取值不能为空",
                scope
            )));
        }
        _ => {}
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use crate::db::{configure_sqlite_connection, init_schema};
    use rusqlite::Connection;
    use std::sync::Mutex;

    struct Fixture {
        api: PricingApi,
        subscribers: Arc<SubscriberRepository>,
        config: Arc<ConfigManager>,
    }

    fn setup() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let subscribers = Arc::new(SubscriberRepository::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn.clone()));
        let api = PricingApi::new(
            Arc::new(PriceRuleRepository::from_connection(conn)),
            subscribers.clone(),
            config.clone(),
        );
        Fixture {
            api,
            subscribers,
            config,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn draft(scope_type: PriceScopeType, value: &str, date: NaiveDate, price: f64) -> PriceRuleDraft {
        PriceRuleDraft {
            date,
            scope_type,
            scope_value: value.to_string(),
            price,
            is_active: None,
        }
    }

    fn agra_subscriber(fx: &Fixture) -> Subscriber {
        fx.subscribers
            .insert(&Subscriber {
                id: "sub-agra".to_string(),
                name: "Asha".to_string(),
                unit: Some("U1".to_string()),
                city: Some("Agra".to_string()),
                center_name: Some("Tajganj".to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let fx = setup();
        assert!(matches!(
            fx.api.create_rule(draft(PriceScopeType::City, "Agra", d(2024, 3, 1), -1.0)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            fx.api.create_rule(draft(PriceScopeType::City, "Agra", d(2024, 3, 1), f64::NAN)),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            fx.api.create_rule(draft(PriceScopeType::Unit, "  ", d(2024, 3, 1), 9.0)),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default_rule_scope_value_is_cleared() {
        let fx = setup();
        let rule = fx
            .api
            .create_rule(draft(PriceScopeType::Default, "ignored", d(2024, 1, 1), 9.0))
            .unwrap();
        assert_eq!(rule.scope_value, "");
    }

    #[test]
    fn test_resolve_price_city_rule_and_fallback() {
        let fx = setup();
        let sub = agra_subscriber(&fx);
        fx.api
            .create_rule(draft(PriceScopeType::City, "agra", d(2024, 3, 1), 10.0))
            .unwrap();

        assert_eq!(fx.api.resolve_price(&sub.id, d(2024, 3, 1)).unwrap(), 10.0);
        assert_eq!(fx.api.resolve_price(&sub.id, d(2024, 3, 2)).unwrap(), 8.0);
    }

    #[test]
    fn test_resolve_price_uses_configured_baseline() {
        let fx = setup();
        let sub = agra_subscriber(&fx);
        fx.config
            .set_global_config_value(config_keys::DEFAULT_DAILY_PRICE, "7.5")
            .unwrap();
        assert_eq!(fx.api.resolve_price(&sub.id, d(2024, 3, 2)).unwrap(), 7.5);
    }

    #[test]
    fn test_deactivated_rule_no_longer_applies() {
        let fx = setup();
        let sub = agra_subscriber(&fx);
        let rule = fx
            .api
            .create_rule(draft(PriceScopeType::Unit, "U1", d(2024, 3, 1), 12.0))
            .unwrap();
        assert_eq!(fx.api.resolve_price(&sub.id, d(2024, 3, 1)).unwrap(), 12.0);

        fx.api.deactivate_rule(&rule.id).unwrap();
        assert_eq!(fx.api.resolve_price(&sub.id, d(2024, 3, 1)).unwrap(), 8.0);
    }

    #[test]
    fn test_unknown_subscriber() {
        let fx = setup();
        assert!(matches!(
            fx.api.resolve_price("missing", d(2024, 3, 1)),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_rules_rejects_reversed_window() {
        let fx = setup();
        assert!(matches!(
            fx.api.list_rules(d(2024, 3, 2), d(2024, 3, 1)),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
