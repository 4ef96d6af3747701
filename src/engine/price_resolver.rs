// ==========================================
// 订阅配送管理系统 - 每日计价引擎
// ==========================================
// 职责: 按作用域优先级确定订户某日单价,并汇总缴费周期金额
// 输入: 订户快照 + 计价规则列表 (已加载至内存)
// 输出: 单日单价 / 周期合计
// ==========================================
// 红线: 优先级固定 unit > center > city > default
// 红线: 最多命中一条精确规则,不做叠加
// ==========================================

use crate::domain::pricing::{DailyPrice, PriceRule, DEFAULT_DAILY_PRICE};
use crate::domain::subscriber::Subscriber;
use crate::domain::types::PriceScopeType;
use crate::engine::calendar::each_day_inclusive;
use chrono::NaiveDate;
use tracing::instrument;


// ==========================================
// PriceResolver - 每日计价引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct PriceResolver {
    /// 基准单价（无 default 规则时使用）
    baseline_price: f64,
}

impl PriceResolver {
    pub fn new() -> Self {
        Self::with_baseline(DEFAULT_DAILY_PRICE)
    }

    pub fn with_baseline(baseline_price: f64) -> Self {
        Self { baseline_price }
    }

    pub fn baseline_price(&self) -> f64 {
        self.baseline_price
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 确定订户某日的单价
    ///
    /// 顺序（命中即返回）:
    /// 1) unit 规则: 当日 + scope_value 匹配 subscriber.unit
    /// 2) center 规则: 当日 + scope_value 匹配 subscriber.center_name
    /// 3) city 规则: 当日 + scope_value 匹配 subscriber.city
    /// 4) 生效中的最新 default 规则 (date ≤ 当日)
    /// 5) 基准单价
    ///
    /// 停用规则 (is_active=false) 一律不参与
    pub fn resolve_daily_price(
        &self,
        subscriber: &Subscriber,
        date: NaiveDate,
        rules: &[PriceRule],
    ) -> f64 {
        for scope in PriceScopeType::PRECEDENCE {
            if let Some(rule) = find_exact_rule(scope, scope_value_of(subscriber, scope), date, rules) {
                return rule.price;
            }
        }

        find_effective_default(date, rules)
            .map(|rule| rule.price)
            .unwrap_or(self.baseline_price)
    }

    /// 周期合计: [start, end] 每日单价之和; end < start 时为 0
    #[instrument(skip(self, subscriber, rules), fields(subscriber = %subscriber.id, rules = rules.len()))]
    pub fn compute_cycle_total(
        &self,
        subscriber: &Subscriber,
        start: NaiveDate,
        end: NaiveDate,
        rules: &[PriceRule],
    ) -> f64 {
        each_day_inclusive(start, end)
            .map(|day| self.resolve_daily_price(subscriber, day, rules))
            .sum()
    }

    /// 周期逐日明细
    pub fn daily_breakdown(
        &self,
        subscriber: &Subscriber,
        start: NaiveDate,
        end: NaiveDate,
        rules: &[PriceRule],
    ) -> Vec<DailyPrice> {
        each_day_inclusive(start, end)
            .map(|date| DailyPrice {
                date,
                price: self.resolve_daily_price(subscriber, date, rules),
            })
            .collect()
    }
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 函数式入口
// ==========================================

/// 单日单价; `default_price` 缺省为 [`DEFAULT_DAILY_PRICE`]
pub fn resolve_daily_price(
    subscriber: &Subscriber,
    date: NaiveDate,
    rules: &[PriceRule],
    default_price: Option<f64>,
) -> f64 {
    resolver_for(default_price).resolve_daily_price(subscriber, date, rules)
}

/// 周期合计; `default_price` 缺省为 [`DEFAULT_DAILY_PRICE`]
pub fn compute_cycle_total(
    subscriber: &Subscriber,
    start: NaiveDate,
    end: NaiveDate,
    rules: &[PriceRule],
    default_price: Option<f64>,
) -> f64 {
    resolver_for(default_price).compute_cycle_total(subscriber, start, end, rules)
}

fn resolver_for(default_price: Option<f64>) -> PriceResolver {
    PriceResolver::with_baseline(default_price.unwrap_or(DEFAULT_DAILY_PRICE))
}

// ==========================================
// 规则匹配
// ==========================================

/// 去首尾空白并转小写
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn scope_value_of(subscriber: &Subscriber, scope: PriceScopeType) -> Option<&str> {
    match scope {
        PriceScopeType::Unit => subscriber.unit.as_deref(),
        PriceScopeType::Center => subscriber.center_name.as_deref(),
        PriceScopeType::City => subscriber.city.as_deref(),
        PriceScopeType::Default => None,
    }
}

/// 精确作用域规则: 同作用域、同日、取值匹配、启用; 多条时取列表中第一条
///
/// 订户缺失该作用域字段时按空串比较, 只会命中取值为空白的规则
fn find_exact_rule<'a>(
    scope: PriceScopeType,
    subscriber_value: Option<&str>,
    date: NaiveDate,
    rules: &'a [PriceRule],
) -> Option<&'a PriceRule> {
    let target = normalize(subscriber_value.unwrap_or(""));

    rules.iter().find(|r| {
        r.scope_type == scope
            && r.date == Some(date)
            && r.is_effective()
            && normalize(&r.scope_value) == target
    })
}

/// 生效中的 default 规则: date ≤ 当日中最新的一条
///
/// 无日期的 default 规则视为最早生效; 同日多条时取列表中靠前者
fn find_effective_default(date: NaiveDate, rules: &[PriceRule]) -> Option<&PriceRule> {
    let mut best: Option<&PriceRule> = None;
    for rule in rules {
        if rule.scope_type != PriceScopeType::Default || !rule.is_effective() {
            continue;
        }
        if matches!(rule.date, Some(d) if d > date) {
            continue;
        }
        match best {
            Some(current) if rule.date <= current.date => {}
            _ => best = Some(rule),
        }
    }
    best
}
