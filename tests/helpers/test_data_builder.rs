// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use subscription_ops::domain::inventory::InventoryAllocation;
use subscription_ops::domain::pricing::PriceRuleDraft;
use subscription_ops::domain::subscriber::Subscriber;
use subscription_ops::domain::types::PriceScopeType;

// ==========================================
// Subscriber 构建器
// ==========================================

pub struct SubscriberBuilder {
    subscriber: Subscriber,
}

impl SubscriberBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            subscriber: Subscriber {
                id: id.to_string(),
                name: format!("订户-{}", id),
                ..Default::default()
            },
        }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.subscriber.unit = Some(unit.to_string());
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.subscriber.city = Some(city.to_string());
        self
    }

    pub fn center(mut self, center: &str) -> Self {
        self.subscriber.center_name = Some(center.to_string());
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.subscriber.phone = Some(phone.to_string());
        self
    }

    pub fn build(self) -> Subscriber {
        self.subscriber
    }
}

/// 同一中心下批量生成订户: {prefix}1..{prefix}n
pub fn subscribers_at(center: &str, prefix: &str, n: usize) -> Vec<Subscriber> {
    (1..=n)
        .map(|i| {
            SubscriberBuilder::new(&format!("{}{}", prefix, i))
                .center(center)
                .build()
        })
        .collect()
}

// ==========================================
// PriceRuleDraft 构建器
// ==========================================

pub struct PriceRuleBuilder {
    draft: PriceRuleDraft,
}

impl PriceRuleBuilder {
    pub fn new(scope_type: PriceScopeType, date: NaiveDate, price: f64) -> Self {
        Self {
            draft: PriceRuleDraft {
                date,
                scope_type,
                scope_value: String::new(),
                price,
                is_active: None,
            },
        }
    }

    pub fn value(mut self, scope_value: &str) -> Self {
        self.draft.scope_value = scope_value.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.draft.is_active = Some(false);
        self
    }

    pub fn build(self) -> PriceRuleDraft {
        self.draft
    }
}

// ==========================================
// InventoryAllocation
// ==========================================

pub fn allocation(center: &str, date: NaiveDate, quantity: f64) -> InventoryAllocation {
    InventoryAllocation {
        id: None,
        center: center.to_string(),
        date,
        quantity,
        added_by: "tester".to_string(),
    }
}
