// ==========================================
// 订阅配送管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod billing;
pub mod city_center;
pub mod coupon;
pub mod delivery;
pub mod inventory;
pub mod pricing;
pub mod subscriber;
pub mod types;

// 重导出核心类型
pub use billing::{PaymentCycle, PaymentCycleFilter, PaymentCyclePatch};
pub use city_center::{seed_city_centers, CityCenter};
pub use coupon::{Coupon, CouponDraft, CouponPatch};
pub use delivery::MissedDelivery;
pub use inventory::{
    AllocationFilter, ConsumptionRecord, InventoryAllocation, InventorySummary,
};
pub use pricing::{DailyPrice, PriceRule, PriceRuleDraft, DEFAULT_DAILY_PRICE};
pub use subscriber::{Lookups, Paginated, Subscriber, SubscriberPatch, SubscriberQuery};
pub use types::PriceScopeType;
