// ==========================================
// 订阅配送管理系统 - API 层
// ==========================================
// 职责: 输入校验、编排仓储与计算引擎
// ==========================================

pub mod billing_api;
pub mod city_center_api;
pub mod coupon_api;
pub mod dashboard_api;
pub mod delivery_api;
pub mod error;
pub mod inventory_api;
pub mod pricing_api;
pub mod subscriber_api;

// 重导出核心类型
pub use billing_api::{BillingApi, CycleQuote, NewPaymentCycle};
pub use city_center_api::CityCenterApi;
pub use coupon_api::CouponApi;
pub use dashboard_api::{DashboardApi, DashboardStats};
pub use delivery_api::DeliveryApi;
pub use error::{ApiError, ApiResult};
pub use inventory_api::{InventoryApi, InventoryOverview, OverviewFilters};
pub use pricing_api::PricingApi;
pub use subscriber_api::SubscriberApi;
