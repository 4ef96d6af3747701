// ==========================================
// 订阅配送管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod city_center_repo;
pub mod coupon_repo;
pub mod db_utils;
pub mod error;
pub mod inventory_repo;
pub mod missed_delivery_repo;
pub mod payment_cycle_repo;
pub mod price_rule_repo;
pub mod subscriber_repo;

// 重导出核心仓储
pub use city_center_repo::CityCenterRepository;
pub use coupon_repo::CouponRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryAllocationRepository;
pub use missed_delivery_repo::MissedDeliveryRepository;
pub use payment_cycle_repo::PaymentCycleRepository;
pub use price_rule_repo::PriceRuleRepository;
pub use subscriber_repo::SubscriberRepository;
