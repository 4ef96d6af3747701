// ==========================================
// 订阅配送管理系统 - 引擎层
// ==========================================
// 职责: 计价与库存核算规则,纯内存计算
// 红线: Engine 不拼 SQL, 不做 I/O
// ==========================================

pub mod calendar;
pub mod inventory_reconciler;
pub mod price_resolver;

// 重导出核心引擎
pub use inventory_reconciler::{
    compute_consumption_by_centers, compute_remaining_inventory, InventoryReconciler,
};
pub use price_resolver::{compute_cycle_total, resolve_daily_price, PriceResolver};
