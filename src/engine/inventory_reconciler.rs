// ==========================================
// 订阅配送管理系统 - 库存核算引擎
// ==========================================
// 职责: 推算各配送中心每日消耗,并核算截至某日的库存结余
// 输入: 订户快照 + 漏送记录 + 库存分配 (已加载至内存)
// 输出: ConsumptionRecord 网格 / InventorySummary 列表
// ==========================================
// 消耗是推算值: 每个在册订户每日消耗 1 份,记录漏送的除外
// 红线: 消耗与结余均不为负
// ==========================================

use crate::domain::delivery::MissedDelivery;
use crate::domain::inventory::{ConsumptionRecord, InventoryAllocation, InventorySummary};
use crate::domain::subscriber::Subscriber;
use crate::engine::calendar::each_day_inclusive;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// InventoryReconciler - 库存核算引擎
// ==========================================
pub struct InventoryReconciler {
    // 无状态引擎,不需要注入依赖
}

impl InventoryReconciler {
    pub fn new() -> Self {
        Self {}
    }

    /// 推算 [from, to] 内各中心的每日消耗
    ///
    /// 步骤:
    /// 1) 按 center_name 统计订户数（无中心的订户剔除; 给定 centers 时只保留名单内中心）
    /// 2) 通过 订户→中心 映射,按 (中心, 日期) 统计漏送; 无法归属的记录丢弃
    /// 3) 逐日 × 逐中心输出 consumed = max(0, 订户数 − 漏送数)
    ///
    /// 输出为稠密网格: 日期升序,同日内中心名升序
    #[instrument(
        skip(self, subscribers, missed_deliveries, centers),
        fields(subscribers = subscribers.len(), missed = missed_deliveries.len())
    )]
    pub fn compute_consumption_by_centers(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
        subscribers: &[Subscriber],
        missed_deliveries: &[MissedDelivery],
        centers: Option<&[String]>,
    ) -> Vec<ConsumptionRecord> {
        let allowed = |center: &str| centers.map_or(true, |list| list.iter().any(|c| c == center));

        // 1) 订户数 + 订户→中心 映射
        let mut active_by_center: BTreeMap<&str, u32> = BTreeMap::new();
        let mut center_of: HashMap<&str, &str> = HashMap::new();
        for sub in subscribers {
            let Some(center) = sub.assigned_center() else {
                continue;
            };
            if !allowed(center) {
                continue;
            }
            *active_by_center.entry(center).or_insert(0) += 1;
            center_of.insert(sub.id.as_str(), center);
        }

        // 2) 漏送按 (中心, 日期) 计数
        // 同一订户同日的重复记录只计一次, 与 missed_delivery 表的
        // UNIQUE(subscriber_id, delivery_date) 保持一致, 消耗不会因重复登记被多扣
        let mut seen: HashSet<(&str, NaiveDate)> = HashSet::new();
        let mut missed_by_center_day: HashMap<(&str, NaiveDate), u32> = HashMap::new();
        for missed in missed_deliveries {
            let Some(&center) = center_of.get(missed.subscriber.as_str()) else {
                continue;
            };
            if !seen.insert((missed.subscriber.as_str(), missed.date)) {
                continue;
            }
            *missed_by_center_day.entry((center, missed.date)).or_insert(0) += 1;
        }

        debug!(
            centers = active_by_center.len(),
            missed_cells = missed_by_center_day.len(),
            "消耗推算输入已分组"
        );

        // 3) 稠密网格
        let mut records = Vec::new();
        for day in each_day_inclusive(from_date, to_date) {
            for (&center, &active) in &active_by_center {
                let missed = missed_by_center_day
                    .get(&(center, day))
                    .copied()
                    .unwrap_or(0);
                records.push(ConsumptionRecord {
                    center: center.to_string(),
                    date: day,
                    consumed: active.saturating_sub(missed),
                });
            }
        }
        records
    }

    /// 核算截至 as_of_date（含）各中心的库存结余
    ///
    /// remaining = max(0, 累计分配 − 累计消耗); 只出现在一侧的中心,另一侧记 0
    /// 输出按中心名升序
    #[instrument(
        skip(self, allocations, consumption),
        fields(allocations = allocations.len(), consumption = consumption.len())
    )]
    pub fn compute_remaining_inventory(
        &self,
        as_of_date: NaiveDate,
        allocations: &[InventoryAllocation],
        consumption: &[ConsumptionRecord],
    ) -> Vec<InventorySummary> {
        let mut allocated_by_center: HashMap<&str, f64> = HashMap::new();
        let mut consumed_by_center: HashMap<&str, f64> = HashMap::new();

        for alloc in allocations.iter().filter(|a| a.date <= as_of_date) {
            *allocated_by_center.entry(alloc.center.as_str()).or_insert(0.0) += alloc.quantity;
        }
        for rec in consumption.iter().filter(|c| c.date <= as_of_date) {
            *consumed_by_center.entry(rec.center.as_str()).or_insert(0.0) += f64::from(rec.consumed);
        }

        let centers: BTreeSet<&str> = allocated_by_center
            .keys()
            .chain(consumed_by_center.keys())
            .copied()
            .collect();

        centers
            .into_iter()
            .map(|center| {
                let total_allocated = allocated_by_center.get(center).copied().unwrap_or(0.0);
                let total_consumed = consumed_by_center.get(center).copied().unwrap_or(0.0);
                InventorySummary {
                    center: center.to_string(),
                    total_allocated,
                    total_consumed,
                    remaining: (total_allocated - total_consumed).max(0.0),
                }
            })
            .collect()
    }
}

impl Default for InventoryReconciler {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 函数式入口
// ==========================================

pub fn compute_consumption_by_centers(
    from_date: NaiveDate,
    to_date: NaiveDate,
    subscribers: &[Subscriber],
    missed_deliveries: &[MissedDelivery],
    centers: Option<&[String]>,
) -> Vec<ConsumptionRecord> {
    InventoryReconciler::new().compute_consumption_by_centers(
        from_date,
        to_date,
        subscribers,
        missed_deliveries,
        centers,
    )
}

pub fn compute_remaining_inventory(
    as_of_date: NaiveDate,
    allocations: &[InventoryAllocation],
    consumption: &[ConsumptionRecord],
) -> Vec<InventorySummary> {
    InventoryReconciler::new().compute_remaining_inventory(as_of_date, allocations, consumption)
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sub(id: &str, center: Option<&str>) -> Subscriber {
        Subscriber {
            id: id.to_string(),
            name: id.to_string(),
            center_name: center.map(|c| c.to_string()),
            ..Default::default()
        }
    }

    fn missed(subscriber: &str, date: NaiveDate) -> MissedDelivery {
        MissedDelivery {
            id: format!("{}_{}", subscriber, date),
            subscriber: subscriber.to_string(),
            date,
            reason: None,
        }
    }

    fn alloc(center: &str, date: NaiveDate, quantity: f64) -> InventoryAllocation {
        InventoryAllocation {
            id: None,
            center: center.to_string(),
            date,
            quantity,
            added_by: "admin".to_string(),
        }
    }

    fn consumed(center: &str, date: NaiveDate, consumed: u32) -> ConsumptionRecord {
        ConsumptionRecord {
            center: center.to_string(),
            date,
            consumed,
        }
    }

    fn naini_five() -> Vec<Subscriber> {
        (1..=5).map(|i| sub(&format!("n{}", i), Some("Naini"))).collect()
    }

    // ==========================================
    // 消耗推算
    // ==========================================

    #[test]
    fn test_five_subscribers_two_missed_consumes_three() {
        let day = d(2024, 3, 1);
        let misses = vec![missed("n1", day), missed("n2", day)];
        let records = compute_consumption_by_centers(day, day, &naini_five(), &misses, None);

        assert_eq!(records, vec![consumed("Naini", day, 3)]);
    }

    #[test]
    fn test_dense_grid_over_days_and_centers() {
        let mut subs = naini_five();
        subs.push(sub("c1", Some("Cantt")));
        subs.push(sub("x1", None));
        subs.push(sub("x2", Some("")));

        let records =
            compute_consumption_by_centers(d(2024, 3, 1), d(2024, 3, 3), &subs, &[], None);

        assert_eq!(records.len(), 6);
        assert_eq!(records[0], consumed("Cantt", d(2024, 3, 1), 1));
        assert_eq!(records[1], consumed("Naini", d(2024, 3, 1), 5));
        assert_eq!(records[5], consumed("Naini", d(2024, 3, 3), 5));
    }

    #[test]
    fn test_whitespace_center_is_its_own_group() {
        let mut subs = naini_five();
        subs.push(sub("w1", Some("   ")));
        subs.push(sub("w2", Some("   ")));
        let day = d(2024, 3, 1);
        let misses = vec![missed("w1", day)];

        let records = compute_consumption_by_centers(day, day, &subs, &misses, None);
        assert_eq!(
            records,
            vec![consumed("   ", day, 1), consumed("Naini", day, 5)]
        );
    }

    #[test]
    fn test_center_allow_list() {
        let mut subs = naini_five();
        subs.push(sub("c1", Some("Cantt")));
        let day = d(2024, 3, 1);
        let misses = vec![missed("c1", day)];
        let only = vec!["Cantt".to_string()];

        let records = compute_consumption_by_centers(day, day, &subs, &misses, Some(&only));
        assert_eq!(records, vec![consumed("Cantt", day, 0)]);
    }

    #[test]
    fn test_unresolved_and_duplicate_misses_are_ignored() {
        let day = d(2024, 3, 1);
        let misses = vec![
            missed("ghost", day),
            missed("n1", day),
            missed("n1", day),
            missed("n2", d(2024, 3, 2)),
        ];
        let records = compute_consumption_by_centers(day, day, &naini_five(), &misses, None);
        assert_eq!(records, vec![consumed("Naini", day, 4)]);
    }

    #[test]
    fn test_consumption_empty_when_range_reversed_or_no_centers() {
        let day = d(2024, 3, 1);
        assert!(compute_consumption_by_centers(day, d(2024, 2, 1), &naini_five(), &[], None)
            .is_empty());
        let no_center = vec![sub("x1", None)];
        assert!(compute_consumption_by_centers(day, day, &no_center, &[], None).is_empty());
    }

    // ==========================================
    // 库存结余
    // ==========================================

    #[test]
    fn test_remaining_after_allocation_and_consumption() {
        let allocations = vec![alloc("Naini", d(2024, 3, 1), 100.0)];
        let consumption: Vec<_> = (1..=5).map(|day| consumed("Naini", d(2024, 3, day), 8)).collect();

        let summaries = compute_remaining_inventory(d(2024, 3, 5), &allocations, &consumption);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_allocated, 100.0);
        assert_eq!(summaries[0].total_consumed, 40.0);
        assert_eq!(summaries[0].remaining, 60.0);
    }

    #[test]
    fn test_remaining_never_negative() {
        let allocations = vec![alloc("Naini", d(2024, 3, 1), 10.0)];
        let consumption = vec![consumed("Naini", d(2024, 3, 1), 25)];
        let summaries = compute_remaining_inventory(d(2024, 3, 1), &allocations, &consumption);
        assert_eq!(summaries[0].total_consumed, 25.0);
        assert_eq!(summaries[0].remaining, 0.0);
    }

    #[test]
    fn test_records_after_as_of_date_are_excluded() {
        let allocations = vec![
            alloc("Naini", d(2024, 3, 1), 50.0),
            alloc("Naini", d(2024, 3, 9), 500.0),
        ];
        let consumption = vec![consumed("Naini", d(2024, 3, 2), 5), consumed("Naini", d(2024, 3, 9), 5)];
        let summaries = compute_remaining_inventory(d(2024, 3, 5), &allocations, &consumption);
        assert_eq!(summaries[0].total_allocated, 50.0);
        assert_eq!(summaries[0].total_consumed, 5.0);
        assert_eq!(summaries[0].remaining, 45.0);
    }

    #[test]
    fn test_one_sided_centers_get_zero_on_missing_side() {
        let allocations = vec![alloc("Cantt", d(2024, 3, 1), 30.0)];
        let consumption = vec![consumed("Naini", d(2024, 3, 1), 4)];
        let summaries = compute_remaining_inventory(d(2024, 3, 1), &allocations, &consumption);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].center, "Cantt");
        assert_eq!(summaries[0].total_consumed, 0.0);
        assert_eq!(summaries[0].remaining, 30.0);
        assert_eq!(summaries[1].center, "Naini");
        assert_eq!(summaries[1].total_allocated, 0.0);
        assert_eq!(summaries[1].remaining, 0.0);
    }
}
