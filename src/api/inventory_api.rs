// ==========================================
// 订阅配送管理系统 - 库存 API
// ==========================================
// 职责: 分配记录维护、CSV 导入、库存总览
// 总览窗口缺省为 当月首日..today
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::inventory::{
    AllocationFilter, ConsumptionRecord, InventoryAllocation, InventorySummary,
};
use crate::domain::subscriber::Lookups;
use crate::engine::calendar::first_of_month;
use crate::engine::inventory_reconciler::InventoryReconciler;
use crate::importer::allocation_importer::AllocationCsvParser;
use crate::repository::inventory_repo::InventoryAllocationRepository;
use crate::repository::missed_delivery_repo::MissedDeliveryRepository;
use crate::repository::subscriber_repo::SubscriberRepository;

// ==========================================
// DTO
// ==========================================

/// 总览实际使用的筛选条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewFilters {
    pub center: Option<String>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// 库存总览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryOverview {
    pub allocations: Vec<InventoryAllocation>,
    pub consumption: Vec<ConsumptionRecord>,
    pub summaries: Vec<InventorySummary>,
    pub lookups: Lookups,
    pub filters: OverviewFilters,
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================
pub struct InventoryApi {
    allocation_repo: Arc<InventoryAllocationRepository>,
    subscriber_repo: Arc<SubscriberRepository>,
    missed_delivery_repo: Arc<MissedDeliveryRepository>,
    config_manager: Arc<ConfigManager>,
    reconciler: InventoryReconciler,
}

impl InventoryApi {
    pub fn new(
        allocation_repo: Arc<InventoryAllocationRepository>,
        subscriber_repo: Arc<SubscriberRepository>,
        missed_delivery_repo: Arc<MissedDeliveryRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            allocation_repo,
            subscriber_repo,
            missed_delivery_repo,
            config_manager,
            reconciler: InventoryReconciler::new(),
        }
    }

    pub fn list_allocations(&self, filter: &AllocationFilter) -> ApiResult<Vec<InventoryAllocation>> {
        Ok(self.allocation_repo.list(filter)?)
    }

    /// 新增一条分配记录
    pub fn create_allocation(&self, alloc: InventoryAllocation) -> ApiResult<InventoryAllocation> {
        let center = alloc.center.trim().to_string();
        if center.is_empty() {
            return Err(ApiError::InvalidInput("配送中心不能为空".to_string()));
        }
        let max = self.config_manager.get_max_allocation_quantity()?;
        if !alloc.quantity.is_finite() || alloc.quantity <= 0.0 || alloc.quantity > max {
            return Err(ApiError::InvalidInput(format!(
                "分配数量必须在 (0, {}] 之间: {}",
                max, alloc.quantity
            )));
        }

        let stored = self.allocation_repo.insert(&InventoryAllocation {
            center,
            added_by: alloc.added_by.trim().to_string(),
            ..alloc
        })?;
        tracing::info!(
            center = %stored.center,
            date = %stored.date,
            quantity = stored.quantity,
            "库存分配已登记"
        );
        Ok(stored)
    }

    /// 从 CSV 批量导入分配记录（全部成功或全部不写入）
    pub fn import_allocations_csv(
        &self,
        path: &Path,
        added_by: &str,
    ) -> ApiResult<Vec<InventoryAllocation>> {
        let parser = AllocationCsvParser::new(
            self.config_manager.get_max_allocation_quantity()?,
            added_by,
        );
        let parsed = parser.parse_file(path)?;
        let stored = self.allocation_repo.insert_batch(&parsed)?;
        tracing::info!(file = %path.display(), rows = stored.len(), "库存分配导入完成");
        Ok(stored)
    }

    /// 库存总览
    ///
    /// - 窗口: from 缺省为 today 所在月首日, to 缺省为 today
    /// - 分配记录: 窗口内（按 center 过滤）
    /// - 消耗: 窗口内逐日推算; 给出 center 时仅该中心
    /// - 结余: 截至 to（含）, 以窗口内分配记录为准
    #[instrument(skip(self))]
    pub fn load_overview(
        &self,
        center: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ApiResult<InventoryOverview> {
        let center = center.map(str::trim).filter(|c| !c.is_empty());
        let from_date = from.unwrap_or_else(|| first_of_month(today));
        let to_date = to.unwrap_or(today);

        let allocations = self.allocation_repo.list(&AllocationFilter {
            center: center.map(str::to_string),
            from_date: Some(from_date),
            to_date: Some(to_date),
        })?;

        let lookups = self.subscriber_repo.lookups().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "下拉选项加载失败, 使用空列表");
            Lookups::default()
        });

        let subscribers = self.subscriber_repo.list_all()?;
        let missed = if to_date < from_date {
            Vec::new()
        } else {
            self.missed_delivery_repo.list_in_range(from_date, to_date)?
        };
        let allow_list = center.map(|c| vec![c.to_string()]);
        let consumption = self.reconciler.compute_consumption_by_centers(
            from_date,
            to_date,
            &subscribers,
            &missed,
            allow_list.as_deref(),
        );
        let summaries = self
            .reconciler
            .compute_remaining_inventory(to_date, &allocations, &consumption);

        tracing::debug!(
            allocations = allocations.len(),
            consumption = consumption.len(),
            summaries = summaries.len(),
            "库存总览已生成"
        );

        Ok(InventoryOverview {
            allocations,
            consumption,
            summaries,
            lookups,
            filters: OverviewFilters {
                center: center.map(str::to_string),
                from_date,
                to_date,
            },
        })
    }
}
