// ==========================================
// 订阅配送管理系统 - 城市/配送中心 API
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::city_center::{seed_city_centers, CityCenter};
use crate::repository::city_center_repo::CityCenterRepository;

pub struct CityCenterApi {
    city_center_repo: Arc<CityCenterRepository>,
}

impl CityCenterApi {
    pub fn new(city_center_repo: Arc<CityCenterRepository>) -> Self {
        Self { city_center_repo }
    }

    /// 城市→配送中心映射, 按城市名排序
    pub fn list(&self) -> ApiResult<Vec<CityCenter>> {
        Ok(self.city_center_repo.list_all()?)
    }

    /// 以内置六城映射覆盖现有数据
    pub fn seed_defaults(&self) -> ApiResult<Vec<CityCenter>> {
        let stored = self.city_center_repo.replace_all(&seed_city_centers())?;
        tracing::info!(cities = stored.len(), "城市/配送中心映射已重置");
        Ok(stored)
    }
}
