// ==========================================
// 订阅配送管理系统 - 优惠券 API
// ==========================================
// 职责: 优惠券维护与列表
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::coupon::{Coupon, CouponDraft, CouponPatch};
use crate::repository::coupon_repo::CouponRepository;

pub struct CouponApi {
    coupon_repo: Arc<CouponRepository>,
}

impl CouponApi {
    pub fn new(coupon_repo: Arc<CouponRepository>) -> Self {
        Self { coupon_repo }
    }

    /// 最新创建的在前; active_only 时排除已停用的券
    pub fn list(&self, active_only: bool) -> ApiResult<Vec<Coupon>> {
        let mut coupons = self.coupon_repo.list()?;
        if active_only {
            coupons.retain(Coupon::is_effective);
        }
        Ok(coupons)
    }

    pub fn create(&self, mut draft: CouponDraft) -> ApiResult<Coupon> {
        draft.name = validate_name(&draft.name)?;
        validate_amount(draft.amount)?;
        let coupon = self.coupon_repo.insert(&draft)?;
        tracing::info!(coupon_id = %coupon.id, name = %coupon.name, amount = coupon.amount, "优惠券已创建");
        Ok(coupon)
    }

    pub fn update(&self, id: &str, mut patch: CouponPatch) -> ApiResult<Coupon> {
        if id.trim().is_empty() {
            return Err(ApiError::InvalidInput("优惠券ID不能为空".to_string()));
        }
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(validate_name(name)?);
        }
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        let coupon = self.coupon_repo.apply_patch(id, &patch)?;
        tracing::info!(coupon_id = %coupon.id, "优惠券已更新");
        Ok(coupon)
    }

    pub fn delete(&self, id: &str) -> ApiResult<()> {
        self.coupon_repo.delete(id)?;
        tracing::info!(coupon_id = id, "优惠券已删除");
        Ok(())
    }
}

fn validate_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("优惠券名称不能为空".to_string()));
    }
    Ok(name.to_string())
}

fn validate_amount(amount: f64) -> ApiResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "优惠金额必须为非负数: {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> CouponApi {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        CouponApi::new(Arc::new(CouponRepository::from_connection(Arc::new(
            Mutex::new(conn),
        ))))
    }

    fn draft(name: &str, amount: f64) -> CouponDraft {
        CouponDraft {
            name: name.to_string(),
            amount,
            is_active: None,
        }
    }

    #[test]
    fn test_create_trims_and_validates() {
        let api = setup();
        let coupon = api.create(draft("  WELCOME50 ", 50.0)).unwrap();
        assert_eq!(coupon.name, "WELCOME50");

        assert!(matches!(api.create(draft("   ", 10.0)), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.create(draft("NEG", -1.0)), Err(ApiError::InvalidInput(_))));
        assert!(matches!(api.create(draft("NAN", f64::NAN)), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_active_only_hides_deactivated() {
        let api = setup();
        let kept = api.create(draft("KEEP", 10.0)).unwrap();
        let paused = api.create(draft("PAUSE", 5.0)).unwrap();
        api.update(
            &paused.id,
            CouponPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(api.list(false).unwrap().len(), 2);
        let active: Vec<_> = api.list(true).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(active, vec![kept.id]);
    }

    #[test]
    fn test_update_rejects_bad_patch_and_missing_coupon() {
        let api = setup();
        let coupon = api.create(draft("KEEP", 10.0)).unwrap();
        assert!(matches!(
            api.update(
                &coupon.id,
                CouponPatch {
                    amount: Some(-3.0),
                    ..Default::default()
                }
            ),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.update("missing", CouponPatch::default()),
            Err(ApiError::NotFound(_))
        ));
        api.delete(&coupon.id).unwrap();
        assert!(api.list(false).unwrap().is_empty());
    }
}
