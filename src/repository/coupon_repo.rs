// ==========================================
// 订阅配送管理系统 - 优惠券数据仓储
// ==========================================
// is_active 三态落库: NULL / 0 / 1
// ==========================================

use crate::domain::coupon::{Coupon, CouponDraft, CouponPatch};
use crate::repository::db_utils::new_id;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "id, name, amount, is_active, created_at, updated_at";

pub struct CouponRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CouponRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn timestamp_column(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Coupon> {
        Ok(Coupon {
            id: row.get(0)?,
            name: row.get(1)?,
            amount: row.get(2)?,
            is_active: row.get(3)?,
            created_at: Self::timestamp_column(4, row.get(4)?)?,
            updated_at: Self::timestamp_column(5, row.get(5)?)?,
        })
    }

    pub fn insert(&self, draft: &CouponDraft) -> RepositoryResult<Coupon> {
        let now = Utc::now();
        let coupon = Coupon {
            id: new_id(),
            name: draft.name.clone(),
            amount: draft.amount,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO coupon (id, name, amount, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                coupon.id,
                coupon.name,
                coupon.amount,
                coupon.is_active,
                now.to_rfc3339(),
            ],
        )?;
        Ok(coupon)
    }

    /// 局部更新; patch 中为 None 的字段保持不变
    pub fn apply_patch(&self, id: &str, patch: &CouponPatch) -> RepositoryResult<Coupon> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE coupon SET
                name       = COALESCE(?2, name),
                amount     = COALESCE(?3, amount),
                is_active  = COALESCE(?4, is_active),
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                id,
                patch.name,
                patch.amount,
                patch.is_active,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }

        let sql = format!("SELECT {} FROM coupon WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], Self::map_row)?)
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM coupon WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Coupon>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM coupon WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], Self::map_row).optional()?)
    }

    /// 最新创建的在前
    pub fn list(&self) -> RepositoryResult<Vec<Coupon>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM coupon ORDER BY created_at DESC, id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let coupons = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(coupons)
    }

    fn not_found(id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "Coupon".to_string(),
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn setup() -> CouponRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        CouponRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn draft(name: &str, amount: f64) -> CouponDraft {
        CouponDraft {
            name: name.to_string(),
            amount,
            is_active: None,
        }
    }

    #[test]
    fn test_insert_find_and_list_newest_first() {
        let repo = setup();
        let first = repo.insert(&draft("WELCOME50", 50.0)).unwrap();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "UPDATE coupon SET created_at = '2024-01-01T00:00:00+00:00' WHERE id = ?1",
                params![first.id],
            )
            .unwrap();
        }
        let second = repo.insert(&draft("DIWALI", 20.0)).unwrap();

        let found = repo.find_by_id(&first.id).unwrap().unwrap();
        assert_eq!(found.name, "WELCOME50");
        assert_eq!(found.is_active, None);
        assert!(found.is_effective());

        let ids: Vec<_> = repo.list().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let repo = setup();
        let coupon = repo.insert(&draft("WELCOME50", 50.0)).unwrap();

        let patched = repo
            .apply_patch(
                &coupon.id,
                &CouponPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(patched.name, "WELCOME50");
        assert_eq!(patched.amount, 50.0);
        assert!(!patched.is_effective());

        assert!(matches!(
            repo.apply_patch("missing", &CouponPatch::default()),
            Err(RepositoryError::NotFound { .. })
        ));
        repo.delete(&coupon.id).unwrap();
        assert!(matches!(repo.delete(&coupon.id), Err(RepositoryError::NotFound { .. })));
    }
}
