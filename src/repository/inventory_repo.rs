// ==========================================
// 订阅配送管理系统 - 库存分配数据仓储
// ==========================================

use crate::domain::inventory::{AllocationFilter, InventoryAllocation};
use crate::engine::calendar::format_day;
use crate::repository::db_utils::{day_column, new_id, now_rfc3339, WhereBuilder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct InventoryAllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryAllocationRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<InventoryAllocation> {
        Ok(InventoryAllocation {
            id: Some(row.get(0)?),
            center: row.get(1)?,
            date: day_column(2, row.get(2)?)?,
            quantity: row.get(3)?,
            added_by: row.get(4)?,
        })
    }

    fn insert_with(conn: &Connection, alloc: &InventoryAllocation) -> rusqlite::Result<InventoryAllocation> {
        let mut stored = alloc.clone();
        let id = stored.id.take().filter(|id| !id.is_empty()).unwrap_or_else(new_id);
        conn.execute(
            r#"
            INSERT INTO inventory_allocation (id, center, alloc_date, quantity, added_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id,
                stored.center,
                format_day(stored.date),
                stored.quantity,
                stored.added_by,
                now_rfc3339(),
            ],
        )?;
        stored.id = Some(id);
        Ok(stored)
    }

    pub fn insert(&self, alloc: &InventoryAllocation) -> RepositoryResult<InventoryAllocation> {
        let conn = self.get_conn()?;
        Ok(Self::insert_with(&conn, alloc)?)
    }

    /// 批量写入（单事务,任一失败整体回滚）
    pub fn insert_batch(&self, allocs: &[InventoryAllocation]) -> RepositoryResult<Vec<InventoryAllocation>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut stored = Vec::with_capacity(allocs.len());
        for alloc in allocs {
            stored.push(Self::insert_with(&tx, alloc)?);
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(stored)
    }

    /// 按中心/日期区间查询,按日期、中心升序
    pub fn list(&self, filter: &AllocationFilter) -> RepositoryResult<Vec<InventoryAllocation>> {
        let mut w = WhereBuilder::new();
        if let Some(center) = filter.center.as_deref().filter(|c| !c.is_empty()) {
            w.push_eq("center", center.to_string());
        }
        w.push_day_range("alloc_date", filter.from_date, filter.to_date);

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT id, center, alloc_date, quantity, added_by FROM inventory_allocation{} ORDER BY alloc_date, center, created_at",
            w.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let allocs = stmt
            .query_map(w.params().as_slice(), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(allocs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> InventoryAllocationRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        InventoryAllocationRepository::from_connection(Arc::new(Mutex::new(conn)))
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

    #[test]
    fn test_batch_insert_and_filter() {
        let repo = setup();
        let stored = repo
            .insert_batch(&[
                alloc("Naini", d(2024, 3, 1), 100.0),
                alloc("Cantt", d(2024, 3, 2), 40.0),
                alloc("Naini", d(2024, 4, 1), 60.0),
            ])
            .unwrap();
        assert!(stored.iter().all(|a| a.id.is_some()));

        let naini_march = repo
            .list(&AllocationFilter {
                center: Some("Naini".to_string()),
                from_date: Some(d(2024, 3, 1)),
                to_date: Some(d(2024, 3, 31)),
            })
            .unwrap();
        assert_eq!(naini_march.len(), 1);
        assert_eq!(naini_march[0].quantity, 100.0);

        assert_eq!(repo.list(&AllocationFilter::default()).unwrap().len(), 3);
    }

    #[test]
    fn test_batch_rolls_back_on_duplicate_id() {
        let repo = setup();
        let mut a = alloc("Naini", d(2024, 3, 1), 10.0);
        a.id = Some("fixed".to_string());
        let res = repo.insert_batch(&[a.clone(), a]);
        assert!(matches!(res, Err(RepositoryError::UniqueConstraintViolation(_))));
        assert!(repo.list(&AllocationFilter::default()).unwrap().is_empty());
    }
}
