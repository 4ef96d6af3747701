// ==========================================
// 订阅配送管理系统 - 漏送记录数据仓储
// ==========================================
// 例外制: 只存漏送日; 同一订户同日唯一
// ==========================================

use crate::domain::delivery::MissedDelivery;
use crate::engine::calendar::format_day;
use crate::repository::db_utils::{day_column, new_id, now_rfc3339};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct MissedDeliveryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MissedDeliveryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<MissedDelivery> {
        Ok(MissedDelivery {
            id: row.get(0)?,
            subscriber: row.get(1)?,
            date: day_column(2, row.get(2)?)?,
            reason: row.get(3)?,
        })
    }

    /// 登记漏送
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 同一订户同日已登记
    /// - Err(ForeignKeyViolation): 订户不存在
    pub fn insert(
        &self,
        subscriber_id: &str,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> RepositoryResult<MissedDelivery> {
        let record = MissedDelivery {
            id: new_id(),
            subscriber: subscriber_id.to_string(),
            date,
            reason: reason.map(|r| r.to_string()),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO missed_delivery (id, subscriber_id, delivery_date, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.subscriber,
                format_day(date),
                record.reason,
                now_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM missed_delivery WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MissedDelivery".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_by_subscriber_and_date(
        &self,
        subscriber_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<MissedDelivery>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT id, subscriber_id, delivery_date, reason
                FROM missed_delivery
                WHERE subscriber_id = ?1 AND delivery_date = ?2
                "#,
                params![subscriber_id, format_day(date)],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 某订户 [start, end] 内的漏送记录
    pub fn list_for_subscriber(
        &self,
        subscriber_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<MissedDelivery>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subscriber_id, delivery_date, reason
            FROM missed_delivery
            WHERE subscriber_id = ?1 AND delivery_date >= ?2 AND delivery_date <= ?3
            ORDER BY delivery_date
            "#,
        )?;
        let records = stmt
            .query_map(
                params![subscriber_id, format_day(start), format_day(end)],
                Self::map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// [from, to] 内全部漏送记录（消耗推算用）
    pub fn list_in_range(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<Vec<MissedDelivery>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, subscriber_id, delivery_date, reason
            FROM missed_delivery
            WHERE delivery_date >= ?1 AND delivery_date <= ?2
            ORDER BY delivery_date, subscriber_id
            "#,
        )?;
        let records = stmt
            .query_map(params![format_day(from), format_day(to)], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
