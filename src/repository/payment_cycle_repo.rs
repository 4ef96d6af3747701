// ==========================================
// 订阅配送管理系统 - 缴费周期数据仓储
// ==========================================

use crate::domain::billing::{PaymentCycle, PaymentCycleFilter, PaymentCyclePatch};
use crate::engine::calendar::{format_day, month_bounds};
use crate::repository::db_utils::{day_column, opt_day_column, WhereBuilder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    id, subscriber_id, start_date, end_date, amount, is_due, is_flagged,
    last_payment, product_code, note, invoice_link, payment_link, created_at, updated_at
"#;

pub struct PaymentCycleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentCycleRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<PaymentCycle> {
        Ok(PaymentCycle {
            id: row.get(0)?,
            subscriber: row.get(1)?,
            start_date: day_column(2, row.get(2)?)?,
            end_date: day_column(3, row.get(3)?)?,
            amount: row.get(4)?,
            is_due: row.get(5)?,
            is_flagged: row.get(6)?,
            last_payment: opt_day_column(7, row.get(7)?)?,
            product_code: row.get(8)?,
            note: row.get(9)?,
            invoice_link: row.get(10)?,
            payment_link: row.get(11)?,
            created_at: Self::timestamp_column(12, row.get(12)?)?,
            updated_at: Self::timestamp_column(13, row.get(13)?)?,
        })
    }

    pub fn insert(&self, cycle: &PaymentCycle) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO payment_cycle (
                id, subscriber_id, start_date, end_date, amount, is_due, is_flagged,
                last_payment, product_code, note, invoice_link, payment_link, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                cycle.id,
                cycle.subscriber,
                format_day(cycle.start_date),
                format_day(cycle.end_date),
                cycle.amount,
                cycle.is_due,
                cycle.is_flagged,
                cycle.last_payment.map(format_day),
                cycle.product_code,
                cycle.note,
                cycle.invoice_link,
                cycle.payment_link,
                cycle.created_at.to_rfc3339(),
                cycle.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 局部更新; patch 中为 None 的字段保持不变
    pub fn apply_patch(&self, id: &str, patch: &PaymentCyclePatch) -> RepositoryResult<PaymentCycle> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE payment_cycle SET
                is_due       = COALESCE(?2, is_due),
                is_flagged   = COALESCE(?3, is_flagged),
                last_payment = COALESCE(?4, last_payment),
                note         = COALESCE(?5, note),
                invoice_link = COALESCE(?6, invoice_link),
                payment_link = COALESCE(?7, payment_link),
                updated_at   = ?8
            WHERE id = ?1
            "#,
            params![
                id,
                patch.is_due,
                patch.is_flagged,
                patch.last_payment.map(format_day),
                patch.note,
                patch.invoice_link,
                patch.payment_link,
                Utc::now().to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }

        let sql = format!("SELECT {} FROM payment_cycle WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], Self::map_row)?)
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM payment_cycle WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<PaymentCycle>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM payment_cycle WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], Self::map_row).optional()?)
    }

    /// 条件查询; month 命中与该月有交集的周期
    pub fn list(&self, filter: &PaymentCycleFilter) -> RepositoryResult<Vec<PaymentCycle>> {
        let mut w = WhereBuilder::new();
        if let Some(is_due) = filter.is_due {
            w.push_eq("is_due", is_due);
        }
        if let Some(subscriber) = filter.subscriber.as_deref().filter(|s| !s.is_empty()) {
            w.push_eq("subscriber_id", subscriber.to_string());
        }
        if let Some(month) = filter.month.as_deref() {
            let (first, last) = month_bounds(month).ok_or_else(|| RepositoryError::FieldValueError {
                field: "month".to_string(),
                message: format!("期望 YYYY-MM,实际 {}", month),
            })?;
            w.push(
                "start_date <= ? AND end_date >= ?",
                vec![Box::new(format_day(last)), Box::new(format_day(first))],
            );
        }

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM payment_cycle{} ORDER BY start_date DESC, created_at DESC",
            SELECT_COLUMNS,
            w.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let cycles = stmt
            .query_map(w.params().as_slice(), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cycles)
    }

    /// 全部待缴周期金额合计
    pub fn sum_due_amount(&self) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM payment_cycle WHERE is_due = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 已缴且缴费日落在 [from, to] 内的周期金额合计
    pub fn sum_paid_between(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0.0) FROM payment_cycle
            WHERE is_due = 0 AND last_payment IS NOT NULL
              AND substr(last_payment, 1, 10) BETWEEN ?1 AND ?2
            "#,
            params![format_day(from), format_day(to)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn not_found(id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "PaymentCycle".to_string(),
            id: id.to_string(),
        }
    }
}
