// ==========================================
// 订阅配送管理系统 - 订户数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::subscriber::{Lookups, Paginated, Subscriber, SubscriberQuery};
use crate::engine::calendar::format_day;
use crate::repository::db_utils::{new_id, now_rfc3339, WhereBuilder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 默认每页条数
pub const DEFAULT_PER_PAGE: u32 = 50;
/// 每页条数上限
pub const MAX_PER_PAGE: u32 = 500;

const SELECT_COLUMNS: &str = "id, name, phone, email, unit, city, center_name, plan, pincode, landmark, address";

// ==========================================
// SubscriberRepository - 订户仓储
// ==========================================
pub struct SubscriberRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubscriberRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<Subscriber> {
        Ok(Subscriber {
            id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            unit: row.get(4)?,
            city: row.get(5)?,
            center_name: row.get(6)?,
            plan: row.get(7)?,
            pincode: row.get(8)?,
            landmark: row.get(9)?,
            address: row.get(10)?,
        })
    }

    /// 新增订户; id 为空时自动生成
    ///
    /// # 返回
    /// 写入后的订户（含 id）
    pub fn insert(&self, subscriber: &Subscriber) -> RepositoryResult<Subscriber> {
        let mut stored = subscriber.clone();
        if stored.id.trim().is_empty() {
            stored.id = new_id();
        }
        let now = now_rfc3339();

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO subscriber (
                id, name, phone, email, unit, city, center_name, plan,
                pincode, landmark, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
            params![
                stored.id,
                stored.name,
                stored.phone,
                stored.email,
                stored.unit,
                stored.city,
                stored.center_name,
                stored.plan,
                stored.pincode,
                stored.landmark,
                stored.address,
                now,
            ],
        )?;
        Ok(stored)
    }

    /// 全量更新订户
    pub fn update(&self, subscriber: &Subscriber) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE subscriber SET
                name = ?2, phone = ?3, email = ?4, unit = ?5, city = ?6,
                center_name = ?7, plan = ?8, pincode = ?9, landmark = ?10,
                address = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
            params![
                subscriber.id,
                subscriber.name,
                subscriber.phone,
                subscriber.email,
                subscriber.unit,
                subscriber.city,
                subscriber.center_name,
                subscriber.plan,
                subscriber.pincode,
                subscriber.landmark,
                subscriber.address,
                now_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Subscriber".to_string(),
                id: subscriber.id.clone(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM subscriber WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Subscriber".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Subscriber>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM subscriber WHERE id = ?1", SELECT_COLUMNS);
        let sub = conn
            .query_row(&sql, params![id], Self::map_row)
            .optional()?;
        Ok(sub)
    }

    /// 全量订户（核算用快照）
    pub fn list_all(&self) -> RepositoryResult<Vec<Subscriber>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM subscriber ORDER BY id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let subs = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subs)
    }

    /// 分页查询
    ///
    /// - search: 姓名/电话模糊匹配
    /// - city / unit / center_name: 精确匹配
    pub fn query(&self, query: &SubscriberQuery) -> RepositoryResult<Paginated<Subscriber>> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);

        let mut filter = WhereBuilder::new();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            filter.push(
                "(name LIKE ? OR phone LIKE ?)",
                vec![Box::new(pattern.clone()), Box::new(pattern)],
            );
        }
        for (column, value) in [
            ("city", &query.city),
            ("unit", &query.unit),
            ("center_name", &query.center_name),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                filter.push_eq(column, v.to_string());
            }
        }

        let conn = self.get_conn()?;
        let where_sql = filter.sql();
        let params = filter.params();

        let total_items: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM subscriber{}", where_sql),
            params.as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM subscriber{} ORDER BY name, id LIMIT {} OFFSET {}",
            SELECT_COLUMNS,
            where_sql,
            per_page,
            (page - 1) as u64 * per_page as u64
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params.as_slice(), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let total_items = total_items.max(0) as u64;
        let total_pages = total_items.div_ceil(per_page as u64).max(1) as u32;

        Ok(Paginated {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    /// 订户总数
    pub fn count_all(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM subscriber", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }

    /// 创建日期落在 [from, to] 内的订户数（按 created_at 前 10 位比较）
    pub fn count_created_between(&self, from: NaiveDate, to: NaiveDate) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subscriber WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2",
            params![format_day(from), format_day(to)],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as u64)
    }

    /// 去重后的 unit / city / center_name / landmark 取值
    pub fn lookups(&self) -> RepositoryResult<Lookups> {
        let conn = self.get_conn()?;
        let distinct = |column: &str| -> RepositoryResult<Vec<String>> {
            let sql = format!(
                "SELECT DISTINCT {col} FROM subscriber WHERE {col} IS NOT NULL AND TRIM({col}) <> '' ORDER BY {col}",
                col = column
            );
            let mut stmt = conn.prepare(&sql)?;
            let values = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(values)
        };

        Ok(Lookups {
            units: distinct("unit")?,
            cities: distinct("city")?,
            center_names: distinct("center_name")?,
            landmarks: distinct("landmark")?,
        })
    }
}
