// ==========================================
// 订阅配送管理系统 - 计价规则数据仓储
// ==========================================
// is_active 三态落库: NULL / 0 / 1
// ==========================================

use crate::domain::pricing::{PriceRule, PriceRuleDraft};
use crate::domain::types::PriceScopeType;
use crate::engine::calendar::format_day;
use crate::repository::db_utils::{new_id, now_rfc3339, opt_day_column};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "id, rule_date, scope_type, scope_value, price, is_active";

// ==========================================
// PriceRuleRepository - 计价规则仓储
// ==========================================
pub struct PriceRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PriceRuleRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<PriceRule> {
        let scope_raw: String = row.get(2)?;
        let scope_type = PriceScopeType::from_str(&scope_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("未知的作用域: {}", scope_raw).into(),
            )
        })?;

        Ok(PriceRule {
            id: row.get(0)?,
            date: opt_day_column(1, row.get(1)?)?,
            scope_type,
            scope_value: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            price: row.get(4)?,
            is_active: row.get(5)?,
        })
    }

    pub fn insert(&self, draft: &PriceRuleDraft) -> RepositoryResult<PriceRule> {
        let rule = PriceRule {
            id: new_id(),
            date: Some(draft.date),
            scope_type: draft.scope_type,
            scope_value: draft.scope_value.clone(),
            price: draft.price,
            is_active: draft.is_active,
        };
        let now = now_rfc3339();

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO price_rule (
                id, rule_date, scope_type, scope_value, price, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                rule.id,
                format_day(draft.date),
                rule.scope_type.to_db_str(),
                rule.scope_value,
                rule.price,
                rule.is_active,
                now,
            ],
        )?;
        Ok(rule)
    }

    pub fn update(&self, id: &str, draft: &PriceRuleDraft) -> RepositoryResult<PriceRule> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE price_rule SET
                rule_date = ?2, scope_type = ?3, scope_value = ?4,
                price = ?5, is_active = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                format_day(draft.date),
                draft.scope_type.to_db_str(),
                draft.scope_value,
                draft.price,
                draft.is_active,
                now_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(PriceRule {
            id: id.to_string(),
            date: Some(draft.date),
            scope_type: draft.scope_type,
            scope_value: draft.scope_value.clone(),
            price: draft.price,
            is_active: draft.is_active,
        })
    }

    pub fn set_active(&self, id: &str, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE price_rule SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, is_active, now_rfc3339()],
        )?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM price_rule WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<PriceRule>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM price_rule WHERE id = ?1", SELECT_COLUMNS);
        let rule = conn.query_row(&sql, params![id], Self::map_row).optional()?;
        Ok(rule)
    }

    /// 计算 [start, end] 所需的启用规则
    ///
    /// - 区间内的任意作用域规则
    /// - 以及 end 之前（含）生效的所有 default 规则（含无日期者）
    ///
    /// 按日期倒序; 停用规则 (is_active=0) 不返回, NULL 视为启用
    pub fn list_for_window(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<PriceRule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM price_rule
            WHERE ((rule_date >= ?1 AND rule_date <= ?2)
                   OR (scope_type = 'default' AND (rule_date IS NULL OR rule_date <= ?2)))
              AND (is_active IS NULL OR is_active <> 0)
            ORDER BY rule_date DESC, created_at ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map(params![format_day(start), format_day(end)], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    fn not_found(id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "PriceRule".to_string(),
            id: id.to_string(),
        }
    }
}
