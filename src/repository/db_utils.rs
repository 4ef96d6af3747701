// ==========================================
// 订阅配送管理系统 - 仓储公共工具
// ==========================================
// 职责: 日期列转换、动态 WHERE 条件拼装、ID/时间戳生成
// ==========================================

use crate::engine::calendar::{format_day, parse_day};
use chrono::{NaiveDate, Utc};
use rusqlite::types::{ToSql, Type};

/// 新记录 ID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 当前时间 (RFC3339)
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// 读取日期列（宽松解析,兼容时间戳格式）
pub fn day_column(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    parse_day(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法解析日期: {}", raw).into(),
        )
    })
}

/// 读取可空日期列
pub fn opt_day_column(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    match raw {
        Some(s) if !s.trim().is_empty() => day_column(idx, s).map(Some),
        _ => Ok(None),
    }
}

// ==========================================
// WhereBuilder - 动态条件拼装
// ==========================================
// 所有值均走参数绑定
#[derive(Default)]
pub struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加条件; `clause` 中每个 `?` 对应 `values` 中的一个值
    pub fn push(&mut self, clause: &str, values: Vec<Box<dyn ToSql>>) -> &mut Self {
        self.clauses.push(clause.to_string());
        self.params.extend(values);
        self
    }

    pub fn push_eq(&mut self, column: &str, value: impl ToSql + 'static) -> &mut Self {
        self.push(&format!("{} = ?", column), vec![Box::new(value)])
    }

    pub fn push_day_range(
        &mut self,
        column: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> &mut Self {
        if let Some(from) = from {
            self.push(&format!("{} >= ?", column), vec![Box::new(format_day(from))]);
        }
        if let Some(to) = to {
            self.push(&format!("{} <= ?", column), vec![Box::new(format_day(to))]);
        }
        self
    }

    /// 生成 ` WHERE ...` 片段（无条件时为空串）
    pub fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_builder_sql() {
        let mut w = WhereBuilder::new();
        assert_eq!(w.sql(), "");

        w.push_eq("center", "Naini".to_string()).push_day_range(
            "alloc_date",
            NaiveDate::from_ymd_opt(2024, 3, 1),
            None,
        );
        assert_eq!(w.sql(), " WHERE center = ? AND alloc_date >= ?");
        assert_eq!(w.params().len(), 2);
    }

    #[test]
    fn test_day_column_accepts_timestamp() {
        let d = day_column(0, "2024-03-01 00:00:00.000Z".to_string()).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(day_column(0, "bad".to_string()).is_err());
        assert_eq!(opt_day_column(0, Some("".to_string())).unwrap(), None);
    }
}
