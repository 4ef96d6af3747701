// ==========================================
// 订阅配送管理系统 - 城市/配送中心映射仓储
// ==========================================
// centers 以 JSON 数组文本存储
// ==========================================

use crate::domain::city_center::CityCenter;
use crate::repository::db_utils::new_id;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct CityCenterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CityCenterRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<CityCenter>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, city, centers_json FROM city_center ORDER BY city")?;
        let rows = stmt
            .query_map([], |row| {
                let raw: String = row.get(2)?;
                let centers: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                })?;
                Ok(CityCenter {
                    id: Some(row.get(0)?),
                    city: row.get(1)?,
                    centers,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 全量替换映射（先清空再写入,单事务）
    ///
    /// # 返回
    /// 写入的记录（含新 id）
    pub fn replace_all(&self, mappings: &[CityCenter]) -> RepositoryResult<Vec<CityCenter>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM city_center", [])?;

        let mut stored = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            let id = new_id();
            tx.execute(
                "INSERT INTO city_center (id, city, centers_json) VALUES (?1, ?2, ?3)",
                params![id, mapping.city, serde_json::to_string(&mapping.centers)?],
            )?;
            stored.push(CityCenter {
                id: Some(id),
                city: mapping.city.clone(),
                centers: mapping.centers.clone(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::city_center::seed_city_centers;

    #[test]
    fn test_replace_all_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let repo = CityCenterRepository::from_connection(Arc::new(Mutex::new(conn)));

        repo.replace_all(&seed_city_centers()).unwrap();
        repo.replace_all(&seed_city_centers()).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].city, "Agra");
        assert!(all[0].centers.contains(&"Cantt".to_string()));
    }
}
