// ==========================================
// 订阅配送管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 幂等建表,空库可直接使用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 建表语句（IF NOT EXISTS,可重复执行）
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS subscriber (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    phone       TEXT,
    email       TEXT,
    unit        TEXT,
    city        TEXT,
    center_name TEXT,
    plan        TEXT,
    pincode     TEXT,
    landmark    TEXT,
    address     TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_subscriber_center ON subscriber(center_name);

CREATE TABLE IF NOT EXISTS price_rule (
    id          TEXT PRIMARY KEY,
    rule_date   TEXT,
    scope_type  TEXT NOT NULL CHECK (scope_type IN ('unit', 'center', 'city', 'default')),
    scope_value TEXT NOT NULL DEFAULT '',
    price       REAL NOT NULL,
    is_active   INTEGER,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_price_rule_date ON price_rule(rule_date);

CREATE TABLE IF NOT EXISTS missed_delivery (
    id            TEXT PRIMARY KEY,
    subscriber_id TEXT NOT NULL REFERENCES subscriber(id) ON DELETE CASCADE,
    delivery_date TEXT NOT NULL,
    reason        TEXT,
    created_at    TEXT NOT NULL,
    UNIQUE (subscriber_id, delivery_date)
);
CREATE INDEX IF NOT EXISTS idx_missed_delivery_date ON missed_delivery(delivery_date);

CREATE TABLE IF NOT EXISTS inventory_allocation (
    id          TEXT PRIMARY KEY,
    center      TEXT NOT NULL,
    alloc_date  TEXT NOT NULL,
    quantity    REAL NOT NULL,
    added_by    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_inventory_allocation_center_date
    ON inventory_allocation(center, alloc_date);

CREATE TABLE IF NOT EXISTS city_center (
    id           TEXT PRIMARY KEY,
    city         TEXT NOT NULL UNIQUE,
    centers_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payment_cycle (
    id            TEXT PRIMARY KEY,
    subscriber_id TEXT NOT NULL REFERENCES subscriber(id) ON DELETE CASCADE,
    start_date    TEXT NOT NULL,
    end_date      TEXT NOT NULL,
    amount        REAL NOT NULL,
    is_due        INTEGER NOT NULL DEFAULT 1,
    is_flagged    INTEGER NOT NULL DEFAULT 0,
    last_payment  TEXT,
    product_code  TEXT NOT NULL,
    note          TEXT,
    invoice_link  TEXT,
    payment_link  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_payment_cycle_subscriber ON payment_cycle(subscriber_id);

CREATE TABLE IF NOT EXISTS coupon (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    amount      REAL NOT NULL,
    is_active   INTEGER,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并登记 schema_version（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![CURRENT_SCHEMA_VERSION, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
