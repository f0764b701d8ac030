// ==========================================
// 剧团排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/超时)
// - 建表 (CREATE TABLE IF NOT EXISTS)
// - v2: schedules.status (旧库补列)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

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

/// 初始化数据库表结构（幂等）
///
/// 表: performances / members / member_performances / schedules /
///     assignments / personal_schedules / config_kv / schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS performances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            roles TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            auto_assign INTEGER NOT NULL DEFAULT 1,
            max_monthly INTEGER NOT NULL DEFAULT 10,
            avoid_times TEXT,
            avoid_days TEXT,
            memo TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS member_performances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL,
            performance_id INTEGER NOT NULL,
            available_roles TEXT,
            FOREIGN KEY (member_id) REFERENCES members (id) ON DELETE CASCADE,
            FOREIGN KEY (performance_id) REFERENCES performances (id) ON DELETE CASCADE,
            UNIQUE (member_id, performance_id)
        );

        CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            call_time TEXT NOT NULL,
            start_time TEXT NOT NULL,
            performance_id INTEGER NOT NULL,
            venue TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (performance_id) REFERENCES performances (id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS assignments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            schedule_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            is_manual INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (schedule_id) REFERENCES schedules (id) ON DELETE CASCADE,
            FOREIGN KEY (member_id) REFERENCES members (id) ON DELETE CASCADE,
            UNIQUE (schedule_id, role)
        );

        CREATE TABLE IF NOT EXISTS personal_schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            reason TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (member_id) REFERENCES members (id) ON DELETE CASCADE,
            UNIQUE (member_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_schedules_call_time ON schedules (call_time);
        CREATE INDEX IF NOT EXISTS idx_assignments_member ON assignments (member_id);
        "#,
    )?;

    ensure_column(
        conn,
        "schedules",
        "status",
        "status TEXT NOT NULL DEFAULT 'pending'",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 旧库缺列时补列 (ALTER TABLE ADD COLUMN)
fn ensure_column(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> rusqlite::Result<()> {
    let exists: bool = conn
        .query_row(
            &format!("SELECT 1 FROM pragma_table_info('{}') WHERE name = ?1", table),
            [column],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !exists {
        tracing::info!(table, column, "补充缺失列");
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {};", table, definition))?;
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_init_schema_adds_status_to_v1_schedules() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                call_time TEXT NOT NULL,
                start_time TEXT NOT NULL,
                performance_id INTEGER NOT NULL,
                venue TEXT NOT NULL
            );
            INSERT INTO schedules (call_time, start_time, performance_id, venue)
            VALUES ('2024-09-03 10:00:00', '2024-09-03 12:00:00', 1, '대학로 소극장');
            "#,
        )
        .unwrap();

        init_schema(&conn).unwrap();

        let status: String = conn
            .query_row("SELECT status FROM schedules WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(status, "pending");
    }
}
