// ==========================================
// 高校排考系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供统一建表入口，供 CLI / 测试 / 数据准备复用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

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

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 表结构:
/// - config_scope / config_kv: 排考策略配置（key-value + scope）
/// - department / formation / module / enrollment: 教学组织与选课（只读输入）
/// - exam_room / exam_session / exam: 考场、考试批次与考试（exam 为排考主实体）
/// - professor / exam_supervisor: 教师与监考安排
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS department (
            department_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS formation (
            formation_id TEXT PRIMARY KEY,
            department_id TEXT NOT NULL REFERENCES department(department_id),
            name TEXT NOT NULL,
            academic_year TEXT NOT NULL,
            UNIQUE(department_id, name, academic_year)
        );

        CREATE TABLE IF NOT EXISTS module (
            module_id TEXT PRIMARY KEY,
            formation_id TEXT NOT NULL REFERENCES formation(formation_id),
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            exam_duration_minutes INTEGER NOT NULL DEFAULT 120,
            requires_computer INTEGER NOT NULL DEFAULT 0,
            requires_lab INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS enrollment (
            student_id TEXT NOT NULL,
            module_id TEXT NOT NULL REFERENCES module(module_id) ON DELETE CASCADE,
            PRIMARY KEY (student_id, module_id)
        );

        CREATE TABLE IF NOT EXISTS exam_room (
            room_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            room_type TEXT NOT NULL,
            exam_capacity INTEGER NOT NULL,
            has_computers INTEGER NOT NULL DEFAULT 0,
            is_available INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS exam_session (
            session_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            session_type TEXT NOT NULL DEFAULT 'normal',
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            academic_year TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exam (
            exam_id TEXT PRIMARY KEY,
            module_id TEXT NOT NULL REFERENCES module(module_id),
            session_id TEXT NOT NULL REFERENCES exam_session(session_id) ON DELETE CASCADE,
            room_id TEXT REFERENCES exam_room(room_id),
            scheduled_date TEXT,
            start_time TEXT,
            duration_minutes INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            expected_students INTEGER NOT NULL DEFAULT 0,
            requires_computer INTEGER NOT NULL DEFAULT 0,
            requires_lab INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(session_id, module_id)
        );

        CREATE TABLE IF NOT EXISTS professor (
            professor_id TEXT PRIMARY KEY,
            department_id TEXT NOT NULL REFERENCES department(department_id),
            name TEXT NOT NULL,
            max_exams_per_day INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS exam_supervisor (
            supervisor_id TEXT PRIMARY KEY,
            exam_id TEXT NOT NULL REFERENCES exam(exam_id) ON DELETE CASCADE,
            professor_id TEXT NOT NULL REFERENCES professor(professor_id) ON DELETE CASCADE,
            role TEXT NOT NULL DEFAULT 'supervisor',
            is_department_exam INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(exam_id, professor_id)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(1));
    }
}
