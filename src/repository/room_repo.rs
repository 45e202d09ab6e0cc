use crate::db::open_sqlite_connection;
use crate::domain::room::ExamRoom;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ExamRoomRepository - 考场仓储
// ==========================================
/// 考场仓储
/// 职责: 管理 exam_room 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ExamRoomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExamRoomRepository {
    /// 创建新的 ExamRoomRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入考场（数据准备/测试用）
    pub fn insert(&self, room: &ExamRoom) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO exam_room (
                room_id, name, room_type, exam_capacity,
                has_computers, is_available, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                room.room_id,
                room.name,
                room.room_type.to_string(),
                room.exam_capacity,
                room.has_computers,
                room.is_available,
                room.is_active,
            ],
        )?;
        Ok(())
    }

    /// 查询全部可用考场（按考试容量升序）
    ///
    /// # 说明
    /// - 升序排列使"最小可容纳考场"优先被选中,保留大考场给后续更难的考试
    /// - exam_capacity 相同时按 room_id 次序,保证两次运行结果一致
    pub fn list_usable(&self) -> RepositoryResult<Vec<ExamRoom>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT room_id, name, room_type, exam_capacity,
                   has_computers, is_available, is_active
            FROM exam_room
            WHERE is_active = 1 AND is_available = 1
            ORDER BY exam_capacity, room_id
            "#,
        )?;

        let rooms = stmt
            .query_map([], |row| {
                Ok(ExamRoom {
                    room_id: row.get(0)?,
                    name: row.get(1)?,
                    room_type: row.get::<_, String>(2)?.parse().map_err(|e: String| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?,
                    exam_capacity: row.get(3)?,
                    has_computers: row.get(4)?,
                    is_available: row.get(5)?,
                    is_active: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<ExamRoom>>>()?;

        Ok(rooms)
    }
}
