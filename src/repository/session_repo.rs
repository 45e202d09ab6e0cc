use crate::db::open_sqlite_connection;
use crate::domain::exam::ExamSession;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ExamSessionRepository - 考试批次仓储
// ==========================================
/// 考试批次仓储
/// 职责: 管理 exam_session 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ExamSessionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExamSessionRepository {
    /// 创建新的 ExamSessionRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 插入考试批次
    pub fn insert(&self, session: &ExamSession) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO exam_session (
                session_id, name, session_type, start_date, end_date, academic_year
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                session.session_id,
                session.name,
                session.session_type.to_string(),
                session.start_date.to_string(),
                session.end_date.to_string(),
                session.academic_year,
            ],
        )?;
        Ok(())
    }

    /// 按 session_id 查询考试批次
    ///
    /// # 返回
    /// - Ok(Some(ExamSession)): 找到记录
    /// - Ok(None): 未找到记录
    pub fn find_by_id(&self, session_id: &str) -> RepositoryResult<Option<ExamSession>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, name, session_type, start_date, end_date, academic_year
            FROM exam_session
            WHERE session_id = ?1
            "#,
        )?;

        let result = stmt.query_row(params![session_id], |row| {
            Ok(ExamSession {
                session_id: row.get(0)?,
                name: row.get(1)?,
                session_type: row
                    .get::<_, String>(2)?
                    .parse()
                    .map_err(|e: String| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?,
                start_date: row
                    .get::<_, String>(3)?
                    .parse()
                    .map_err(|e: chrono::ParseError| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?,
                end_date: row
                    .get::<_, String>(4)?
                    .parse()
                    .map_err(|e: chrono::ParseError| {
                        rusqlite::Error::FromSqlConversionFailure(
                            4,
                            rusqlite::types::Type::Text,
                            e.into(),
                        )
                    })?,
                academic_year: row.get(5)?,
            })
        });

        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 session_id 查询，未找到时返回 NotFound 错误
    ///
    /// # 用途
    /// - 排考各操作的第一步: 目标批次不存在则整体中止
    pub fn require_by_id(&self, session_id: &str) -> RepositoryResult<ExamSession> {
        self.find_by_id(session_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ExamSession".to_string(),
                id: session_id.to_string(),
            })
    }
}
