use crate::db::open_sqlite_connection;
use crate::domain::conflict::SupervisionView;
use crate::domain::professor::ExamSupervisor;
use crate::domain::types::SupervisorRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ExamSupervisorRepository - 监考安排仓储
// ==========================================
/// 监考安排仓储
/// 职责: 管理 exam_supervisor 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问;
///       (exam_id, professor_id) 唯一约束由表结构保证
pub struct ExamSupervisorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExamSupervisorRepository {
    /// 创建新的 ExamSupervisorRepository 实例
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

    /// 批量插入监考安排（单事务）
    pub fn insert_batch(&self, supervisors: &[ExamSupervisor]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for supervisor in supervisors {
            tx.execute(
                r#"
                INSERT INTO exam_supervisor (
                    supervisor_id, exam_id, professor_id, role,
                    is_department_exam, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    supervisor.supervisor_id,
                    supervisor.exam_id,
                    supervisor.professor_id,
                    supervisor.role.to_string(),
                    supervisor.is_department_exam,
                    supervisor.created_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询批次内考试的全部监考安排（预填充教师忙闲/负载）
    pub fn list_by_session(&self, session_id: &str) -> RepositoryResult<Vec<ExamSupervisor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.supervisor_id, s.exam_id, s.professor_id, s.role,
                   s.is_department_exam, s.created_at
            FROM exam_supervisor s
            JOIN exam e ON s.exam_id = e.exam_id
            WHERE e.session_id = ?1
            ORDER BY s.supervisor_id
            "#,
        )?;

        let supervisors = stmt
            .query_map(params![session_id], |row| {
                Ok(ExamSupervisor {
                    supervisor_id: row.get(0)?,
                    exam_id: row.get(1)?,
                    professor_id: row.get(2)?,
                    role: row
                        .get::<_, String>(3)?
                        .parse::<SupervisorRole>()
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                e.into(),
                            )
                        })?,
                    is_department_exam: row.get(4)?,
                    created_at: row
                        .get::<_, String>(5)?
                        .parse::<chrono::DateTime<chrono::Utc>>()
                        .unwrap_or_else(|_| chrono::Utc::now()),
                })
            })?
            .collect::<SqliteResult<Vec<ExamSupervisor>>>()?;

        Ok(supervisors)
    }

    /// 删除批次内考试的全部监考安排（清除排期时级联动作）
    pub fn delete_by_session(&self, session_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            r#"
            DELETE FROM exam_supervisor
            WHERE exam_id IN (SELECT exam_id FROM exam WHERE session_id = ?1)
            "#,
            params![session_id],
        )?;
        Ok(count)
    }

    /// 统计批次内被分配监考的不同教师数
    pub fn count_distinct_professors(&self, session_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT s.professor_id)
            FROM exam_supervisor s
            JOIN exam e ON s.exam_id = e.exam_id
            WHERE e.session_id = ?1
            "#,
            params![session_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    /// 查询批次内已排期考试的监考审计视图（联表: 教师名 + 考试时间）
    pub fn list_supervision_views(&self, session_id: &str) -> RepositoryResult<Vec<SupervisionView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.professor_id, p.name, m.name,
                   e.scheduled_date, e.start_time, e.duration_minutes
            FROM exam_supervisor s
            JOIN professor p ON s.professor_id = p.professor_id
            JOIN exam e ON s.exam_id = e.exam_id
            JOIN module m ON e.module_id = m.module_id
            WHERE e.session_id = ?1 AND e.status = 'scheduled'
            ORDER BY s.supervisor_id
            "#,
        )?;

        let views = stmt
            .query_map(params![session_id], |row| {
                Ok(SupervisionView {
                    professor_id: row.get(0)?,
                    professor_name: row.get(1)?,
                    module_name: row.get(2)?,
                    scheduled_date: row
                        .get::<_, Option<String>>(3)?
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    start_time: row
                        .get::<_, Option<String>>(4)?
                        .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S").ok()),
                    duration_minutes: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<SupervisionView>>>()?;

        Ok(views)
    }
}
