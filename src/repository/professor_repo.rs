use crate::db::open_sqlite_connection;
use crate::domain::professor::Professor;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ProfessorRepository - 教师仓储
// ==========================================
/// 教师仓储
/// 职责: 管理 professor 表的数据访问 (监考分配的只读输入)
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ProfessorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProfessorRepository {
    /// 创建新的 ProfessorRepository 实例
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

    /// 插入教师（数据准备/测试用）
    pub fn insert(&self, professor: &Professor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO professor (
                professor_id, department_id, name, max_exams_per_day, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                professor.professor_id,
                professor.department_id,
                professor.name,
                professor.max_exams_per_day,
                professor.is_active,
            ],
        )?;
        Ok(())
    }

    /// 查询全部在职可用教师
    pub fn list_active(&self) -> RepositoryResult<Vec<Professor>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT professor_id, department_id, name, max_exams_per_day, is_active
            FROM professor
            WHERE is_active = 1
            ORDER BY professor_id
            "#,
        )?;

        let professors = stmt
            .query_map([], |row| {
                Ok(Professor {
                    professor_id: row.get(0)?,
                    department_id: row.get(1)?,
                    name: row.get(2)?,
                    max_exams_per_day: row.get(3)?,
                    is_active: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<Professor>>>()?;

        Ok(professors)
    }
}
