use crate::db::open_sqlite_connection;
use crate::domain::module::Enrollment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// EnrollmentRepository - 选课记录仓储
// ==========================================
/// 选课记录仓储
/// 职责: 管理 enrollment 表的数据访问 (排考的只读输入)
/// 红线: 不含业务逻辑，只负责数据访问
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
    /// 创建新的 EnrollmentRepository 实例
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

    /// 批量插入选课记录（INSERT OR IGNORE，使用事务确保原子性）
    pub fn insert_batch(&self, enrollments: &[Enrollment]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for enrollment in enrollments {
            count += tx.execute(
                "INSERT OR IGNORE INTO enrollment (student_id, module_id) VALUES (?1, ?2)",
                params![enrollment.student_id, enrollment.module_id],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询全部选课记录（一次批量读取，供内存索引构建）
    pub fn list_all(&self) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT student_id, module_id FROM enrollment ORDER BY module_id, student_id")?;

        let enrollments = stmt
            .query_map([], |row| {
                Ok(Enrollment {
                    student_id: row.get(0)?,
                    module_id: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<Enrollment>>>()?;

        Ok(enrollments)
    }

    /// 按课程统计选课人数（单条分组查询）
    ///
    /// # 用途
    /// - 批次准备时为每场考试写入 expected_students 快照
    pub fn count_by_module(&self) -> RepositoryResult<HashMap<String, i32>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT module_id, COUNT(*) FROM enrollment GROUP BY module_id")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
        })?;

        for row in rows {
            let (module_id, count) = row?;
            counts.insert(module_id, count);
        }

        Ok(counts)
    }
}
