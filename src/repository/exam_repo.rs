use crate::db::open_sqlite_connection;
use crate::domain::conflict::ScheduledExamView;
use crate::domain::exam::Exam;
use crate::domain::types::ExamStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 考试时间的存储格式 (HH:MM:SS)
const TIME_FORMAT: &str = "%H:%M:%S";

// ==========================================
// ExamRepository - 考试仓储
// ==========================================
/// 考试仓储
/// 职责: 管理 exam 表的数据访问 (排考主实体)
/// 红线: 不含业务逻辑，只负责数据访问;
///       排期结果的落库只走单事务批量提交
pub struct ExamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExamRepository {
    /// 创建新的 ExamRepository 实例
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

    /// 批量插入考试（批次准备步骤产出，使用事务确保原子性）
    pub fn insert_batch(&self, exams: &[Exam]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for exam in exams {
            tx.execute(
                r#"
                INSERT INTO exam (
                    exam_id, module_id, session_id, room_id,
                    scheduled_date, start_time, duration_minutes, status,
                    expected_students, requires_computer, requires_lab,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    exam.exam_id,
                    exam.module_id,
                    exam.session_id,
                    exam.room_id,
                    exam.scheduled_date.map(|d| d.to_string()),
                    exam.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                    exam.duration_minutes,
                    exam.status.to_string(),
                    exam.expected_students,
                    exam.requires_computer,
                    exam.requires_lab,
                    exam.created_at.to_rfc3339(),
                    exam.updated_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 按 exam_id 查询考试
    pub fn find_by_id(&self, exam_id: &str) -> RepositoryResult<Option<Exam>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE exam_id = ?1", SELECT_EXAM))?;

        let result = stmt.query_row(params![exam_id], map_exam_row);

        match result {
            Ok(exam) => Ok(Some(exam)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 exam_id 查询，未找到时返回 NotFound 错误
    pub fn require_by_id(&self, exam_id: &str) -> RepositoryResult<Exam> {
        self.find_by_id(exam_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Exam".to_string(),
                id: exam_id.to_string(),
            })
    }

    /// 查询批次内的待排期考试（"先难后易"序）
    ///
    /// # 说明
    /// - 预计人数降序: 大考试可行的 (考场,时段) 组合更少,先排
    /// - exam_id 升序作为次序键,保证两次运行取到完全相同的顺序
    pub fn find_pending_by_session(&self, session_id: &str) -> RepositoryResult<Vec<Exam>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE session_id = ?1 AND status = 'pending' \
             ORDER BY expected_students DESC, exam_id",
            SELECT_EXAM
        ))?;

        let exams = stmt
            .query_map(params![session_id], map_exam_row)?
            .collect::<SqliteResult<Vec<Exam>>>()?;

        Ok(exams)
    }

    /// 查询批次内的已排期考试（预填充忙闲索引 / 监考分配输入）
    pub fn find_scheduled_by_session(&self, session_id: &str) -> RepositoryResult<Vec<Exam>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE session_id = ?1 AND status = 'scheduled' ORDER BY exam_id",
            SELECT_EXAM
        ))?;

        let exams = stmt
            .query_map(params![session_id], map_exam_row)?
            .collect::<SqliteResult<Vec<Exam>>>()?;

        Ok(exams)
    }

    /// 查询批次内已建考试的课程ID集合（批次准备防重）
    pub fn find_module_ids_by_session(&self, session_id: &str) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT module_id FROM exam WHERE session_id = ?1")?;

        let ids = stmt
            .query_map(params![session_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<HashSet<String>>>()?;

        Ok(ids)
    }

    /// 批量提交排期结果（单事务）
    ///
    /// # 说明
    /// - 引擎在内存中完成全部落位后,此处一次性写回
    /// - 只回写排期字段与状态,其余字段不动
    pub fn commit_schedule_batch(&self, exams: &[Exam]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for exam in exams {
            count += tx.execute(
                r#"
                UPDATE exam
                SET scheduled_date = ?1, start_time = ?2, room_id = ?3,
                    status = ?4, updated_at = ?5
                WHERE exam_id = ?6
                "#,
                params![
                    exam.scheduled_date.map(|d| d.to_string()),
                    exam.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                    exam.room_id,
                    exam.status.to_string(),
                    exam.updated_at.to_rfc3339(),
                    exam.exam_id,
                ],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 批量清除批次排期（单条 UPDATE）
    ///
    /// # 返回
    /// - Ok(usize): 被重置为 pending 的考试数
    pub fn clear_session_schedule(&self, session_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute(
            r#"
            UPDATE exam
            SET status = 'pending', scheduled_date = NULL, start_time = NULL,
                room_id = NULL, updated_at = datetime('now')
            WHERE session_id = ?1 AND status = 'scheduled'
            "#,
            params![session_id],
        )?;
        Ok(count)
    }

    /// 统计批次内考试数量（总数 / 已排期）
    pub fn count_by_session(&self, session_id: &str) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let (total, scheduled) = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'scheduled' THEN 1 ELSE 0 END), 0)
            FROM exam
            WHERE session_id = ?1
            "#,
            params![session_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok((total, scheduled))
    }

    /// 统计批次内占用的不同考场数
    pub fn count_distinct_rooms(&self, session_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(DISTINCT room_id) FROM exam \
             WHERE session_id = ?1 AND room_id IS NOT NULL",
            params![session_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    /// 查询批次内已排期考试的审计视图（联表: 课程名 + 考场名/容量）
    ///
    /// # 说明
    /// - 一次联表构造类型化快照,冲突审计引擎在纯内存中消费
    pub fn list_scheduled_views(&self, session_id: &str) -> RepositoryResult<Vec<ScheduledExamView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                e.exam_id, e.module_id, m.name,
                e.room_id, COALESCE(r.name, ''), COALESCE(r.exam_capacity, 0),
                e.scheduled_date, e.start_time, e.duration_minutes, e.expected_students
            FROM exam e
            JOIN module m ON e.module_id = m.module_id
            LEFT JOIN exam_room r ON e.room_id = r.room_id
            WHERE e.session_id = ?1 AND e.status = 'scheduled'
            ORDER BY e.exam_id
            "#,
        )?;

        let views = stmt
            .query_map(params![session_id], |row| {
                Ok(ScheduledExamView {
                    exam_id: row.get(0)?,
                    module_id: row.get(1)?,
                    module_name: row.get(2)?,
                    room_id: row.get(3)?,
                    room_name: row.get(4)?,
                    room_capacity: row.get(5)?,
                    scheduled_date: parse_opt_date(row.get::<_, Option<String>>(6)?),
                    start_time: parse_opt_time(row.get::<_, Option<String>>(7)?),
                    duration_minutes: row.get(8)?,
                    expected_students: row.get(9)?,
                })
            })?
            .collect::<SqliteResult<Vec<ScheduledExamView>>>()?;

        Ok(views)
    }
}

// ==========================================
// 行映射辅助
// ==========================================

const SELECT_EXAM: &str = r#"
    SELECT exam_id, module_id, session_id, room_id,
           scheduled_date, start_time, duration_minutes, status,
           expected_students, requires_computer, requires_lab,
           created_at, updated_at
    FROM exam
"#;

fn parse_opt_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn parse_opt_time(raw: Option<String>) -> Option<NaiveTime> {
    raw.and_then(|s| NaiveTime::parse_from_str(&s, TIME_FORMAT).ok())
}

/// exam 行映射
fn map_exam_row(row: &Row<'_>) -> SqliteResult<Exam> {
    Ok(Exam {
        exam_id: row.get(0)?,
        module_id: row.get(1)?,
        session_id: row.get(2)?,
        room_id: row.get(3)?,
        scheduled_date: parse_opt_date(row.get::<_, Option<String>>(4)?),
        start_time: parse_opt_time(row.get::<_, Option<String>>(5)?),
        duration_minutes: row.get(6)?,
        status: row
            .get::<_, String>(7)?
            .parse::<ExamStatus>()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, e.into())
            })?,
        expected_students: row.get(8)?,
        requires_computer: row.get(9)?,
        requires_lab: row.get(10)?,
        created_at: row
            .get::<_, String>(11)?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: row
            .get::<_, String>(12)?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap_or_else(|_| chrono::Utc::now()),
    })
}
