// ==========================================
// 高校排考系统 - 排考 API
// ==========================================
// 职责: 协调 批量读取 -> 内存引擎 -> 单事务写回 的完整流程
// 红线: 算法运行期间零 SQL; 失败场次只计数,不中断批次;
//       目标批次不存在则整体中止 (NotFound)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ScheduleConfigReader, SchedulePolicy};
use crate::domain::conflict::ConflictRecord;
use crate::domain::exam::Exam;
use crate::domain::types::ExamStatus;
use crate::engine::{
    ConflictAuditor, GreedyScheduler, ScheduleIndexes, SlotCandidate, SlotGenerator,
    SupervisorAssigner,
};
use crate::repository::{
    EnrollmentRepository, ExamRepository, ExamRoomRepository, ExamSessionRepository,
    ExamSupervisorRepository, ModuleRepository, ProfessorRepository,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// 结果 DTO
// ==========================================

/// 批次准备结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareSessionResult {
    pub exams_created: usize,
}

/// 批量排期结果
///
/// 调用方必须检查 failed_count 判断是否存在未落位考试,
/// 不要依赖异常
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScheduleResult {
    pub total_exams: usize,
    pub scheduled_count: usize,
    pub failed_count: usize,
    pub execution_time_ms: u64,
}

/// 单场排期结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamScheduleResult {
    pub success: bool,
    pub message: String,
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub room_name: Option<String>,
}

/// 监考分配结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorAssignResult {
    pub assignments_made: usize,
    pub professors_used: usize,
    pub avg_supervisions: f64,
}

/// 清除排期结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearSessionResult {
    pub exams_cleared: usize,
    pub supervisors_removed: usize,
    pub execution_time_ms: u64,
}

/// 批次统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_exams: i64,
    pub scheduled_exams: i64,
    pub pending_exams: i64,
    pub rooms_used: i64,
    pub professors_assigned: i64,
}

// ==========================================
// SchedulingApi - 排考 API
// ==========================================

/// 排考API
///
/// 职责：
/// 1. 批次准备 / 批量排期 / 单场排期 / 清除排期
/// 2. 监考分配
/// 3. 冲突审计 / 批次统计
///
/// 架构说明：
/// - 所有仓储共享同一连接,保证各操作读到一致快照
/// - 引擎为纯内存组件,由本层负责读写两端
pub struct SchedulingApi {
    session_repo: ExamSessionRepository,
    module_repo: ModuleRepository,
    enrollment_repo: EnrollmentRepository,
    room_repo: ExamRoomRepository,
    exam_repo: ExamRepository,
    professor_repo: ProfessorRepository,
    supervisor_repo: ExamSupervisorRepository,
    config: Arc<ConfigManager>,
}

impl SchedulingApi {
    /// 创建新的SchedulingApi实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建SchedulingApi实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            session_repo: ExamSessionRepository::from_connection(conn.clone()),
            module_repo: ModuleRepository::from_connection(conn.clone()),
            enrollment_repo: EnrollmentRepository::from_connection(conn.clone()),
            room_repo: ExamRoomRepository::from_connection(conn.clone()),
            exam_repo: ExamRepository::from_connection(conn.clone()),
            professor_repo: ProfessorRepository::from_connection(conn.clone()),
            supervisor_repo: ExamSupervisorRepository::from_connection(conn),
            config: Arc::new(config),
        })
    }

    /// 加载排考策略 (每次操作装配一次)
    async fn load_policy(&self) -> ApiResult<SchedulePolicy> {
        self.config
            .load_schedule_policy()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    // ==========================================
    // 批次准备
    // ==========================================

    /// 为批次批量创建 pending 考试
    ///
    /// 规则:
    /// - 覆盖批次学年内的全部启用课程
    /// - 已建考试的课程跳过 (幂等)
    /// - expected_students 取选课统计快照
    pub async fn prepare_session(&self, session_id: &str) -> ApiResult<PrepareSessionResult> {
        let session = self.session_repo.require_by_id(session_id)?;

        let modules = self
            .module_repo
            .list_active_by_academic_year(&session.academic_year)?;
        let existing_module_ids = self.exam_repo.find_module_ids_by_session(session_id)?;
        let student_counts = self.enrollment_repo.count_by_module()?;

        let now = Utc::now();
        let new_exams: Vec<Exam> = modules
            .into_iter()
            .filter(|m| !existing_module_ids.contains(&m.module_id))
            .map(|m| Exam {
                exam_id: Uuid::new_v4().to_string(),
                module_id: m.module_id.clone(),
                session_id: session.session_id.clone(),
                room_id: None,
                scheduled_date: None,
                start_time: None,
                duration_minutes: m.exam_duration_minutes,
                status: ExamStatus::Pending,
                expected_students: student_counts.get(&m.module_id).copied().unwrap_or(0),
                requires_computer: m.requires_computer,
                requires_lab: m.requires_lab,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let exams_created = self.exam_repo.insert_batch(&new_exams)?;

        info!(session_id, exams_created, "批次准备完成");
        Ok(PrepareSessionResult { exams_created })
    }

    // ==========================================
    // 批量排期
    // ==========================================

    /// 批次整体排期
    ///
    /// 流程:
    /// 1) 少量批量读取 (批次/选课/考场/待排/已排)
    /// 2) 构建内存索引 + 生成时段序列
    /// 3) 贪心引擎纯内存落位 (零 SQL)
    /// 4) 单事务写回全部落位结果
    pub async fn schedule_session(&self, session_id: &str) -> ApiResult<SessionScheduleResult> {
        let start = Instant::now();

        // ==========================================
        // 阶段1: 批量读取
        // ==========================================
        let session = self.session_repo.require_by_id(session_id)?;
        let policy = self.load_policy().await?;

        let enrollments = self.enrollment_repo.list_all()?;
        let rooms = self.room_repo.list_usable()?;
        let mut pending_exams = self.exam_repo.find_pending_by_session(session_id)?;
        let existing_exams = self.exam_repo.find_scheduled_by_session(session_id)?;

        debug!(
            pending = pending_exams.len(),
            existing = existing_exams.len(),
            rooms = rooms.len(),
            "批量读取完成"
        );

        // ==========================================
        // 阶段2: 内存结构构建
        // ==========================================
        let mut indexes = ScheduleIndexes::build(&enrollments, rooms, &existing_exams);
        let slots = SlotGenerator::generate(&session, &policy);

        // ==========================================
        // 阶段3: 纯内存贪心落位
        // ==========================================
        let scheduler = GreedyScheduler::new();
        let stats = scheduler.schedule_batch(&mut pending_exams, &slots, &mut indexes, &policy);

        // ==========================================
        // 阶段4: 单事务写回
        // ==========================================
        let placed: Vec<Exam> = pending_exams
            .iter()
            .filter(|e| e.status == ExamStatus::Scheduled)
            .cloned()
            .collect();
        self.exam_repo.commit_schedule_batch(&placed)?;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            session_id,
            total = stats.total,
            scheduled = stats.scheduled,
            failed = stats.failed,
            execution_time_ms,
            "批量排期完成"
        );

        Ok(SessionScheduleResult {
            total_exams: stats.total,
            scheduled_count: stats.scheduled,
            failed_count: stats.failed,
            execution_time_ms,
        })
    }

    // ==========================================
    // 单场排期 / 交互查询
    // ==========================================

    /// 查询单场考试的候选时段 (交互式,提交前预览)
    pub async fn available_slots(
        &self,
        exam_id: &str,
        limit: usize,
    ) -> ApiResult<Vec<SlotCandidate>> {
        let exam = self.exam_repo.require_by_id(exam_id)?;
        self.find_slots_for_exam(&exam, limit).await
    }

    /// 单场考试排期 (取首个候选提交)
    pub async fn schedule_exam(&self, exam_id: &str) -> ApiResult<ExamScheduleResult> {
        let mut exam = self.exam_repo.require_by_id(exam_id)?;

        let candidates = self.find_slots_for_exam(&exam, 1).await?;
        let Some(best) = candidates.first() else {
            return Ok(ExamScheduleResult {
                success: false,
                message: "无可用时段".to_string(),
                scheduled_date: None,
                start_time: None,
                room_name: None,
            });
        };

        exam.place(best.slot_date, best.start_time, best.room_id.clone());
        self.exam_repo.commit_schedule_batch(std::slice::from_ref(&exam))?;

        info!(exam_id, date = %best.slot_date, time = %best.start_time, room = %best.room_id, "单场排期完成");
        Ok(ExamScheduleResult {
            success: true,
            message: "排期成功".to_string(),
            scheduled_date: Some(best.slot_date),
            start_time: Some(best.start_time),
            room_name: Some(best.room_name.clone()),
        })
    }

    /// 单场考试的候选扫描 (批量与交互共用引擎路径)
    async fn find_slots_for_exam(
        &self,
        exam: &Exam,
        limit: usize,
    ) -> ApiResult<Vec<SlotCandidate>> {
        let session = self.session_repo.require_by_id(&exam.session_id)?;
        let policy = self.load_policy().await?;

        let enrollments = self.enrollment_repo.list_all()?;
        let rooms = self.room_repo.list_usable()?;
        // 排除自身: 重排场景下不应被自己占用的时段挡住
        let existing_exams: Vec<Exam> = self
            .exam_repo
            .find_scheduled_by_session(&exam.session_id)?
            .into_iter()
            .filter(|e| e.exam_id != exam.exam_id)
            .collect();

        let indexes = ScheduleIndexes::build(&enrollments, rooms, &existing_exams);
        let slots = SlotGenerator::generate(&session, &policy);

        let scheduler = GreedyScheduler::new();
        Ok(scheduler.find_candidate_slots(exam, &slots, &indexes, &policy, limit))
    }

    // ==========================================
    // 监考分配
    // ==========================================

    /// 批次监考分配 (第二趟贪心,尽力而为)
    pub async fn assign_supervisors(&self, session_id: &str) -> ApiResult<SupervisorAssignResult> {
        self.session_repo.require_by_id(session_id)?;
        let policy = self.load_policy().await?;

        let exams = self.exam_repo.find_scheduled_by_session(session_id)?;
        if exams.is_empty() {
            info!(session_id, "无已排期考试,跳过监考分配");
            return Ok(SupervisorAssignResult {
                assignments_made: 0,
                professors_used: 0,
                avg_supervisions: 0.0,
            });
        }

        let professors = self.professor_repo.list_active()?;
        let existing = self.supervisor_repo.list_by_session(session_id)?;
        let module_depts = self.module_repo.module_department_map()?;

        let mut assigner = SupervisorAssigner::new();
        let (new_assignments, stats) =
            assigner.assign(&exams, &professors, &existing, &module_depts, &policy);

        self.supervisor_repo.insert_batch(&new_assignments)?;

        info!(
            session_id,
            assigned = stats.assigned,
            professors_used = stats.professors_used,
            avg_load = stats.avg_load,
            "监考分配完成"
        );

        Ok(SupervisorAssignResult {
            assignments_made: stats.assigned,
            professors_used: stats.professors_used,
            avg_supervisions: stats.avg_load,
        })
    }

    // ==========================================
    // 冲突审计
    // ==========================================

    /// 批次冲突审计 (只读,按需运行)
    pub async fn detect_conflicts(&self, session_id: &str) -> ApiResult<Vec<ConflictRecord>> {
        self.session_repo.require_by_id(session_id)?;
        let policy = self.load_policy().await?;

        let exam_views = self.exam_repo.list_scheduled_views(session_id)?;
        let supervision_views = self.supervisor_repo.list_supervision_views(session_id)?;
        let enrollments = self.enrollment_repo.list_all()?;

        let auditor = ConflictAuditor::new();
        let conflicts = auditor.audit(&exam_views, &supervision_views, &enrollments, &policy);

        info!(session_id, conflict_count = conflicts.len(), "冲突审计完成");
        Ok(conflicts)
    }

    // ==========================================
    // 清除排期
    // ==========================================

    /// 清除批次排期: 已排期考试批量重置为 pending,删除监考安排
    pub async fn clear_session(&self, session_id: &str) -> ApiResult<ClearSessionResult> {
        let start = Instant::now();
        self.session_repo.require_by_id(session_id)?;

        let supervisors_removed = self.supervisor_repo.delete_by_session(session_id)?;
        let exams_cleared = self.exam_repo.clear_session_schedule(session_id)?;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        info!(
            session_id,
            exams_cleared, supervisors_removed, execution_time_ms, "清除排期完成"
        );

        Ok(ClearSessionResult {
            exams_cleared,
            supervisors_removed,
            execution_time_ms,
        })
    }

    // ==========================================
    // 批次统计
    // ==========================================

    /// 批次聚合统计
    pub async fn session_stats(&self, session_id: &str) -> ApiResult<SessionStats> {
        self.session_repo.require_by_id(session_id)?;

        let (total_exams, scheduled_exams) = self.exam_repo.count_by_session(session_id)?;
        let rooms_used = self.exam_repo.count_distinct_rooms(session_id)?;
        let professors_assigned = self.supervisor_repo.count_distinct_professors(session_id)?;

        Ok(SessionStats {
            total_exams,
            scheduled_exams,
            pending_exams: total_exams - scheduled_exams,
            rooms_used,
            professors_assigned,
        })
    }
}
