// ==========================================
// 高校排考系统 - 冲突报告领域模型
// ==========================================
// 职责: 冲突审计引擎的输入视图与输出记录
// 红线: 审计只读,冲突记录只描述事实,不触发任何状态变更
// ==========================================

use crate::domain::types::{ConflictSeverity, ConflictType};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ConflictRecord - 冲突记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// 冲突类型
    pub conflict_type: ConflictType,

    /// 严重级别
    pub severity: ConflictSeverity,

    /// 冲突主体 (考场名 / 教师名 / 学号)
    pub subject: String,

    /// 冲突描述
    pub detail: String,
}

// ==========================================
// ScheduledExamView - 已排期考试视图
// ==========================================
// 由仓储层一次性联表构造的类型化快照 (考试 + 课程名 + 考场名/容量),
// 供审计引擎在纯内存中做两两检查
#[derive(Debug, Clone)]
pub struct ScheduledExamView {
    pub exam_id: String,
    pub module_id: String,
    pub module_name: String,
    pub room_id: Option<String>,
    pub room_name: String,
    pub room_capacity: i32,
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub duration_minutes: i32,
    pub expected_students: i32,
}

// ==========================================
// SupervisionView - 监考安排视图
// ==========================================
// 监考记录 + 教师姓名 + 所监考考试的时间信息
#[derive(Debug, Clone)]
pub struct SupervisionView {
    pub professor_id: String,
    pub professor_name: String,
    pub module_name: String,
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub duration_minutes: i32,
}
