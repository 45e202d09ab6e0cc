// ==========================================
// 高校排考系统 - 考试领域模型
// ==========================================
// 职责: 考试批次 (排期窗口) 与考试 (排考主实体)
// 红线: 仅当 日期+时间+考场 三者齐备时, 状态才迁移为 scheduled
// ==========================================

use crate::domain::types::{ExamStatus, SessionType};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ExamSession - 考试批次
// ==========================================
// 定义排期窗口 [start_date, end_date],批次内的考试共享同一窗口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    pub session_id: String,        // 批次ID
    pub name: String,              // 批次名称 (如 "2025-2026 第一学期期末")
    pub session_type: SessionType, // 批次类型 (normal/makeup/special)
    pub start_date: NaiveDate,     // 窗口起始日期 (含)
    pub end_date: NaiveDate,       // 窗口结束日期 (含)
    pub academic_year: String,     // 学年
}

// ==========================================
// Exam - 考试
// ==========================================
// 排考的主变更实体: 由批次准备步骤以 pending 状态创建,
// 引擎写入 scheduled_date / start_time / room_id 后迁移为 scheduled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: String,                  // 考试ID
    pub module_id: String,                // 课程ID
    pub session_id: String,               // 批次ID
    pub room_id: Option<String>,          // 考场ID (排期后)
    pub scheduled_date: Option<NaiveDate>, // 考试日期 (排期后)
    pub start_time: Option<NaiveTime>,    // 开始时间 (排期后)
    pub duration_minutes: i32,            // 考试时长 (分钟,取自课程)
    pub status: ExamStatus,               // 状态
    pub expected_students: i32,           // 预计人数 (来自选课统计快照)
    pub requires_computer: bool,          // 需要计算机 (取自课程)
    pub requires_lab: bool,               // 需要实验室 (取自课程)
    pub created_at: DateTime<Utc>,        // 创建时间
    pub updated_at: DateTime<Utc>,        // 更新时间
}

impl Exam {
    /// 判断是否已完成排期 (三要素齐备)
    pub fn is_placed(&self) -> bool {
        self.scheduled_date.is_some() && self.start_time.is_some() && self.room_id.is_some()
    }

    /// 写入排期结果并迁移状态
    ///
    /// 说明: 这是 pending -> scheduled 的唯一入口,
    /// 保证"状态为 scheduled 必然三要素齐备"的不变量。
    pub fn place(&mut self, date: NaiveDate, time: NaiveTime, room_id: String) {
        self.scheduled_date = Some(date);
        self.start_time = Some(time);
        self.room_id = Some(room_id);
        self.status = ExamStatus::Scheduled;
        self.updated_at = Utc::now();
    }

    /// 清除排期结果并回到 pending
    pub fn unplace(&mut self) {
        self.scheduled_date = None;
        self.start_time = None;
        self.room_id = None;
        self.status = ExamStatus::Pending;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_exam() -> Exam {
        Exam {
            exam_id: "E001".to_string(),
            module_id: "M001".to_string(),
            session_id: "S001".to_string(),
            room_id: None,
            scheduled_date: None,
            start_time: None,
            duration_minutes: 120,
            status: ExamStatus::Pending,
            expected_students: 30,
            requires_computer: false,
            requires_lab: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_place_sets_all_three_fields() {
        let mut exam = pending_exam();
        assert!(!exam.is_placed());

        exam.place(
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            "R001".to_string(),
        );

        assert!(exam.is_placed());
        assert_eq!(exam.status, ExamStatus::Scheduled);
    }

    #[test]
    fn test_unplace_resets_to_pending() {
        let mut exam = pending_exam();
        exam.place(
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            "R001".to_string(),
        );

        exam.unplace();

        assert_eq!(exam.status, ExamStatus::Pending);
        assert!(exam.scheduled_date.is_none());
        assert!(exam.start_time.is_none());
        assert!(exam.room_id.is_none());
    }
}
