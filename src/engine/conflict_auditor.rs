// ==========================================
// 高校排考系统 - 冲突审计引擎
// ==========================================
// 职责: 对最终排期做穷举两两检查,暴露残余违规
// 覆盖: 容量 / 考场重叠 / 监考重叠 / 学生重叠 四类
// 红线: 只读,不修改任何状态; 独立于排考过程按需运行,
//       人工改动引入的违规同样会被捕获
// ==========================================

use crate::config::SchedulePolicy;
use crate::domain::conflict::{ConflictRecord, ScheduledExamView, SupervisionView};
use crate::domain::module::Enrollment;
use crate::domain::types::{ConflictSeverity, ConflictType};
use chrono::NaiveTime;
use std::collections::HashMap;
use tracing::instrument;

// ==========================================
// ConflictAuditor - 冲突审计引擎
// ==========================================
pub struct ConflictAuditor {
    // 无状态引擎，不需要注入依赖
}

impl ConflictAuditor {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行完整审计
    ///
    /// # 参数
    /// - exams: 已排期考试视图 (含课程名/考场名/容量)
    /// - supervisions: 监考安排视图 (含教师名/考试时间)
    /// - enrollments: 全部选课记录
    /// - policy: 排考策略 (学生冲突报告上限)
    ///
    /// # 返回
    /// 冲突记录列表; 空列表表示未发现违规
    #[instrument(skip_all, fields(
        exam_count = exams.len(),
        supervision_count = supervisions.len()
    ))]
    pub fn audit(
        &self,
        exams: &[ScheduledExamView],
        supervisions: &[SupervisionView],
        enrollments: &[Enrollment],
        policy: &SchedulePolicy,
    ) -> Vec<ConflictRecord> {
        let mut conflicts = Vec::new();

        self.check_capacity(exams, &mut conflicts);
        self.check_room_overlaps(exams, &mut conflicts);
        self.check_professor_overlaps(supervisions, &mut conflicts);
        self.check_student_overlaps(exams, enrollments, policy, &mut conflicts);

        conflicts
    }

    // ===== 容量检查 =====

    fn check_capacity(&self, exams: &[ScheduledExamView], conflicts: &mut Vec<ConflictRecord>) {
        for exam in exams {
            if exam.expected_students > exam.room_capacity {
                conflicts.push(ConflictRecord {
                    conflict_type: ConflictType::Capacity,
                    severity: ConflictSeverity::High,
                    subject: exam.room_name.clone(),
                    detail: format!(
                        "考试 {} ({} 人) 超出考场容量 ({} 座)",
                        exam.module_name, exam.expected_students, exam.room_capacity
                    ),
                });
            }
        }
    }

    // ===== 考场重叠检查 =====

    fn check_room_overlaps(&self, exams: &[ScheduledExamView], conflicts: &mut Vec<ConflictRecord>) {
        for (i, e1) in exams.iter().enumerate() {
            for e2 in exams.iter().skip(i + 1) {
                if e1.room_id.is_none() || e1.room_id != e2.room_id {
                    continue;
                }
                if e1.scheduled_date != e2.scheduled_date {
                    continue;
                }
                if times_overlap(
                    e1.start_time,
                    e1.duration_minutes,
                    e2.start_time,
                    e2.duration_minutes,
                ) {
                    conflicts.push(ConflictRecord {
                        conflict_type: ConflictType::RoomOverlap,
                        severity: ConflictSeverity::Critical,
                        subject: e1.room_name.clone(),
                        detail: format!(
                            "{} 与 {} 在 {} 时段重叠",
                            e1.module_name,
                            e2.module_name,
                            e1.start_time
                                .map(|t| t.to_string())
                                .unwrap_or_else(|| "?".to_string())
                        ),
                    });
                }
            }
        }
    }

    // ===== 监考重叠检查 =====

    fn check_professor_overlaps(
        &self,
        supervisions: &[SupervisionView],
        conflicts: &mut Vec<ConflictRecord>,
    ) {
        for (i, s1) in supervisions.iter().enumerate() {
            for s2 in supervisions.iter().skip(i + 1) {
                if s1.professor_id != s2.professor_id {
                    continue;
                }
                if s1.scheduled_date != s2.scheduled_date || s1.scheduled_date.is_none() {
                    continue;
                }
                if times_overlap(
                    s1.start_time,
                    s1.duration_minutes,
                    s2.start_time,
                    s2.duration_minutes,
                ) {
                    conflicts.push(ConflictRecord {
                        conflict_type: ConflictType::ProfessorOverlap,
                        severity: ConflictSeverity::Critical,
                        subject: s1.professor_name.clone(),
                        detail: format!(
                            "同时被安排监考 {} 与 {}",
                            s1.module_name, s2.module_name
                        ),
                    });
                }
            }
        }
    }

    // ===== 学生重叠检查 =====

    /// 学生两两检查
    ///
    /// 成本控制: 只报告前 N 名命中的学生 (N = 策略配置),
    /// 且每名学生只报告首个命中的考试对
    fn check_student_overlaps(
        &self,
        exams: &[ScheduledExamView],
        enrollments: &[Enrollment],
        policy: &SchedulePolicy,
        conflicts: &mut Vec<ConflictRecord>,
    ) {
        // 课程 -> 考试时间
        let module_timing: HashMap<&str, &ScheduledExamView> = exams
            .iter()
            .map(|e| (e.module_id.as_str(), e))
            .collect();

        // 学号 -> 本批次内的考试列表 (保持选课记录顺序,结果可复现)
        let mut student_exams: HashMap<&str, Vec<&ScheduledExamView>> = HashMap::new();
        let mut student_order: Vec<&str> = Vec::new();
        for enrollment in enrollments {
            if let Some(view) = module_timing.get(enrollment.module_id.as_str()) {
                let entry = student_exams
                    .entry(enrollment.student_id.as_str())
                    .or_insert_with(|| {
                        student_order.push(enrollment.student_id.as_str());
                        Vec::new()
                    });
                entry.push(view);
            }
        }

        let mut reported = 0usize;
        for student_id in student_order {
            if reported >= policy.student_conflict_report_cap {
                break;
            }
            let busy_list = &student_exams[student_id];
            if busy_list.len() < 2 {
                continue;
            }

            'pair_scan: for (i, t1) in busy_list.iter().enumerate() {
                for t2 in busy_list.iter().skip(i + 1) {
                    if t1.scheduled_date != t2.scheduled_date || t1.scheduled_date.is_none() {
                        continue;
                    }
                    if times_overlap(
                        t1.start_time,
                        t1.duration_minutes,
                        t2.start_time,
                        t2.duration_minutes,
                    ) {
                        conflicts.push(ConflictRecord {
                            conflict_type: ConflictType::StudentOverlap,
                            severity: ConflictSeverity::Critical,
                            subject: student_id.to_string(),
                            detail: format!(
                                "同日重考: {} 与 {} ({})",
                                t1.module_name,
                                t2.module_name,
                                t1.scheduled_date
                                    .map(|d| d.to_string())
                                    .unwrap_or_else(|| "?".to_string())
                            ),
                        });
                        reported += 1;
                        break 'pair_scan;
                    }
                }
            }
        }
    }
}

impl Default for ConflictAuditor {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 时间重叠判定
// ==========================================

/// 判定两个半开区间 [s1, s1+d1) 与 [s2, s2+d2) 是否重叠 (分钟精度)
///
/// 约定: 任一开始时间缺失视为"不可能重叠"
pub fn times_overlap(
    start1: Option<NaiveTime>,
    dur1: i32,
    start2: Option<NaiveTime>,
    dur2: i32,
) -> bool {
    let (Some(s1), Some(s2)) = (start1, start2) else {
        return false;
    };

    let m1 = minutes_of_day(s1);
    let m2 = minutes_of_day(s2);
    m1.max(m2) < (m1 + dur1).min(m2 + dur2)
}

fn minutes_of_day(t: NaiveTime) -> i32 {
    use chrono::Timelike;
    (t.hour() * 60 + t.minute()) as i32
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn time(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    fn create_exam_view(
        exam_id: &str,
        module_id: &str,
        room_id: &str,
        day: u32,
        start: Option<NaiveTime>,
        duration: i32,
        expected: i32,
        capacity: i32,
    ) -> ScheduledExamView {
        ScheduledExamView {
            exam_id: exam_id.to_string(),
            module_id: module_id.to_string(),
            module_name: format!("课程{}", module_id),
            room_id: Some(room_id.to_string()),
            room_name: format!("考场{}", room_id),
            room_capacity: capacity,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 1, day),
            start_time: start,
            duration_minutes: duration,
            expected_students: expected,
        }
    }

    fn create_supervision(
        professor_id: &str,
        module_name: &str,
        day: u32,
        start: Option<NaiveTime>,
        duration: i32,
    ) -> SupervisionView {
        SupervisionView {
            professor_id: professor_id.to_string(),
            professor_name: format!("教师{}", professor_id),
            module_name: module_name.to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 1, day),
            start_time: start,
            duration_minutes: duration,
        }
    }

    // ==========================================
    // 重叠判定
    // ==========================================

    #[test]
    fn test_times_overlap_predicate() {
        // [8:30, 10:30) 与 [10:00, 12:00) 重叠
        assert!(times_overlap(time(8, 30), 120, time(10, 0), 120));
        // [8:30, 10:30) 与 [10:30, 12:30) 相邻不重叠 (半开区间)
        assert!(!times_overlap(time(8, 30), 120, time(10, 30), 120));
        // 完全包含
        assert!(times_overlap(time(9, 0), 60, time(8, 30), 180));
        // 开始时间缺失视为不可能重叠
        assert!(!times_overlap(None, 120, time(8, 30), 120));
        assert!(!times_overlap(time(8, 30), 120, None, 120));
    }

    // ==========================================
    // 四类冲突
    // ==========================================

    #[test]
    fn test_capacity_conflict() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 40, 30)];

        let conflicts = auditor.audit(&exams, &[], &[], &policy);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Capacity);
        assert_eq!(conflicts[0].severity, ConflictSeverity::High);
        assert_eq!(conflicts[0].subject, "考场R1");
    }

    #[test]
    fn test_room_overlap_conflict() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 10, 30),
            create_exam_view("E2", "M2", "R1", 20, time(9, 0), 120, 10, 30),
        ];

        let conflicts = auditor.audit(&exams, &[], &[], &policy);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::RoomOverlap);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Critical);
    }

    #[test]
    fn test_room_same_day_disjoint_times_no_conflict() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 10, 30),
            create_exam_view("E2", "M2", "R1", 20, time(11, 0), 120, 10, 30),
        ];

        assert!(auditor.audit(&exams, &[], &[], &policy).is_empty());
    }

    #[test]
    fn test_professor_overlap_conflict() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let supervisions = vec![
            create_supervision("P1", "课程M1", 20, time(8, 30), 120),
            create_supervision("P1", "课程M2", 20, time(9, 0), 120),
            // 不同教师不冲突
            create_supervision("P2", "课程M3", 20, time(8, 30), 120),
        ];

        let conflicts = auditor.audit(&[], &supervisions, &[], &policy);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::ProfessorOverlap);
        assert_eq!(conflicts[0].subject, "教师P1");
    }

    #[test]
    fn test_student_overlap_conflict() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 10, 30),
            create_exam_view("E2", "M2", "R2", 20, time(9, 0), 120, 10, 30),
        ];
        let enrollments = vec![
            Enrollment {
                student_id: "st1".to_string(),
                module_id: "M1".to_string(),
            },
            Enrollment {
                student_id: "st1".to_string(),
                module_id: "M2".to_string(),
            },
        ];

        let conflicts = auditor.audit(&exams, &[], &enrollments, &policy);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::StudentOverlap);
        assert_eq!(conflicts[0].subject, "st1");
    }

    #[test]
    fn test_student_overlap_cap() {
        let auditor = ConflictAuditor::new();
        let mut policy = SchedulePolicy::default();
        policy.student_conflict_report_cap = 3;

        // 两场时间重叠的考试,10 名学生全部同时选两门
        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 10, 30),
            create_exam_view("E2", "M2", "R2", 20, time(9, 0), 120, 10, 30),
        ];
        let mut enrollments = Vec::new();
        for i in 0..10 {
            for module in ["M1", "M2"] {
                enrollments.push(Enrollment {
                    student_id: format!("st{}", i),
                    module_id: module.to_string(),
                });
            }
        }

        let conflicts = auditor.audit(&exams, &[], &enrollments, &policy);

        let student_conflicts = conflicts
            .iter()
            .filter(|c| c.conflict_type == ConflictType::StudentOverlap)
            .count();
        assert_eq!(student_conflicts, 3);
    }

    #[test]
    fn test_missing_start_time_cannot_overlap() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, None, 120, 10, 30),
            create_exam_view("E2", "M2", "R1", 20, time(8, 30), 120, 10, 30),
        ];

        assert!(auditor.audit(&exams, &[], &[], &policy).is_empty());
    }

    #[test]
    fn test_clean_schedule_yields_no_conflicts() {
        let auditor = ConflictAuditor::new();
        let policy = SchedulePolicy::default();

        let exams = vec![
            create_exam_view("E1", "M1", "R1", 20, time(8, 30), 120, 10, 30),
            create_exam_view("E2", "M2", "R1", 21, time(8, 30), 120, 10, 30),
            create_exam_view("E3", "M3", "R2", 20, time(8, 30), 120, 20, 60),
        ];
        let supervisions = vec![
            create_supervision("P1", "课程M1", 20, time(8, 30), 120),
            create_supervision("P1", "课程M2", 21, time(8, 30), 120),
        ];
        let enrollments = vec![
            Enrollment {
                student_id: "st1".to_string(),
                module_id: "M1".to_string(),
            },
            Enrollment {
                student_id: "st1".to_string(),
                module_id: "M2".to_string(),
            },
        ];

        assert!(auditor
            .audit(&exams, &supervisions, &enrollments, &policy)
            .is_empty());
    }
}
