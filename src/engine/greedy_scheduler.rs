// ==========================================
// 高校排考系统 - 贪心排考引擎
// ==========================================
// 职责: 按"先难后易"序为每场待排考试寻找首个可行 (时段, 考场)
// 红线: 首次命中即提交,不回溯,不回滚已提交结果;
//       单场失败只计数,不中断批次
// ==========================================
// 输入: 待排考试 + 候选时段序列 + 内存索引
// 输出: 落位后的考试实体 + {total, scheduled, failed} 计数
// ==========================================

use crate::config::SchedulePolicy;
use crate::domain::exam::Exam;
use crate::engine::indexes::ScheduleIndexes;
use crate::engine::slot_generator::ExamSlot;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ==========================================
// ScheduleRunStats - 批量排期计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScheduleRunStats {
    pub total: usize,     // 本次处理的待排考试数
    pub scheduled: usize, // 成功落位数
    pub failed: usize,    // 无可行组合数 (保持 pending)
}

// ==========================================
// SlotCandidate - 候选落位
// ==========================================
// 批量排期取首个候选提交; 交互查询返回前 N 个候选供人工选择
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub room_id: String,
    pub room_name: String,
    pub room_capacity: i32,
    pub score: i32,
}

// ==========================================
// GreedyScheduler - 贪心排考引擎
// ==========================================
pub struct GreedyScheduler {
    // 无状态引擎，不需要注入依赖
}

impl GreedyScheduler {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 批量排期（单次运行的主循环）
    ///
    /// 规则:
    /// 1) 处理顺序固定: 预计人数降序、exam_id 升序 (先难后易,可复现)
    /// 2) 逐场扫描时段序列,取首个可行 (时段, 考场) 提交
    /// 3) 提交即更新忙闲索引,后续考试在新约束下继续
    /// 4) 候选池为空或整个窗口无可行组合时计为 failed,保持 pending
    ///
    /// # 参数
    /// - pending_exams: 待排考试 (就地写入落位结果)
    /// - slots: 候选时段序列 (日优先、时间次之)
    /// - indexes: 内存索引 (会被修改)
    /// - policy: 排考策略
    #[instrument(skip(self, pending_exams, slots, indexes, policy), fields(
        pending_count = pending_exams.len(),
        slot_count = slots.len()
    ))]
    pub fn schedule_batch(
        &self,
        pending_exams: &mut [Exam],
        slots: &[ExamSlot],
        indexes: &mut ScheduleIndexes,
        policy: &SchedulePolicy,
    ) -> ScheduleRunStats {
        // 处理顺序防御性重排: 仓储层已按此序返回,
        // 但纯内存调用方 (测试/交互) 不一定
        pending_exams.sort_by(|a, b| {
            b.expected_students
                .cmp(&a.expected_students)
                .then_with(|| a.exam_id.cmp(&b.exam_id))
        });

        let mut stats = ScheduleRunStats {
            total: pending_exams.len(),
            ..Default::default()
        };

        for exam in pending_exams.iter_mut() {
            let candidates = self.find_candidate_slots(exam, slots, indexes, policy, 1);

            match candidates.first() {
                Some(hit) => {
                    exam.place(hit.slot_date, hit.start_time, hit.room_id.clone());
                    indexes.commit_assignment(exam, hit.slot_date, hit.start_time, &hit.room_id);
                    stats.scheduled += 1;
                }
                None => {
                    debug!(exam_id = %exam.exam_id, "无可行时段,保持 pending");
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// 扫描单场考试的候选落位（批量与交互查询共用）
    ///
    /// 规则:
    /// 1) 候选考场池: 实验室/计算机/全量三选一,容量过滤,容量升序
    /// 2) 该考试任一学生当日已有考试 => 整天跳过 (日粒度规则)
    /// 3) 同一时段内按池序取未被占用的考场
    /// 4) score = 100 - 已发现候选数,越靠前越优
    ///
    /// # 返回
    /// 至多 limit 个候选,按发现顺序; 池为空时返回空列表
    pub fn find_candidate_slots(
        &self,
        exam: &Exam,
        slots: &[ExamSlot],
        indexes: &ScheduleIndexes,
        policy: &SchedulePolicy,
        limit: usize,
    ) -> Vec<SlotCandidate> {
        let mut candidates = Vec::new();
        if limit == 0 {
            return candidates;
        }

        let student_count = indexes.resolve_student_count(exam, policy.fallback_expected_students);
        let pool = indexes.candidate_rooms(exam, student_count);
        if pool.is_empty() {
            return candidates;
        }

        let mut skip_date: Option<NaiveDate> = None;
        for slot in slots {
            // 同一天只判一次学生忙闲
            if skip_date == Some(slot.slot_date) {
                continue;
            }
            if indexes.students_busy_on(exam, slot.slot_date) {
                skip_date = Some(slot.slot_date);
                continue;
            }

            for room in &pool {
                if indexes.room_busy_at(slot.slot_date, slot.start_time, &room.room_id) {
                    continue;
                }

                candidates.push(SlotCandidate {
                    slot_date: slot.slot_date,
                    start_time: slot.start_time,
                    room_id: room.room_id.clone(),
                    room_name: room.name.clone(),
                    room_capacity: room.exam_capacity,
                    score: 100 - candidates.len() as i32,
                });

                if candidates.len() >= limit {
                    return candidates;
                }
            }
        }

        candidates
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::ExamSession;
    use crate::domain::module::Enrollment;
    use crate::domain::room::ExamRoom;
    use crate::domain::types::{ExamStatus, RoomType, SessionType};
    use crate::engine::slot_generator::SlotGenerator;
    use chrono::{NaiveDate, Utc};

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_session() -> ExamSession {
        // 周二 + 周三,不含默认排除的周五
        ExamSession {
            session_id: "S001".to_string(),
            name: "期末考试".to_string(),
            session_type: SessionType::Normal,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 21).unwrap(),
            academic_year: "2025-2026".to_string(),
        }
    }

    fn create_test_room(room_id: &str, capacity: i32) -> ExamRoom {
        ExamRoom {
            room_id: room_id.to_string(),
            name: format!("考场{}", room_id),
            room_type: RoomType::Classroom,
            exam_capacity: capacity,
            has_computers: false,
            is_available: true,
            is_active: true,
        }
    }

    fn create_test_exam(exam_id: &str, module_id: &str, expected: i32) -> Exam {
        Exam {
            exam_id: exam_id.to_string(),
            module_id: module_id.to_string(),
            session_id: "S001".to_string(),
            room_id: None,
            scheduled_date: None,
            start_time: None,
            duration_minutes: 120,
            status: ExamStatus::Pending,
            expected_students: expected,
            requires_computer: false,
            requires_lab: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn enrollments(module_id: &str, students: &[&str]) -> Vec<Enrollment> {
        students
            .iter()
            .map(|s| Enrollment {
                student_id: s.to_string(),
                module_id: module_id.to_string(),
            })
            .collect()
    }

    // ==========================================
    // 场景测试
    // ==========================================

    #[test]
    fn test_two_exams_one_room_no_shared_students() {
        // 场景: 2 天窗口, 1 间容量 30 考场, 两场各 10 人且无共同学生
        // 期望: 两场都排上,同一考场,不同 (日期,时段)
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let mut all_enrollments = enrollments("M001", &["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10"]);
        all_enrollments.extend(enrollments("M002", &["b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9", "b10"]));

        let rooms = vec![create_test_room("R001", 30)];
        let mut indexes = ScheduleIndexes::build(&all_enrollments, rooms, &[]);

        let mut exams = vec![
            create_test_exam("E001", "M001", 10),
            create_test_exam("E002", "M002", 10),
        ];

        let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.failed, 0);

        assert!(exams.iter().all(|e| e.status == ExamStatus::Scheduled));
        assert!(exams.iter().all(|e| e.room_id.as_deref() == Some("R001")));
        // 同一考场必须处于不同时段
        let slot_a = (exams[0].scheduled_date, exams[0].start_time);
        let slot_b = (exams[1].scheduled_date, exams[1].start_time);
        assert_ne!(slot_a, slot_b);
    }

    #[test]
    fn test_shared_students_forced_to_different_days() {
        // 场景: 两场考试共享全部 10 名学生
        // 期望: 日粒度规则生效,两场落在不同日期 (即使当日仍有空时段)
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let students = ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10"];
        let mut all_enrollments = enrollments("M001", &students);
        all_enrollments.extend(enrollments("M002", &students));

        let rooms = vec![create_test_room("R001", 30)];
        let mut indexes = ScheduleIndexes::build(&all_enrollments, rooms, &[]);

        let mut exams = vec![
            create_test_exam("E001", "M001", 10),
            create_test_exam("E002", "M002", 10),
        ];

        let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);

        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.failed, 0);
        assert_ne!(exams[0].scheduled_date, exams[1].scheduled_date);
    }

    #[test]
    fn test_oversized_exam_fails_not_forced() {
        // 场景: 唯一考场容量 20,考试预计 25 人
        // 期望: failed=1,考试保持 pending,不强行落位
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let rooms = vec![create_test_room("R001", 20)];
        let mut indexes = ScheduleIndexes::build(&[], rooms, &[]);

        let mut exams = vec![create_test_exam("E001", "M001", 25)];

        let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.scheduled, 0);
        assert_eq!(exams[0].status, ExamStatus::Pending);
        assert!(exams[0].room_id.is_none());
    }

    #[test]
    fn test_zero_rooms_all_fail() {
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let mut indexes = ScheduleIndexes::build(&[], vec![], &[]);
        let mut exams = vec![
            create_test_exam("E001", "M001", 10),
            create_test_exam("E002", "M002", 10),
        ];

        let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);

        assert_eq!(stats.failed, stats.total);
    }

    #[test]
    fn test_hardest_first_order() {
        // 大考试先排: 仅有的大考场必须留给 50 人考试
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let rooms = vec![create_test_room("R001", 30), create_test_room("R002", 60)];
        let mut indexes = ScheduleIndexes::build(&[], rooms, &[]);

        // 故意按"小考试在前"的顺序传入
        let mut exams = vec![
            create_test_exam("E001", "M001", 10),
            create_test_exam("E002", "M002", 50),
        ];

        let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);

        assert_eq!(stats.scheduled, 2);
        // 重排后 E002 在前
        assert_eq!(exams[0].exam_id, "E002");
        // 小考试落在最小可容纳考场,大考场留给大考试
        let small = exams.iter().find(|e| e.exam_id == "E001").unwrap();
        let large = exams.iter().find(|e| e.exam_id == "E002").unwrap();
        assert_eq!(small.room_id.as_deref(), Some("R001"));
        assert_eq!(large.room_id.as_deref(), Some("R002"));
    }

    #[test]
    fn test_determinism_two_identical_runs() {
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let mut all_enrollments = enrollments("M001", &["a1", "a2"]);
        all_enrollments.extend(enrollments("M002", &["b1", "b2"]));
        all_enrollments.extend(enrollments("M003", &["c1", "c2"]));

        let rooms = vec![create_test_room("R001", 30), create_test_room("R002", 40)];

        let run = |exam_order: Vec<&str>| {
            let mut indexes =
                ScheduleIndexes::build(&all_enrollments, rooms.clone(), &[]);
            let mut exams: Vec<Exam> = exam_order
                .iter()
                .enumerate()
                .map(|(i, id)| create_test_exam(id, &format!("M00{}", i + 1), 2))
                .collect();
            let stats = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);
            assert_eq!(stats.failed, 0);
            exams.sort_by(|a, b| a.exam_id.cmp(&b.exam_id));
            exams
                .iter()
                .map(|e| (e.exam_id.clone(), e.scheduled_date, e.start_time, e.room_id.clone()))
                .collect::<Vec<_>>()
        };

        let first = run(vec!["E001", "E002", "E003"]);
        let second = run(vec!["E001", "E002", "E003"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rerun_on_scheduled_session_is_noop() {
        // 已全部排完的批次再跑一次: 待排列表为空,计数全 0
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let rooms = vec![create_test_room("R001", 30)];
        let mut indexes = ScheduleIndexes::build(&[], rooms, &[]);

        let mut exams = vec![create_test_exam("E001", "M001", 10)];
        let first = scheduler.schedule_batch(&mut exams, &slots, &mut indexes, &policy);
        assert_eq!(first.scheduled, 1);

        // 第二次运行时不再有 pending 考试
        let mut empty: Vec<Exam> = vec![];
        let second = scheduler.schedule_batch(&mut empty, &slots, &mut indexes, &policy);
        assert_eq!(second.total, 0);
        assert_eq!(second.scheduled, 0);
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn test_find_candidate_slots_respects_limit_and_score() {
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let rooms = vec![create_test_room("R001", 30), create_test_room("R002", 40)];
        let indexes = ScheduleIndexes::build(&[], rooms, &[]);

        let exam = create_test_exam("E001", "M001", 10);
        let candidates = scheduler.find_candidate_slots(&exam, &slots, &indexes, &policy, 5);

        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].score, 100);
        assert_eq!(candidates[4].score, 96);
        // 同一时段内按容量升序给出考场
        assert_eq!(candidates[0].room_id, "R001");
        assert_eq!(candidates[1].room_id, "R002");
    }

    #[test]
    fn test_find_candidate_slots_skips_busy_room() {
        let scheduler = GreedyScheduler::new();
        let policy = SchedulePolicy::default();
        let session = create_test_session();
        let slots = SlotGenerator::generate(&session, &policy);

        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let time = policy.slot_times[0];

        let mut occupied = create_test_exam("E000", "M000", 5);
        occupied.place(date, time, "R001".to_string());

        let rooms = vec![create_test_room("R001", 30)];
        let indexes = ScheduleIndexes::build(&[], rooms, &[occupied]);

        let exam = create_test_exam("E001", "M001", 10);
        let candidates = scheduler.find_candidate_slots(&exam, &slots, &indexes, &policy, 1);

        // 首时段被占,应落到第二时段
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].slot_date, date);
        assert_eq!(candidates[0].start_time, policy.slot_times[1]);
    }
}
