// ==========================================
// 高校排考系统 - 内存索引构建
// ==========================================
// 职责: 少量批量读取后,构建本次运行所需的全部查找结构
// 红线: 索引归单次运行独占,引擎逐场提交时原地更新;
//       运行期间不再访问持久层
// ==========================================

use crate::domain::exam::Exam;
use crate::domain::module::Enrollment;
use crate::domain::room::ExamRoom;
use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};

// ==========================================
// ScheduleIndexes - 排考运行索引
// ==========================================
/// 一次排考运行的内存索引
///
/// 包含:
/// - module_students: 课程ID -> 学生集合
/// - rooms_by_capacity: 可用考场按容量升序 (含计算机/实验室子池)
/// - students_per_day: 日期 -> 当日已有考试的学生集合
/// - rooms_busy_at_slot: (日期, 开始时间) -> 已占用考场集合
///
/// 忙闲两表由已排期考试预填充,因此部分排期的批次可以续排,
/// 不需要先清除既有结果。
#[derive(Debug, Clone)]
pub struct ScheduleIndexes {
    pub module_students: HashMap<String, HashSet<String>>,
    pub rooms_by_capacity: Vec<ExamRoom>,
    pub computer_rooms: Vec<ExamRoom>,
    pub lab_rooms: Vec<ExamRoom>,
    pub students_per_day: HashMap<NaiveDate, HashSet<String>>,
    pub rooms_busy_at_slot: HashMap<(NaiveDate, NaiveTime), HashSet<String>>,
}

impl ScheduleIndexes {
    /// 构建内存索引
    ///
    /// # 参数
    /// - enrollments: 全部选课记录
    /// - rooms: 可用考场 (要求已按 exam_capacity 升序)
    /// - existing_exams: 批次内已排期考试 (预填充忙闲索引)
    pub fn build(
        enrollments: &[Enrollment],
        rooms: Vec<ExamRoom>,
        existing_exams: &[Exam],
    ) -> Self {
        // 1. 课程 -> 学生集合
        let mut module_students: HashMap<String, HashSet<String>> = HashMap::new();
        for enrollment in enrollments {
            module_students
                .entry(enrollment.module_id.clone())
                .or_default()
                .insert(enrollment.student_id.clone());
        }

        // 2. 考场池 (容量升序为先决条件,此处不重排,只做防御性校验)
        debug_assert!(
            rooms.windows(2).all(|w| w[0].exam_capacity <= w[1].exam_capacity),
            "考场列表必须按 exam_capacity 升序"
        );
        let computer_rooms: Vec<ExamRoom> =
            rooms.iter().filter(|r| r.has_computers).cloned().collect();
        let lab_rooms: Vec<ExamRoom> = rooms
            .iter()
            .filter(|r| r.room_type == crate::domain::types::RoomType::Lab)
            .cloned()
            .collect();

        // 3. 忙闲索引预填充 (幂等续排的关键)
        let mut students_per_day: HashMap<NaiveDate, HashSet<String>> = HashMap::new();
        let mut rooms_busy_at_slot: HashMap<(NaiveDate, NaiveTime), HashSet<String>> =
            HashMap::new();

        for exam in existing_exams {
            let Some(date) = exam.scheduled_date else {
                continue;
            };
            if let Some(students) = module_students.get(&exam.module_id) {
                students_per_day
                    .entry(date)
                    .or_default()
                    .extend(students.iter().cloned());
            }
            if let (Some(time), Some(room_id)) = (exam.start_time, exam.room_id.as_ref()) {
                rooms_busy_at_slot
                    .entry((date, time))
                    .or_default()
                    .insert(room_id.clone());
            }
        }

        Self {
            module_students,
            rooms_by_capacity: rooms,
            computer_rooms,
            lab_rooms,
            students_per_day,
            rooms_busy_at_slot,
        }
    }

    /// 解析考试的有效人数
    ///
    /// 规则: 学生集合非空取集合大小;
    /// 否则回退到考试存储的预计人数; 仍无效时用配置兜底值
    /// (处理无选课记录的课程)
    pub fn resolve_student_count(&self, exam: &Exam, fallback: i32) -> i32 {
        let tracked = self
            .module_students
            .get(&exam.module_id)
            .map(|s| s.len() as i32)
            .unwrap_or(0);

        if tracked > 0 {
            tracked
        } else if exam.expected_students > 0 {
            exam.expected_students
        } else {
            fallback
        }
    }

    /// 判断考试的学生当日是否已有考试 (日粒度规则)
    ///
    /// 说明: 学生一天只考一场,即使钟点不重叠也算冲突
    pub fn students_busy_on(&self, exam: &Exam, date: NaiveDate) -> bool {
        let Some(students) = self.module_students.get(&exam.module_id) else {
            return false;
        };
        let Some(busy) = self.students_per_day.get(&date) else {
            return false;
        };
        !students.is_disjoint(busy)
    }

    /// 判断考场在指定时段是否已被占用
    pub fn room_busy_at(&self, date: NaiveDate, time: NaiveTime, room_id: &str) -> bool {
        self.rooms_busy_at_slot
            .get(&(date, time))
            .map(|busy| busy.contains(room_id))
            .unwrap_or(false)
    }

    /// 选择考试的候选考场池 (引用,保持容量升序)
    ///
    /// 规则:
    /// - 需要实验室 => 实验室池
    /// - 需要计算机 => 计算机池
    /// - 其余 => 全量池
    /// 再按容量过滤
    pub fn candidate_rooms(&self, exam: &Exam, student_count: i32) -> Vec<&ExamRoom> {
        let pool = if exam.requires_lab {
            &self.lab_rooms
        } else if exam.requires_computer {
            &self.computer_rooms
        } else {
            &self.rooms_by_capacity
        };

        pool.iter()
            .filter(|r| r.exam_capacity >= student_count)
            .collect()
    }

    /// 提交一次落位: 更新忙闲索引
    ///
    /// 说明: 与考试实体的字段写入配套调用,二者共同构成一次"提交"
    pub fn commit_assignment(
        &mut self,
        exam: &Exam,
        date: NaiveDate,
        time: NaiveTime,
        room_id: &str,
    ) {
        if let Some(students) = self.module_students.get(&exam.module_id) {
            self.students_per_day
                .entry(date)
                .or_default()
                .extend(students.iter().cloned());
        }
        self.rooms_busy_at_slot
            .entry((date, time))
            .or_default()
            .insert(room_id.to_string());
    }
}
