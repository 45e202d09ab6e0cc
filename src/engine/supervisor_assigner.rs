// ==========================================
// 高校排考系统 - 监考分配引擎
// ==========================================
// 职责: 第二趟贪心,为已排期考试绑定监考教师
// 评分: 本院系亲和加分 - 负载扣分 + 随机小扰动 (打散同分教师)
// 红线: 尽力而为 -- 无可用教师的考试欠配,不视为硬失败;
//       同一教师同一考试至多出现一次
// ==========================================

use crate::config::SchedulePolicy;
use crate::domain::exam::Exam;
use crate::domain::professor::{ExamSupervisor, Professor};
use crate::domain::types::SupervisorRole;
use chrono::{NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};
use uuid::Uuid;

// ==========================================
// AssignmentStats - 监考分配计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub assigned: usize,        // 本次新建监考安排数
    pub professors_used: usize, // 承担监考的教师数 (含既有安排)
    pub avg_load: f64,          // 人均监考场次 (含既有安排)
}

// ==========================================
// SupervisorAssigner - 监考分配引擎
// ==========================================
/// 监考分配引擎
///
/// 随机源显式注入: 生产路径由操作系统熵播种,
/// 测试可用 with_seed 固定种子复现精确输出
pub struct SupervisorAssigner {
    rng: StdRng,
}

impl SupervisorAssigner {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// 以固定种子创建 (测试用)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 为批次内的已排期考试分配监考
    ///
    /// 规则 (逐场处理,顺序 = 考试传入顺序):
    /// 1) 需求人数 = max(最少监考数, 预计人数/配比 + 1)
    /// 2) 已配足的考试跳过
    /// 3) 候选过滤: 同时段已有监考 / 当日达到上限 / 已在本场 => 淘汰
    /// 4) 评分降序取前 N; 首位且本场原无监考 => 主监考
    /// 5) 提交即更新教师忙闲与负载计数
    ///
    /// # 参数
    /// - exams: 已排期考试
    /// - professors: 在职可用教师
    /// - existing: 这些考试的既有监考安排
    /// - module_depts: 课程ID -> 院系ID (亲和评分)
    /// - policy: 排考策略
    ///
    /// # 返回
    /// (新建监考安排, 计数)
    #[instrument(skip_all, fields(
        exam_count = exams.len(),
        professor_count = professors.len(),
        existing_count = existing.len()
    ))]
    pub fn assign(
        &mut self,
        exams: &[Exam],
        professors: &[Professor],
        existing: &[ExamSupervisor],
        module_depts: &HashMap<String, String>,
        policy: &SchedulePolicy,
    ) -> (Vec<ExamSupervisor>, AssignmentStats) {
        let exam_by_id: HashMap<&str, &Exam> =
            exams.iter().map(|e| (e.exam_id.as_str(), e)).collect();

        // 教师忙闲与负载 (运行态,本次运行独占)
        let mut prof_busy: HashMap<String, HashSet<(NaiveDate, NaiveTime)>> = professors
            .iter()
            .map(|p| (p.professor_id.clone(), HashSet::new()))
            .collect();
        let mut prof_load: HashMap<String, i32> = professors
            .iter()
            .map(|p| (p.professor_id.clone(), 0))
            .collect();

        // 既有监考安排预填充
        let mut assigned_per_exam: HashMap<String, HashSet<String>> = HashMap::new();
        for sup in existing {
            let Some(exam) = exam_by_id.get(sup.exam_id.as_str()) else {
                continue;
            };
            if let (Some(date), Some(time)) = (exam.scheduled_date, exam.start_time) {
                if let Some(busy) = prof_busy.get_mut(&sup.professor_id) {
                    busy.insert((date, time));
                }
            }
            if let Some(load) = prof_load.get_mut(&sup.professor_id) {
                *load += 1;
            }
            assigned_per_exam
                .entry(sup.exam_id.clone())
                .or_default()
                .insert(sup.professor_id.clone());
        }

        let mut new_assignments: Vec<ExamSupervisor> = Vec::new();

        for exam in exams {
            let (Some(date), Some(time)) = (exam.scheduled_date, exam.start_time) else {
                continue;
            };

            let required = policy
                .min_supervisors_per_exam
                .max(exam.expected_students / policy.supervisor_student_ratio + 1);

            let current = assigned_per_exam
                .get(&exam.exam_id)
                .map(|s| s.len() as i32)
                .unwrap_or(0);
            if current >= required {
                continue;
            }
            let needed = (required - current) as usize;

            let exam_dept = module_depts.get(&exam.module_id);

            // 候选过滤 + 评分
            let mut candidates: Vec<(f64, &Professor)> = Vec::new();
            for prof in professors {
                let busy = &prof_busy[&prof.professor_id];

                // 同时段冲突
                if busy.contains(&(date, time)) {
                    continue;
                }

                // 单日上限
                let day_count = busy.iter().filter(|(d, _)| *d == date).count() as i32;
                let day_limit = prof
                    .max_exams_per_day
                    .unwrap_or(policy.default_max_exams_per_day);
                if day_count >= day_limit {
                    continue;
                }

                // 同场去重
                if assigned_per_exam
                    .get(&exam.exam_id)
                    .map(|s| s.contains(&prof.professor_id))
                    .unwrap_or(false)
                {
                    continue;
                }

                let mut score = 0.0;
                if exam_dept == Some(&prof.department_id) {
                    score += policy.dept_match_bonus;
                }
                score -= f64::from(prof_load[&prof.professor_id]) * policy.load_penalty_weight;
                score += self.rng.random::<f64>();

                candidates.push((score, prof));
            }

            candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

            if candidates.len() < needed {
                debug!(
                    exam_id = %exam.exam_id,
                    needed,
                    available = candidates.len(),
                    "候选教师不足,本场欠配"
                );
            }

            for (i, (_, prof)) in candidates.iter().take(needed).enumerate() {
                let role = if i == 0 && current == 0 {
                    SupervisorRole::Responsible
                } else {
                    SupervisorRole::Supervisor
                };

                new_assignments.push(ExamSupervisor {
                    supervisor_id: Uuid::new_v4().to_string(),
                    exam_id: exam.exam_id.clone(),
                    professor_id: prof.professor_id.clone(),
                    role,
                    is_department_exam: exam_dept == Some(&prof.department_id),
                    created_at: Utc::now(),
                });

                if let Some(busy) = prof_busy.get_mut(&prof.professor_id) {
                    busy.insert((date, time));
                }
                if let Some(load) = prof_load.get_mut(&prof.professor_id) {
                    *load += 1;
                }
                assigned_per_exam
                    .entry(exam.exam_id.clone())
                    .or_default()
                    .insert(prof.professor_id.clone());
            }
        }

        let total_load: i32 = prof_load.values().sum();
        let stats = AssignmentStats {
            assigned: new_assignments.len(),
            professors_used: prof_load.values().filter(|&&l| l > 0).count(),
            avg_load: if professors.is_empty() {
                0.0
            } else {
                f64::from(total_load) / professors.len() as f64
            },
        };

        (new_assignments, stats)
    }
}

impl Default for SupervisorAssigner {
    fn default() -> Self {
        Self::new()
    }
}
