// ==========================================
// 高校排考系统 - 排考配置读取 Trait
// ==========================================
// 职责: 定义排考引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::SchedulePolicy;
use async_trait::async_trait;
use chrono::NaiveTime;
use std::error::Error;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 用途: 排考引擎所需的策略常量读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait(?Send)]
pub trait ScheduleConfigReader: Send + Sync {
    // ===== 时段配置 =====

    /// 获取每日考试开始时间列表
    ///
    /// # 返回
    /// - Vec<NaiveTime>: 按时间升序的开始时间
    ///
    /// # 默认值
    /// - [08:30, 11:00, 13:30, 16:00]
    async fn get_slot_times(&self) -> Result<Vec<NaiveTime>, Box<dyn Error>>;

    /// 获取排考排除的星期列表（ISO 编号, 1=周一 .. 7=周日）
    ///
    /// # 默认值
    /// - [5] (周五不排考)
    async fn get_excluded_weekdays(&self) -> Result<Vec<u32>, Box<dyn Error>>;

    // ===== 监考配置 =====

    /// 获取监考配比（每 N 名学生配置 1 名监考）
    ///
    /// # 默认值
    /// - 25
    async fn get_supervisor_student_ratio(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取每场考试的最少监考人数
    ///
    /// # 默认值
    /// - 2
    async fn get_min_supervisors_per_exam(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取教师单日监考上限的默认值（教师未单独设置时生效）
    ///
    /// # 默认值
    /// - 3
    async fn get_default_max_exams_per_day(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取本院系考试的亲和加分
    ///
    /// # 默认值
    /// - 20.0
    async fn get_dept_match_bonus(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取负载均衡的扣分权重（每承担 1 场监考扣 N 分）
    ///
    /// # 默认值
    /// - 5.0
    async fn get_load_penalty_weight(&self) -> Result<f64, Box<dyn Error>>;

    // ===== 排期配置 =====

    /// 获取无选课记录课程的预计人数兜底值
    ///
    /// # 默认值
    /// - 50
    ///
    /// # 用途
    /// - 课程的学生集合为空且考试未存快照人数时,按此值挑选考场
    async fn get_fallback_expected_students(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 审计配置 =====

    /// 获取学生冲突报告的人数上限（成本控制）
    ///
    /// # 默认值
    /// - 50
    ///
    /// # 用途
    /// - 学生两两检查只报告前 N 名命中的学生,超出部分截断
    async fn get_student_conflict_report_cap(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 聚合 =====

    /// 读取全部策略常量,装配为一次运行所用的策略值对象
    ///
    /// # 说明
    /// - 每次排考运行装配一次,之后按引用传入各引擎,运行期不再读库
    async fn load_schedule_policy(&self) -> Result<SchedulePolicy, Box<dyn Error>> {
        Ok(SchedulePolicy {
            slot_times: self.get_slot_times().await?,
            excluded_weekdays: self.get_excluded_weekdays().await?,
            supervisor_student_ratio: self.get_supervisor_student_ratio().await?,
            min_supervisors_per_exam: self.get_min_supervisors_per_exam().await?,
            default_max_exams_per_day: self.get_default_max_exams_per_day().await?,
            dept_match_bonus: self.get_dept_match_bonus().await?,
            load_penalty_weight: self.get_load_penalty_weight().await?,
            fallback_expected_students: self.get_fallback_expected_students().await?,
            student_conflict_report_cap: self.get_student_conflict_report_cap().await?,
        })
    }
}
