// ==========================================
// 高校排考系统 - 时段生成引擎
// ==========================================
// 职责: 枚举批次窗口内的候选 (日期, 开始时间) 时段
// 输入: 批次日期范围 + 每日开始时间 + 排除星期
// 输出: 日优先、时间次之的确定性有序序列
// 红线: 纯函数,无副作用,每次排考运行重新生成
// ==========================================

use crate::config::SchedulePolicy;
use crate::domain::exam::ExamSession;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ExamSlot - 候选时段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExamSlot {
    pub slot_date: NaiveDate,  // 日期
    pub start_time: NaiveTime, // 开始时间
}

// ==========================================
// SlotGenerator - 时段生成引擎
// ==========================================
pub struct SlotGenerator;

impl SlotGenerator {
    /// 生成批次窗口内的全部候选时段
    ///
    /// 规则:
    /// 1) 从 start_date 到 end_date 逐日推进 (闭区间)
    /// 2) 命中排除星期 (ISO 编号) 的日期整天跳过
    /// 3) 同一天内按策略配置的开始时间升序展开
    ///
    /// # 返回
    /// 日优先、时间次之的有序时段序列; 窗口为空或全被排除时返回空序列
    pub fn generate(session: &ExamSession, policy: &SchedulePolicy) -> Vec<ExamSlot> {
        let mut slots = Vec::new();

        let mut date_cursor = session.start_date;
        while date_cursor <= session.end_date {
            if !policy
                .excluded_weekdays
                .contains(&date_cursor.weekday().number_from_monday())
            {
                for &start_time in &policy.slot_times {
                    slots.push(ExamSlot {
                        slot_date: date_cursor,
                        start_time,
                    });
                }
            }
            date_cursor += Duration::days(1);
        }

        slots
    }
}
