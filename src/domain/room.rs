// ==========================================
// 高校排考系统 - 考场领域模型
// ==========================================
// 红线: 同一 (考场, 日期, 开始时间) 至多承载一场考试,
//       该不变量由排考引擎维护,不由考场自身保证
// ==========================================

use crate::domain::types::RoomType;
use serde::{Deserialize, Serialize};

// ==========================================
// ExamRoom - 考场
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamRoom {
    pub room_id: String,       // 考场ID
    pub name: String,          // 考场名称
    pub room_type: RoomType,   // 考场类型 (amphi/classroom/lab)
    pub exam_capacity: i32,    // 考试容量 (考虑间隔要求,通常低于总座位数)
    pub has_computers: bool,   // 是否配备计算机
    pub is_available: bool,    // 当前是否可用
    pub is_active: bool,       // 是否启用
}

impl ExamRoom {
    /// 判断是否可以参与排考
    pub fn is_usable(&self) -> bool {
        self.is_active && self.is_available
    }

    /// 判断是否满足考试的设备/容量要求
    ///
    /// 规则:
    /// - 需要实验室 => 仅 lab 类型考场
    /// - 需要计算机 => 仅配备计算机的考场
    /// - 容量 >= 预计人数
    pub fn satisfies(&self, requires_computer: bool, requires_lab: bool, student_count: i32) -> bool {
        if self.exam_capacity < student_count {
            return false;
        }
        if requires_lab && self.room_type != RoomType::Lab {
            return false;
        }
        if requires_computer && !self.has_computers {
            return false;
        }
        true
    }
}
