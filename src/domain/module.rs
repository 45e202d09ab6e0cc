// ==========================================
// 高校排考系统 - 教学组织领域模型
// ==========================================
// 职责: 课程 / 专业 / 选课记录 (排考的只读输入)
// 红线: 排考过程中不可变,只在批量读取时构造一次
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Module - 课程
// ==========================================
// 课程定义考试的时长与设备要求,学生通过选课记录关联到课程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub module_id: String,          // 课程ID
    pub formation_id: String,       // 所属专业ID
    pub name: String,               // 课程名称
    pub code: String,               // 课程代码 (全局唯一)
    pub exam_duration_minutes: i32, // 考试时长 (分钟)
    pub requires_computer: bool,    // 需要计算机
    pub requires_lab: bool,         // 需要实验室
    pub is_active: bool,            // 是否启用
}

// ==========================================
// Formation - 专业
// ==========================================
// 用途: 课程 -> 专业 -> 院系 链路,供监考亲和评分使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    pub formation_id: String,  // 专业ID
    pub department_id: String, // 所属院系ID
    pub name: String,          // 专业名称
    pub academic_year: String, // 学年 (如 "2025-2026")
}

// ==========================================
// Enrollment - 选课记录
// ==========================================
// (student_id, module_id) 二元组,定义哪些学生参加哪门课程的考试
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String, // 学号
    pub module_id: String,  // 课程ID
}
