// ==========================================
// 高校排考系统 - 教师与监考领域模型
// ==========================================
// 红线: 同一教师在同一场考试中至多出现一次 (唯一约束)
// ==========================================

use crate::domain::types::SupervisorRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Professor - 教师
// ==========================================
// 监考分配引擎的只读输入 (运行期负载计数为派生数据,不落库)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professor {
    pub professor_id: String,           // 教师ID
    pub department_id: String,          // 所属院系ID
    pub name: String,                   // 姓名
    pub max_exams_per_day: Option<i32>, // 单日监考上限 (缺省时使用配置默认值)
    pub is_active: bool,                // 是否在职可用
}

// ==========================================
// ExamSupervisor - 监考安排
// ==========================================
// 由监考分配引擎创建; 首位监考角色为 responsible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSupervisor {
    pub supervisor_id: String,      // 安排ID
    pub exam_id: String,            // 考试ID
    pub professor_id: String,       // 教师ID
    pub role: SupervisorRole,       // 角色
    pub is_department_exam: bool,   // 是否本院系考试 (评分亲和命中)
    pub created_at: DateTime<Utc>,  // 创建时间
}
