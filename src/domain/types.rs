// ==========================================
// 高校排考系统 - 领域类型定义
// ==========================================
// 红线: 状态机制,不是自由字符串
// 序列化格式: 小写蛇形 (与数据库存储一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 考试状态 (Exam Status)
// ==========================================
// 排考引擎只驱动 pending -> scheduled;
// 清除排期驱动 scheduled -> pending;
// 其余状态由外围系统维护。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Pending,    // 待排期
    Scheduled,  // 已排期
    InProgress, // 进行中
    Completed,  // 已结束
    Cancelled,  // 已取消
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Pending => write!(f, "pending"),
            ExamStatus::Scheduled => write!(f, "scheduled"),
            ExamStatus::InProgress => write!(f, "in_progress"),
            ExamStatus::Completed => write!(f, "completed"),
            ExamStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for ExamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExamStatus::Pending),
            "scheduled" => Ok(ExamStatus::Scheduled),
            "in_progress" => Ok(ExamStatus::InProgress),
            "completed" => Ok(ExamStatus::Completed),
            "cancelled" => Ok(ExamStatus::Cancelled),
            other => Err(format!("未知考试状态: {}", other)),
        }
    }
}

// ==========================================
// 考场类型 (Room Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Amphi,     // 阶梯教室
    Classroom, // 普通教室
    Lab,       // 实验室
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Amphi => write!(f, "amphi"),
            RoomType::Classroom => write!(f, "classroom"),
            RoomType::Lab => write!(f, "lab"),
        }
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amphi" => Ok(RoomType::Amphi),
            "classroom" => Ok(RoomType::Classroom),
            "lab" => Ok(RoomType::Lab),
            other => Err(format!("未知考场类型: {}", other)),
        }
    }
}

// ==========================================
// 考试批次类型 (Session Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Normal,  // 正常考试
    Makeup,  // 补考
    Special, // 特殊批次
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Normal => write!(f, "normal"),
            SessionType::Makeup => write!(f, "makeup"),
            SessionType::Special => write!(f, "special"),
        }
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(SessionType::Normal),
            "makeup" => Ok(SessionType::Makeup),
            "special" => Ok(SessionType::Special),
            other => Err(format!("未知批次类型: {}", other)),
        }
    }
}

// ==========================================
// 监考角色 (Supervisor Role)
// ==========================================
// 约束: 每场考试首位监考为主监考 (responsible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorRole {
    Responsible, // 主监考
    Supervisor,  // 监考
    Assistant,   // 助理监考
}

impl fmt::Display for SupervisorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorRole::Responsible => write!(f, "responsible"),
            SupervisorRole::Supervisor => write!(f, "supervisor"),
            SupervisorRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for SupervisorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "responsible" => Ok(SupervisorRole::Responsible),
            "supervisor" => Ok(SupervisorRole::Supervisor),
            "assistant" => Ok(SupervisorRole::Assistant),
            other => Err(format!("未知监考角色: {}", other)),
        }
    }
}

// ==========================================
// 冲突类型 (Conflict Type)
// ==========================================
// 由冲突审计引擎产出,覆盖四类违规
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictType {
    Capacity,          // 容量超限
    RoomOverlap,       // 考场时间重叠
    ProfessorOverlap,  // 监考时间重叠
    StudentOverlap,    // 学生同时段多考
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::Capacity => write!(f, "Capacity"),
            ConflictType::RoomOverlap => write!(f, "RoomOverlap"),
            ConflictType::ProfessorOverlap => write!(f, "ProfessorOverlap"),
            ConflictType::StudentOverlap => write!(f, "StudentOverlap"),
        }
    }
}

// ==========================================
// 冲突严重级别 (Conflict Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSeverity::Low => write!(f, "Low"),
            ConflictSeverity::Medium => write!(f, "Medium"),
            ConflictSeverity::High => write!(f, "High"),
            ConflictSeverity::Critical => write!(f, "Critical"),
        }
    }
}
