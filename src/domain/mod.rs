// ==========================================
// 高校排考系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod conflict;
pub mod exam;
pub mod module;
pub mod professor;
pub mod room;
pub mod types;

// 重导出核心类型
pub use conflict::{ConflictRecord, ScheduledExamView, SupervisionView};
pub use exam::{Exam, ExamSession};
pub use module::{Enrollment, Formation, Module};
pub use professor::{ExamSupervisor, Professor};
pub use room::ExamRoom;
pub use types::{
    ConflictSeverity, ConflictType, ExamStatus, RoomType, SessionType, SupervisorRole,
};
