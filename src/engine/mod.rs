// ==========================================
// 高校排考系统 - 引擎层
// ==========================================
// 职责: 实现排考业务规则,不拼 SQL
// 红线: Engine 不拼 SQL; 全部算法在单一内存快照上
//       严格串行执行,运行期不回查持久层
// ==========================================

pub mod conflict_auditor;
pub mod greedy_scheduler;
pub mod indexes;
pub mod slot_generator;
pub mod supervisor_assigner;

// 重导出核心引擎
pub use conflict_auditor::{times_overlap, ConflictAuditor};
pub use greedy_scheduler::{GreedyScheduler, ScheduleRunStats, SlotCandidate};
pub use indexes::ScheduleIndexes;
pub use slot_generator::{ExamSlot, SlotGenerator};
pub use supervisor_assigner::{AssignmentStats, SupervisorAssigner};
