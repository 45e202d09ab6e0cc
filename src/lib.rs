// ==========================================
// 高校排考系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 考试排期决策支持引擎 (批量贪心排考 + 冲突审计)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排考业务规则
pub mod engine;

// 配置层 - 排考策略配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConflictSeverity, ConflictType, ExamStatus, RoomType, SessionType, SupervisorRole,
};

// 领域实体
pub use domain::{
    ConflictRecord, Enrollment, Exam, ExamRoom, ExamSession, ExamSupervisor, Formation, Module,
    Professor, ScheduledExamView, SupervisionView,
};

// 引擎
pub use engine::{
    AssignmentStats, ConflictAuditor, ExamSlot, GreedyScheduler, ScheduleIndexes, ScheduleRunStats,
    SlotCandidate, SlotGenerator, SupervisorAssigner,
};

// 配置
pub use config::{ConfigManager, ScheduleConfigReader, SchedulePolicy};

// API
pub use api::SchedulingApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "高校排考系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
