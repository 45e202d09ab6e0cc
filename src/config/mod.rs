// ==========================================
// 高校排考系统 - 配置层
// ==========================================
// 职责: 排考策略常量管理 (时段/监考配比/审计上限)
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod schedule_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, SchedulePolicy};
pub use schedule_config_trait::ScheduleConfigReader;
