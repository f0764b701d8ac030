// ==========================================
// 剧团排班系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod assignment_config_trait;
pub mod config_manager;

pub use assignment_config_trait::AssignmentConfigReader;
pub use config_manager::{config_keys, ConfigManager, DEFAULT_LOCALE};
