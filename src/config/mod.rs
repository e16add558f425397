// ==========================================
// ERP 导入引擎 - 配置层
// ==========================================
// 职责: 导入参数管理（批大小、阈值、抽样数等）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager, DefaultImportConfig};
pub use import_config_trait::ImportConfigReader;
