// ==========================================
// ERP 导入引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: ERP 导出文件 → 销售/客户/商品三张标准表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析、映射、转换、去重、落库
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 应用层 - 组装与作业会话
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use app::{AppState, ImportSession};
pub use domain::{
    CanonicalRecord, Destination, FieldValue, ImportOutcome, ImportReport, MappingResult,
    MappingSuggestion, PreviewRow, ProgressUpdate,
};
pub use importer::{ImportEngine, ImportError, ImportOptions, ImportPipeline, ImportResult};
pub use repository::{RecordStore, SqliteRecordStore};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "ERP 导入引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
