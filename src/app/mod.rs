// ==========================================
// ERP 导入引擎 - 应用层
// ==========================================
// 职责: 组装引擎、数据库路径、作业会话
// ==========================================

pub mod session;
pub mod state;

// 重导出
pub use session::ImportSession;
pub use state::{get_default_db_path, AppState, SqliteImportEngine};
