// ==========================================
// ERP 导入引擎 - 应用状态
// ==========================================
// 职责: 打开数据库，组装存储、配置与导入引擎（共享同一连接）
// ==========================================

use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::importer::ImportEngine;
use crate::repository::SqliteRecordStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 默认组装的引擎类型
pub type SqliteImportEngine = ImportEngine<SqliteRecordStore, ConfigManager>;

pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 导入引擎
    pub engine: Arc<SqliteImportEngine>,
}

impl AppState {
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = SqliteRecordStore::from_connection(conn.clone())
            .map_err(|e| format!("无法创建SqliteRecordStore: {}", e))?;
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| format!("无法创建ConfigManager: {}", e))?;

        Ok(Self {
            db_path,
            engine: Arc::new(ImportEngine::new(store, config)),
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 ERP_IMPORT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("ERP_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./erp_import.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("erp-import-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("erp-import");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("erp_import.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_app_state_bootstraps_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();
        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert_eq!(
            state
                .engine
                .store()
                .count(crate::domain::types::Destination::Customers)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_default_db_path_not_empty() {
        assert!(get_default_db_path().ends_with(".db"));
    }
}
