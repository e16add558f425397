// ==========================================
// ERP 导入引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 缺省: 键不存在时使用 defaults 中的值；值存在但不合法时报错
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ImportError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        })?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)
                .and_then(|_| ensure_schema(&guard))
                .map_err(|e| ImportError::ConfigReadError {
                    key: "*".to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let read_err = |message: String| ImportError::ConfigReadError {
            key: key.to_string(),
            message,
        };
        let conn = self
            .conn
            .lock()
            .map_err(|e| read_err(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| read_err(e.to_string()))
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// 全部 global 配置（按键排序）
    pub fn get_config_snapshot(&self) -> ImportResult<BTreeMap<String, String>> {
        let read_err = |e: rusqlite::Error| ImportError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        };
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(read_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(read_err)?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(read_err)?;
        Ok(rows)
    }

    /// 读取并解析配置值，键不存在时返回默认值
    fn get_parsed_or_default<T>(
        &self,
        key: &str,
        default: T,
        check: impl Fn(&T) -> bool,
        expectation: &str,
    ) -> ImportResult<T>
    where
        T: FromStr,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        let value_err = || ImportError::ConfigValueError {
            key: key.to_string(),
            value: raw.clone(),
            message: expectation.to_string(),
        };
        let parsed = raw.trim().parse::<T>().map_err(|_| value_err())?;
        if check(&parsed) {
            Ok(parsed)
        } else {
            Err(value_err())
        }
    }

    fn positive_usize(&self, key: &str, default: usize) -> ImportResult<usize> {
        self.get_parsed_or_default(key, default, |v| *v >= 1, "应为正整数")
    }

    fn ratio(&self, key: &str, default: f64, allow_zero: bool) -> ImportResult<f64> {
        let expectation = if allow_zero {
            "应为 [0, 1] 内的小数"
        } else {
            "应为 (0, 1] 内的小数"
        };
        let check = move |v: &f64| {
            if allow_zero {
                (0.0..=1.0).contains(v)
            } else {
                *v > 0.0 && *v <= 1.0
            }
        };
        self.get_parsed_or_default(key, default, check, expectation)
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> ImportResult<usize> {
        self.positive_usize(config_keys::BATCH_SIZE, defaults::BATCH_SIZE)
    }

    async fn get_exists_chunk_size(&self) -> ImportResult<usize> {
        self.positive_usize(config_keys::EXISTS_CHUNK_SIZE, defaults::EXISTS_CHUNK_SIZE)
    }

    async fn get_type_sample_size(&self) -> ImportResult<usize> {
        self.positive_usize(config_keys::TYPE_SAMPLE_SIZE, defaults::TYPE_SAMPLE_SIZE)
    }

    async fn get_type_match_ratio(&self) -> ImportResult<f64> {
        self.ratio(config_keys::TYPE_MATCH_RATIO, defaults::TYPE_MATCH_RATIO, false)
    }

    async fn get_min_mapping_score(&self) -> ImportResult<f64> {
        self.get_parsed_or_default(
            config_keys::MIN_MAPPING_SCORE,
            defaults::MIN_MAPPING_SCORE,
            |v: &f64| v.is_finite() && *v >= 0.0,
            "应为非负数",
        )
    }

    async fn get_low_confidence_threshold(&self) -> ImportResult<f64> {
        self.ratio(
            config_keys::LOW_CONFIDENCE_THRESHOLD,
            defaults::LOW_CONFIDENCE_THRESHOLD,
            true,
        )
    }

    async fn get_preview_rows(&self) -> ImportResult<usize> {
        self.positive_usize(config_keys::PREVIEW_ROWS, defaults::PREVIEW_ROWS)
    }

    async fn get_max_reported_errors(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(
            config_keys::MAX_REPORTED_ERRORS,
            defaults::MAX_REPORTED_ERRORS,
            |_| true,
            "应为非负整数",
        )
    }
}

// ==========================================
// DefaultImportConfig - 内置默认值（无数据库）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImportConfig;

#[async_trait]
impl ImportConfigReader for DefaultImportConfig {
    async fn get_batch_size(&self) -> ImportResult<usize> {
        Ok(defaults::BATCH_SIZE)
    }

    async fn get_exists_chunk_size(&self) -> ImportResult<usize> {
        Ok(defaults::EXISTS_CHUNK_SIZE)
    }

    async fn get_type_sample_size(&self) -> ImportResult<usize> {
        Ok(defaults::TYPE_SAMPLE_SIZE)
    }

    async fn get_type_match_ratio(&self) -> ImportResult<f64> {
        Ok(defaults::TYPE_MATCH_RATIO)
    }

    async fn get_min_mapping_score(&self) -> ImportResult<f64> {
        Ok(defaults::MIN_MAPPING_SCORE)
    }

    async fn get_low_confidence_threshold(&self) -> ImportResult<f64> {
        Ok(defaults::LOW_CONFIDENCE_THRESHOLD)
    }

    async fn get_preview_rows(&self) -> ImportResult<usize> {
        Ok(defaults::PREVIEW_ROWS)
    }

    async fn get_max_reported_errors(&self) -> ImportResult<usize> {
        Ok(defaults::MAX_REPORTED_ERRORS)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 落库
    pub const BATCH_SIZE: &str = "import/batch_size";
    pub const EXISTS_CHUNK_SIZE: &str = "import/exists_chunk_size";

    // 类型推断
    pub const TYPE_SAMPLE_SIZE: &str = "import/type_sample_size";
    pub const TYPE_MATCH_RATIO: &str = "import/type_match_ratio";

    // 映射
    pub const MIN_MAPPING_SCORE: &str = "import/min_mapping_score";
    pub const LOW_CONFIDENCE_THRESHOLD: &str = "import/low_confidence_threshold";

    // 输出
    pub const PREVIEW_ROWS: &str = "import/preview_rows";
    pub const MAX_REPORTED_ERRORS: &str = "import/max_reported_errors";
}

/// 配置默认值
pub mod defaults {
    use crate::importer::column_mapper::DEFAULT_MIN_MAPPING_SCORE;
    use crate::importer::type_detector::{DEFAULT_MATCH_RATIO, DEFAULT_SAMPLE_SIZE};

    pub const BATCH_SIZE: usize = 100;
    pub const EXISTS_CHUNK_SIZE: usize = 500;
    pub const TYPE_SAMPLE_SIZE: usize = DEFAULT_SAMPLE_SIZE;
    pub const TYPE_MATCH_RATIO: f64 = DEFAULT_MATCH_RATIO;
    pub const MIN_MAPPING_SCORE: f64 = DEFAULT_MIN_MAPPING_SCORE;
    pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.2;
    pub const PREVIEW_ROWS: usize = 20;
    pub const MAX_REPORTED_ERRORS: usize = 50;
}
