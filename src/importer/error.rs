// ==========================================
// ERP 导入引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 只有解析失败 / 存储不可达 / 配置错误会抛给调用方，
//       行级与批次级问题收集进 ImportOutcome
// ==========================================

use crate::domain::types::Destination;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件内容为空: 没有可用的表头/数据行")]
    EmptyInput,

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 映射错误 =====
    #[error("未知字段 (目标表 {destination}): {field}")]
    UnknownField {
        destination: Destination,
        field: String,
    },

    #[error("未知表头: {0}")]
    UnknownHeader(String),

    #[error("映射非单射: 字段 {0} 被多个表头占用")]
    NonInjectiveMapping(String),

    // ===== 存储错误 =====
    #[error("存储不可达: {0}")]
    StoreUnavailable(String),

    #[error("存储查询失败: {0}")]
    StoreQueryError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否解析类错误（作业无法开始）
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyInput | ImportError::CsvParseError(_) | ImportError::FileReadError(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        if err.is_unreachable() {
            ImportError::StoreUnavailable(err.to_string())
        } else {
            ImportError::StoreQueryError(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let err: ImportError = RepositoryError::DatabaseConnectionError("down".to_string()).into();
        assert!(matches!(err, ImportError::StoreUnavailable(_)));

        let err: ImportError = RepositoryError::DatabaseQueryError("bad sql".to_string()).into();
        assert!(matches!(err, ImportError::StoreQueryError(_)));
    }

    #[test]
    fn test_is_parse_error() {
        assert!(ImportError::EmptyInput.is_parse_error());
        assert!(!ImportError::StoreUnavailable("x".to_string()).is_parse_error());
    }
}
