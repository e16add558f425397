// ==========================================
// ERP 导入引擎 - 导入层
// ==========================================
// 职责: 外部 ERP 导出文件 → 标准目标表
// 支持: 逗号/分号分隔文本（UTF-8，可带双引号）
// ==========================================

// 模块声明
pub mod batch_loader;
pub mod column_mapper;
pub mod destination_classifier;
pub mod duplicate_detector;
pub mod error;
pub mod import_engine;
pub mod import_trait;
pub mod row_validator;
pub mod schema_registry;
pub mod table_parser;
pub mod text_similarity;
pub mod type_detector;
pub mod value_transformer;

// 重导出核心类型
pub use batch_loader::{BatchLoader, LoadItem};
pub use column_mapper::{validate_mapping, GreedyColumnMapper};
pub use destination_classifier::{Classification, DestinationClassifier};
pub use duplicate_detector::DuplicateDetector;
pub use error::{ImportError, ImportResult};
pub use import_engine::{ImportEngine, JobSettings};
pub use row_validator::RequiredFieldValidator;
pub use schema_registry::{schema_for, CanonicalField, SchemaDefinition};
pub use table_parser::{read_text_file, DelimitedTextParser};
pub use type_detector::TypeDetector;
pub use value_transformer::{transform_value, CanonicalValueTransformer};

// 重导出 Trait 接口
pub use import_trait::{
    ColumnMapper, ImportOptions, ImportPipeline, RowValidator, TableParser, ValueTransformer,
};
