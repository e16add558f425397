// ==========================================
// ERP 导入引擎 - 领域模型层
// ==========================================
// 职责: 定义导入作业实体、目标表记录、基础类型
// 红线: 不含数据访问逻辑,不含打分逻辑
// ==========================================

pub mod canonical;
pub mod record;
pub mod types;

// 重导出核心类型
pub use canonical::{CanonicalRecord, CatalogItem, CustomerRecord, SalesRecord};
pub use record::{
    ColumnProfile, DuplicateFlag, FailedRow, ImportOutcome, ImportReport, MappingResult,
    MappingSuggestion, PreviewRow, ProgressUpdate, RawTable, TransformedRow, ValidationOutcome,
};
pub use types::{Destination, FieldKind, FieldValue, PrimitiveType};
