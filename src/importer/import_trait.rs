// ==========================================
// ERP 导入引擎 - 导入管道 Trait
// ==========================================
// 职责: 定义各阶段接口（不包含实现）
// 管道: 解析 → 类型推断 → 目标表分类 → 列映射 → 转换/校验 → 去重 → 分批落库
// ==========================================

use crate::app::session::ImportSession;
use crate::domain::record::{
    ImportReport, MappingResult, MappingSuggestion, PreviewRow, ProgressUpdate, RawTable,
    TransformedRow, ValidationOutcome,
};
use crate::domain::types::{Destination, PrimitiveType};
use crate::importer::error::ImportResult;
use crate::importer::schema_registry::SchemaDefinition;
use async_trait::async_trait;

// ==========================================
// ImportPipeline Trait
// ==========================================
// 用途: 导入作业主接口
// 实现者: ImportEngine
#[async_trait]
pub trait ImportPipeline: Send + Sync {
    /// 生成映射建议（目标表 + 表头→字段）
    ///
    /// # 参数
    /// - text: 文件原文
    /// - destination_override: 调用方指定目标表（跳过分类，置信度记 1.0）
    ///
    /// # 返回
    /// - Ok(MappingSuggestion): 建议结果，低置信度只标记 ambiguous，不阻断
    /// - Err: 解析失败
    async fn suggest_mapping(
        &self,
        text: &str,
        destination_override: Option<Destination>,
    ) -> ImportResult<MappingSuggestion>;

    /// 预览前 N 行（带校验与去重标记，不写库）
    ///
    /// # 参数
    /// - limit: 行数上限，None 时取配置 import/preview_rows
    async fn preview(
        &self,
        text: &str,
        mapping: &MappingResult,
        limit: Option<usize>,
    ) -> ImportResult<Vec<PreviewRow>>;

    /// 执行导入
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级/批次级问题都收集在报告里
    /// - Err: 解析失败、映射非法、存储不可达
    async fn run_import(
        &self,
        text: &str,
        options: ImportOptions,
        session: &ImportSession,
        progress: &mut (dyn FnMut(ProgressUpdate) + Send),
    ) -> ImportResult<ImportReport>;
}

/// 导入选项（均可选）
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 指定目标表
    pub destination_override: Option<Destination>,
    /// 人工修改后的映射（优先于自动建议）
    pub mapping_override: Option<MappingResult>,
}

// ==========================================
// TableParser Trait
// ==========================================
// 用途: 原文 → 原始表（阶段 0）
// 实现者: DelimitedTextParser
pub trait TableParser: Send + Sync {
    /// # 返回
    /// - Err(EmptyInput): 去掉空行后没有任何内容
    fn parse(&self, text: &str) -> ImportResult<RawTable>;
}

// ==========================================
// ColumnMapper Trait
// ==========================================
// 用途: 表头 → 标准字段（阶段 2）
// 实现者: GreedyColumnMapper
pub trait ColumnMapper: Send + Sync {
    /// 为已选定目标表生成单射映射
    ///
    /// # 参数
    /// - column_types: 与 headers 同序的推断类型
    /// - min_score: 接受阈值，最高分低于它的表头保持未映射
    fn suggest(
        &self,
        headers: &[String],
        column_types: &[PrimitiveType],
        schema: &SchemaDefinition,
        min_score: f64,
    ) -> MappingResult;
}

// ==========================================
// ValueTransformer Trait
// ==========================================
// 用途: 原始行 → 类型化行（阶段 3）
// 实现者: CanonicalValueTransformer
pub trait ValueTransformer: Send + Sync {
    /// 转换单行（从不失败，无法解析的值退化为 null / 0 / 原文去空白）
    fn transform_row(
        &self,
        table: &RawTable,
        row_index: usize,
        mapping: &MappingResult,
        schema: &SchemaDefinition,
    ) -> TransformedRow;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 必填校验（阶段 3）
// 实现者: RequiredFieldValidator
pub trait RowValidator: Send + Sync {
    /// 校验单行（不丢弃行，只打标记）
    fn validate_row(
        &self,
        table: &RawTable,
        row_index: usize,
        mapping: &MappingResult,
        schema: &SchemaDefinition,
    ) -> ValidationOutcome;
}
