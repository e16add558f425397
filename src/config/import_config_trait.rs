// ==========================================
// ERP 导入引擎 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、DefaultImportConfig（内置默认值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 落库 =====

    /// 每批写入行数
    ///
    /// # 默认值
    /// - 100
    async fn get_batch_size(&self) -> ImportResult<usize>;

    /// 单次存在性查询的最大键数
    ///
    /// # 默认值
    /// - 500
    async fn get_exists_chunk_size(&self) -> ImportResult<usize>;

    // ===== 类型推断 =====

    /// 每列抽样数
    ///
    /// # 默认值
    /// - 100
    async fn get_type_sample_size(&self) -> ImportResult<usize>;

    /// 类型采纳比例 (0, 1]
    ///
    /// # 默认值
    /// - 0.8
    async fn get_type_match_ratio(&self) -> ImportResult<f64>;

    // ===== 映射 =====

    /// 列映射接受阈值
    ///
    /// # 默认值
    /// - 1.0
    async fn get_min_mapping_score(&self) -> ImportResult<f64>;

    /// 分类置信度低于该值时标记 ambiguous
    ///
    /// # 默认值
    /// - 0.2
    async fn get_low_confidence_threshold(&self) -> ImportResult<f64>;

    // ===== 输出 =====

    /// 预览行数
    ///
    /// # 默认值
    /// - 20
    async fn get_preview_rows(&self) -> ImportResult<usize>;

    /// 报告中保留的行级错误条数上限
    ///
    /// # 默认值
    /// - 50
    async fn get_max_reported_errors(&self) -> ImportResult<usize>;
}
