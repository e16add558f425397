// ==========================================
// ERP 导入引擎 - 导入作业编排
// ==========================================
// 职责: 串联各阶段，从文件原文到落库报告
// 流程: 解析 → 类型推断 → 分类 → 映射 → 转换/校验 → 去重 → 分批落库 → 报告
// 错误: 只有解析失败、映射非法、存储不可达、配置错误会返回 Err
// ==========================================

use crate::app::session::ImportSession;
use crate::config::ImportConfigReader;
use crate::domain::canonical::CanonicalRecord;
use crate::domain::record::{
    ColumnProfile, ImportReport, MappingResult, MappingSuggestion, PreviewRow, ProgressUpdate,
    RawTable, TransformedRow, ValidationOutcome,
};
use crate::domain::types::Destination;
use crate::importer::batch_loader::{BatchLoader, LoadItem};
use crate::importer::column_mapper::{
    missing_required_fields, unmapped_headers, validate_mapping, GreedyColumnMapper,
};
use crate::importer::destination_classifier::DestinationClassifier;
use crate::importer::duplicate_detector::DuplicateDetector;
use crate::importer::error::ImportResult;
use crate::importer::import_trait::{
    ColumnMapper, ImportOptions, ImportPipeline, RowValidator, TableParser, ValueTransformer,
};
use crate::importer::row_validator::RequiredFieldValidator;
use crate::importer::schema_registry::{schema_for, SchemaDefinition};
use crate::importer::table_parser::DelimitedTextParser;
use crate::importer::type_detector::TypeDetector;
use crate::importer::value_transformer::CanonicalValueTransformer;
use crate::repository::RecordStore;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

// ==========================================
// JobSettings - 单次作业使用的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    pub batch_size: usize,
    pub exists_chunk_size: usize,
    pub type_sample_size: usize,
    pub type_match_ratio: f64,
    pub min_mapping_score: f64,
    pub low_confidence_threshold: f64,
    pub preview_rows: usize,
    pub max_reported_errors: usize,
}

impl JobSettings {
    pub async fn load<C>(config: &C) -> ImportResult<Self>
    where
        C: ImportConfigReader + ?Sized,
    {
        Ok(Self {
            batch_size: config.get_batch_size().await?,
            exists_chunk_size: config.get_exists_chunk_size().await?,
            type_sample_size: config.get_type_sample_size().await?,
            type_match_ratio: config.get_type_match_ratio().await?,
            min_mapping_score: config.get_min_mapping_score().await?,
            low_confidence_threshold: config.get_low_confidence_threshold().await?,
            preview_rows: config.get_preview_rows().await?,
            max_reported_errors: config.get_max_reported_errors().await?,
        })
    }
}

// ==========================================
// ImportEngine - 导入引擎
// ==========================================
pub struct ImportEngine<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    // 数据访问层
    store: S,

    // 配置读取器
    config: C,

    // 导入组件
    parser: Box<dyn TableParser>,
    mapper: Box<dyn ColumnMapper>,
    transformer: Box<dyn ValueTransformer>,
    validator: Box<dyn RowValidator>,
    classifier: DestinationClassifier,
}

impl<S, C> ImportEngine<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    /// 使用默认组件创建引擎
    pub fn new(store: S, config: C) -> Self {
        Self::with_components(
            store,
            config,
            Box::new(DelimitedTextParser),
            Box::new(GreedyColumnMapper),
            Box::new(CanonicalValueTransformer),
            Box::new(RequiredFieldValidator),
        )
    }

    /// 指定各阶段组件
    pub fn with_components(
        store: S,
        config: C,
        parser: Box<dyn TableParser>,
        mapper: Box<dyn ColumnMapper>,
        transformer: Box<dyn ValueTransformer>,
        validator: Box<dyn RowValidator>,
    ) -> Self {
        Self {
            store,
            config,
            parser,
            mapper,
            transformer,
            validator,
            classifier: DestinationClassifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 类型推断 + 分类 + 列映射
    fn analyze(
        &self,
        table: &RawTable,
        destination_override: Option<Destination>,
        settings: &JobSettings,
    ) -> MappingSuggestion {
        let column_types = TypeDetector::new(settings.type_sample_size, settings.type_match_ratio)
            .detect_table(table);
        debug!(?column_types, "列类型推断完成");

        let classification = self.classifier.classify(&table.headers);
        let (destination, confidence) = match destination_override {
            Some(d) => (d, 1.0),
            None => (classification.destination, classification.confidence),
        };
        let ambiguous =
            destination_override.is_none() && confidence < settings.low_confidence_threshold;
        if ambiguous {
            warn!(
                destination = %destination,
                confidence,
                threshold = settings.low_confidence_threshold,
                "目标表判定置信度偏低，请人工确认"
            );
        }

        let schema = schema_for(destination);
        let mut mapping = self.mapper.suggest(
            &table.headers,
            &column_types,
            schema,
            settings.min_mapping_score,
        );
        mapping.confidence = confidence;

        let columns = table
            .headers
            .iter()
            .zip(column_types)
            .map(|(header, detected_type)| ColumnProfile {
                header: header.clone(),
                detected_type,
            })
            .collect();
        let unmapped = unmapped_headers(&mapping, &table.headers);
        let missing = missing_required_fields(&mapping, schema);

        info!(
            destination = %destination,
            confidence,
            mapped = mapping.header_to_field.len(),
            unmapped = unmapped.len(),
            missing_required = missing.len(),
            "映射建议生成完成"
        );

        MappingSuggestion {
            mapping,
            ambiguous,
            destination_scores: classification.scores,
            columns,
            unmapped_headers: unmapped,
            missing_required: missing,
        }
    }

    /// 转换 + 校验前 count 行
    fn stage_rows(
        &self,
        table: &RawTable,
        mapping: &MappingResult,
        schema: &SchemaDefinition,
        count: usize,
    ) -> (Vec<TransformedRow>, Vec<ValidationOutcome>) {
        (0..count.min(table.row_count()))
            .map(|idx| {
                (
                    self.transformer.transform_row(table, idx, mapping, schema),
                    self.validator.validate_row(table, idx, mapping, schema),
                )
            })
            .unzip()
    }
}

#[async_trait]
impl<S, C> ImportPipeline for ImportEngine<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    #[instrument(skip_all, fields(destination_override = ?destination_override))]
    async fn suggest_mapping(
        &self,
        text: &str,
        destination_override: Option<Destination>,
    ) -> ImportResult<MappingSuggestion> {
        let settings = JobSettings::load(&self.config).await?;
        let table = self.parser.parse(text)?;
        debug!(rows = table.row_count(), headers = table.headers.len(), "解析完成");
        Ok(self.analyze(&table, destination_override, &settings))
    }

    #[instrument(skip_all, fields(destination = %mapping.destination))]
    async fn preview(
        &self,
        text: &str,
        mapping: &MappingResult,
        limit: Option<usize>,
    ) -> ImportResult<Vec<PreviewRow>> {
        let settings = JobSettings::load(&self.config).await?;
        let table = self.parser.parse(text)?;
        let schema = schema_for(mapping.destination);
        validate_mapping(mapping, &table, schema)?;

        let count = limit.unwrap_or(settings.preview_rows);
        let (rows, validations) = self.stage_rows(&table, mapping, schema, count);
        let flags = DuplicateDetector::new(settings.exists_chunk_size)
            .detect(&self.store, schema, &rows)
            .await?;

        Ok(rows
            .into_iter()
            .zip(validations)
            .zip(flags)
            .map(|((row, validation), duplicate)| PreviewRow {
                row,
                validation,
                duplicate,
            })
            .collect())
    }

    #[instrument(skip_all, fields(job_id = %session.job_id()))]
    async fn run_import(
        &self,
        text: &str,
        options: ImportOptions,
        session: &ImportSession,
        progress: &mut (dyn FnMut(ProgressUpdate) + Send),
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let settings = JobSettings::load(&self.config).await?;

        // === 步骤 1: 解析 ===
        debug!("步骤 1: 解析文件");
        let table = self.parser.parse(text)?;
        info!(
            job_id = %session.job_id(),
            total_rows = table.row_count(),
            delimiter = %table.delimiter,
            "开始导入"
        );

        // === 步骤 2: 确定映射 ===
        debug!("步骤 2: 确定映射");
        let mapping = match options.mapping_override {
            Some(mapping) => {
                if let Some(d) = options.destination_override {
                    if d != mapping.destination {
                        warn!(
                            requested = %d,
                            mapping = %mapping.destination,
                            "指定目标表与人工映射不一致，以人工映射为准"
                        );
                    }
                }
                mapping
            }
            None => {
                self.analyze(&table, options.destination_override, &settings)
                    .mapping
            }
        };
        let destination = mapping.destination;
        let schema = schema_for(destination);
        validate_mapping(&mapping, &table, schema)?;

        // === 步骤 3: 转换 + 校验 ===
        debug!("步骤 3: 转换与必填校验");
        let (rows, validations) = self.stage_rows(&table, &mapping, schema, table.row_count());

        // === 步骤 4: 重复检测 ===
        debug!("步骤 4: 重复检测");
        let flags = DuplicateDetector::new(settings.exists_chunk_size)
            .detect(&self.store, schema, &rows)
            .await?;

        // === 步骤 5: 筛选可写入行 ===
        let mut errors: Vec<String> = Vec::new();
        let mut skipped_invalid = 0;
        let mut skipped_duplicate = 0;
        let mut items = Vec::new();

        for ((row, validation), flag) in rows.into_iter().zip(validations).zip(flags) {
            if !validation.valid {
                skipped_invalid += 1;
                errors.push(format!(
                    "第 {} 行校验失败: {}",
                    row.row_index + 1,
                    validation.errors.join("; ")
                ));
                continue;
            }
            if flag.is_duplicate {
                skipped_duplicate += 1;
                errors.push(format!(
                    "第 {} 行重复: {}",
                    row.row_index + 1,
                    flag.reason.unwrap_or_default()
                ));
                continue;
            }
            items.push(LoadItem {
                row_index: row.row_index,
                record: CanonicalRecord::from_row(&row),
                raw_data: table.raw_row_json(row.row_index),
            });
        }

        info!(
            to_load = items.len(),
            skipped_invalid,
            skipped_duplicate,
            "筛选完成"
        );

        // === 步骤 6: 分批落库 ===
        debug!("步骤 6: 分批落库");
        let outcome = BatchLoader::new(settings.batch_size)
            .load(&self.store, destination, items, session, progress)
            .await?;

        errors.extend(outcome.failed_rows.iter().map(|f| {
            format!("第 {} 行写入失败: {}", f.row_index + 1, f.error)
        }));
        let errors_truncated = errors.len() > settings.max_reported_errors;
        errors.truncate(settings.max_reported_errors);

        let report = ImportReport {
            job_id: session.job_id().to_string(),
            destination,
            confidence: mapping.confidence,
            total_rows: table.row_count(),
            inserted: outcome.inserted_count,
            skipped_invalid,
            skipped_duplicate,
            failed: outcome.failed_rows.len(),
            errors,
            errors_truncated,
            cancelled: outcome.cancelled,
            elapsed_ms: start_time.elapsed().as_millis(),
            outcome,
        };

        info!(
            job_id = %report.job_id,
            destination = %report.destination,
            inserted = report.inserted,
            failed = report.failed,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms as u64,
            "导入完成"
        );

        Ok(report)
    }
}
