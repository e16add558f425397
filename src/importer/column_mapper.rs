// ==========================================
// ERP 导入引擎 - 列映射器
// ==========================================
// 职责: 为已选定目标表的每个表头分配至多一个标准字段
// 规则:
// 1. 精确匹配（规范化后相等）优先占位，与其他表头无关
// 2. 其余表头按出现顺序贪心认领尚未被占用的最高分字段
//    得分 = 加权字段名重叠 + 加权关键词重叠 + 类型兼容加分
// 3. 最高分低于接受阈值的表头保持未映射
// 非目标: 全局最优分配（这里是贪心，先到先得）
// ==========================================

use crate::domain::record::{MappingResult, RawTable};
use crate::domain::types::PrimitiveType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::ColumnMapper;
use crate::importer::schema_registry::{CanonicalField, SchemaDefinition};
use crate::importer::text_similarity::{is_exact_match, normalize, score_header};
use std::collections::HashSet;
use tracing::debug;

/// 列类型属于字段可接受类型时的加分（低于任何文本得分权重）
pub const TYPE_COMPATIBILITY_BONUS: f64 = 0.5;

/// 默认接受阈值
pub const DEFAULT_MIN_MAPPING_SCORE: f64 = 1.0;

// ==========================================
// GreedyColumnMapper
// ==========================================
pub struct GreedyColumnMapper;

impl GreedyColumnMapper {
    /// 表头对字段的综合得分
    pub fn candidate_score(
        &self,
        header: &str,
        detected: Option<PrimitiveType>,
        field: &CanonicalField,
    ) -> f64 {
        let text = score_header(header, field).weighted();
        let bonus = match detected {
            Some(t) if field.accepts(t) => TYPE_COMPATIBILITY_BONUS,
            _ => 0.0,
        };
        text + bonus
    }
}

impl ColumnMapper for GreedyColumnMapper {
    fn suggest(
        &self,
        headers: &[String],
        column_types: &[PrimitiveType],
        schema: &SchemaDefinition,
        min_score: f64,
    ) -> MappingResult {
        let mut mapping = MappingResult::new(schema.destination, 0.0);

        // 第一轮: 精确匹配占位
        for header in headers {
            if mapping.header_to_field.contains_key(header) {
                continue;
            }
            let normalized = normalize(header);
            if let Some(field) = schema
                .fields
                .iter()
                .find(|f| !mapping.is_field_claimed(f.name) && is_exact_match(&normalized, f))
            {
                debug!(header = %header, field = field.name, "精确匹配");
                mapping.assign(header, field.name);
            }
        }

        // 第二轮: 贪心认领
        for (col_idx, header) in headers.iter().enumerate() {
            // 重复列名只看第一列
            if mapping.header_to_field.contains_key(header)
                || headers[..col_idx].contains(header)
                || normalize(header).is_empty()
            {
                continue;
            }
            let detected = column_types.get(col_idx).copied();

            let mut best: Option<(&CanonicalField, f64)> = None;
            for field in schema.fields {
                if mapping.is_field_claimed(field.name) {
                    continue;
                }
                let score = self.candidate_score(header, detected, field);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((field, score));
                }
            }

            match best {
                Some((field, score)) if score >= min_score => {
                    debug!(header = %header, field = field.name, score, "贪心匹配");
                    mapping.assign(header, field.name);
                }
                Some((field, score)) => {
                    debug!(header = %header, best = field.name, score, "得分低于阈值，保持未映射");
                }
                None => {}
            }
        }

        mapping
    }
}

/// 校验人工修改后的映射: 表头存在、字段属于目标表、单射
pub fn validate_mapping(
    mapping: &MappingResult,
    table: &RawTable,
    schema: &SchemaDefinition,
) -> ImportResult<()> {
    for (header, field) in &mapping.header_to_field {
        if table.header_index(header).is_none() {
            return Err(ImportError::UnknownHeader(header.clone()));
        }
        if schema.field(field).is_none() {
            return Err(ImportError::UnknownField {
                destination: schema.destination,
                field: field.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    if let Some(field) = mapping
        .header_to_field
        .values()
        .find(|f| !seen.insert(f.as_str()))
    {
        return Err(ImportError::NonInjectiveMapping(field.clone()));
    }

    Ok(())
}

/// 未映射的表头（按表头顺序）
pub fn unmapped_headers(mapping: &MappingResult, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .filter(|h| mapping.field_for(h).is_none())
        .cloned()
        .collect()
}

/// 未被映射的必填字段
pub fn missing_required_fields(mapping: &MappingResult, schema: &SchemaDefinition) -> Vec<String> {
    schema
        .required_fields()
        .filter(|f| !mapping.is_field_claimed(f.name))
        .map(|f| f.name.to_string())
        .collect()
}
