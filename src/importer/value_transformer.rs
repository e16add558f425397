// ==========================================
// ERP 导入引擎 - 值转换器
// ==========================================
// 职责: 原始字符串 → 标准类型值（按字段值类别）
// 规则:
// - 日期: DD/MM/YYYY、DD-MM-YYYY → YYYY-MM-DD；ISO 原样；无法解析 → null
// - 金额: 去货币符号/空白/千分位，小数逗号 → 小数点；无法解析 → 0
//   带货币符号且无逗号时，"R$ 1.000" 的点号按千分位处理
// - 数值: 逗号 → 小数点；无法解析 → 0
// - 证件号: 只保留数字
// - 文本: 去首尾空白
// - 空单元格一律 → null
// 不变式: 幂等，transform(transform(v).to_raw()) == transform(v)
// ==========================================

use crate::domain::record::{MappingResult, RawTable, TransformedRow};
use crate::domain::types::{FieldKind, FieldValue};
use crate::importer::import_trait::ValueTransformer;
use crate::importer::schema_registry::SchemaDefinition;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static DAY_FIRST_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap());

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

// 仅有点号的千分位写法，如 1.000 / 12.345.678
static DOT_GROUPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d{1,3}(\.\d{3})+$").unwrap());

const CURRENCY_SYMBOLS: [&str; 4] = ["R$", "US$", "$", "€"];

fn transform_date(value: &str) -> FieldValue {
    if ISO_DATE.is_match(value) {
        return match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(_) => FieldValue::Text(value.to_string()),
            Err(_) => FieldValue::Null,
        };
    }

    let Some(caps) = DAY_FIRST_DATE.captures(value) else {
        return FieldValue::Null;
    };
    let day = caps[1].parse::<u32>().ok();
    let month = caps[2].parse::<u32>().ok();
    let year = caps[3].parse::<i32>().ok();

    match (year, month, day) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .map(|date| FieldValue::Text(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(FieldValue::Null),
        _ => FieldValue::Null,
    }
}

fn transform_currency(value: &str) -> FieldValue {
    let had_symbol = CURRENCY_SYMBOLS.iter().any(|symbol| value.contains(symbol));

    // US$ 要先于 $ 剥离
    let mut cleaned = value.to_string();
    for symbol in CURRENCY_SYMBOLS {
        cleaned = cleaned.replace(symbol, "");
    }
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 || (had_symbol && DOT_GROUPED.is_match(&cleaned)) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    FieldValue::Number(parse_finite(&normalized).unwrap_or(0.0))
}

fn transform_number(value: &str) -> FieldValue {
    FieldValue::Number(parse_finite(&value.replace(',', ".")).unwrap_or(0.0))
}

fn transform_document(value: &str) -> FieldValue {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(digits)
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// 按字段值类别转换单个原始值（从不失败）
pub fn transform_value(kind: FieldKind, raw: &str) -> FieldValue {
    let value = raw.trim();
    if value.is_empty() {
        return FieldValue::Null;
    }

    match kind {
        FieldKind::Date => transform_date(value),
        FieldKind::Currency => transform_currency(value),
        FieldKind::Number => transform_number(value),
        FieldKind::Document => transform_document(value),
        FieldKind::Text => FieldValue::Text(value.to_string()),
    }
}

// ==========================================
// CanonicalValueTransformer
// ==========================================
pub struct CanonicalValueTransformer;

impl ValueTransformer for CanonicalValueTransformer {
    fn transform_row(
        &self,
        table: &RawTable,
        row_index: usize,
        mapping: &MappingResult,
        schema: &SchemaDefinition,
    ) -> TransformedRow {
        let values: BTreeMap<String, FieldValue> = schema
            .fields
            .iter()
            .map(|field| {
                let value = mapping
                    .header_for(field.name)
                    .and_then(|header| table.cell(row_index, header))
                    .map(|raw| transform_value(field.kind, raw))
                    .unwrap_or(FieldValue::Null);
                (field.name.to_string(), value)
            })
            .collect();

        TransformedRow {
            row_index,
            destination: schema.destination,
            values,
        }
    }
}
