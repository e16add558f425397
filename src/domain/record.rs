// ==========================================
// ERP 导入引擎 - 导入作业实体
// ==========================================
// 职责: 原始表、映射结果、转换行、校验/去重标记、导入结果
// 生命周期: 每个导入作业新建，返回 ImportReport 后丢弃
// ==========================================

use crate::domain::types::{Destination, FieldValue, PrimitiveType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// RawTable - 解析后的原始表
// ==========================================
// 所有数据行列数与表头一致（短行补空串）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 按列名定位列（重复列名取第一列）
    pub fn header_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// 某列的全部取值（按行顺序）
    pub fn column_values(&self, col_idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(col_idx).map(String::as_str).unwrap_or(""))
    }

    /// 取单元格原值
    pub fn cell(&self, row_index: usize, header: &str) -> Option<&str> {
        let col = self.header_index(header)?;
        self.rows
            .get(row_index)
            .and_then(|row| row.get(col))
            .map(String::as_str)
    }

    /// 行的 (列名, 原值) 序列
    pub fn raw_row(&self, row_index: usize) -> Vec<(&str, &str)> {
        match self.rows.get(row_index) {
            Some(row) => self
                .headers
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }

    /// 行原值的 JSON 形式（失败明细中保留原始值）
    pub fn raw_row_json(&self, row_index: usize) -> String {
        let map: BTreeMap<&str, &str> = self.raw_row(row_index).into_iter().collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }
}

// ==========================================
// MappingResult - 表头 → 标准字段映射
// ==========================================
// 不变式: 单射（任意两个表头不映射到同一字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub destination: Destination,
    pub header_to_field: BTreeMap<String, String>,
    pub confidence: f64,
}

impl MappingResult {
    pub fn new(destination: Destination, confidence: f64) -> Self {
        Self {
            destination,
            header_to_field: BTreeMap::new(),
            confidence,
        }
    }

    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.header_to_field.get(header).map(String::as_str)
    }

    pub fn header_for(&self, field: &str) -> Option<&str> {
        self.header_to_field
            .iter()
            .find(|(_, f)| f.as_str() == field)
            .map(|(h, _)| h.as_str())
    }

    pub fn is_field_claimed(&self, field: &str) -> bool {
        self.header_for(field).is_some()
    }

    /// 人工指定映射：若字段已被其他表头占用，原表头解除映射
    ///
    /// # 返回
    /// - Some(header): 被挤掉的原表头
    pub fn assign(&mut self, header: &str, field: &str) -> Option<String> {
        let displaced = self
            .header_for(field)
            .filter(|h| *h != header)
            .map(str::to_string);
        if let Some(old) = &displaced {
            self.header_to_field.remove(old);
        }
        self.header_to_field
            .insert(header.to_string(), field.to_string());
        displaced
    }

    pub fn unassign(&mut self, header: &str) -> Option<String> {
        self.header_to_field.remove(header)
    }

    /// 单射检查
    pub fn is_injective(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.header_to_field.values().all(|f| seen.insert(f.as_str()))
    }
}

// ==========================================
// TransformedRow - 转换后的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedRow {
    pub row_index: usize,
    pub destination: Destination,
    pub values: BTreeMap<String, FieldValue>,
}

impl TransformedRow {
    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&FieldValue::Null)
    }
}

// ==========================================
// 行级标记
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub row_index: usize,
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateFlag {
    pub row_index: usize,
    pub is_duplicate: bool,
    pub reason: Option<String>,
}

impl DuplicateFlag {
    pub fn clear(row_index: usize) -> Self {
        Self {
            row_index,
            is_duplicate: false,
            reason: None,
        }
    }
}

// ==========================================
// ImportOutcome - 分批落库结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRow {
    pub row_index: usize,
    pub error: String,
    /// 原始行（JSON）
    pub raw_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub inserted_count: usize,
    pub failed_rows: Vec<FailedRow>,
    pub batches_total: usize,
    pub batches_completed: usize,
    /// 作业在批次间被取消
    pub cancelled: bool,
}

/// 每批完成后的进度通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub batches_completed: usize,
    pub batches_total: usize,
    pub percent: u8,
    pub message: String,
}

// ==========================================
// 对外输出
// ==========================================

/// 列画像（映射建议附带，供人工复核）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub header: String,
    pub detected_type: PrimitiveType,
}

/// 映射建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    pub mapping: MappingResult,
    /// 置信度低于阈值（仅提示，不阻断）
    pub ambiguous: bool,
    pub destination_scores: Vec<(Destination, f64)>,
    pub columns: Vec<ColumnProfile>,
    pub unmapped_headers: Vec<String>,
    pub missing_required: Vec<String>,
}

/// 预览行（带校验/去重标记）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub row: TransformedRow,
    pub validation: ValidationOutcome,
    pub duplicate: DuplicateFlag,
}

/// 导入报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub job_id: String,
    pub destination: Destination,
    pub confidence: f64,
    pub total_rows: usize,
    pub inserted: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
    /// 行级错误信息（条数有上限）
    pub errors: Vec<String>,
    pub errors_truncated: bool,
    pub cancelled: bool,
    pub elapsed_ms: u128,
    pub outcome: ImportOutcome,
}

impl ImportReport {
    /// 人类可读摘要
    pub fn summary(&self) -> String {
        let mut line = format!(
            "[{}] 共 {} 行: 导入 {}，跳过(重复) {}，跳过(校验失败) {}，失败 {}",
            self.destination,
            self.total_rows,
            self.inserted,
            self.skipped_duplicate,
            self.skipped_invalid,
            self.failed
        );
        if self.cancelled {
            line.push_str("（作业已取消）");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable {
            delimiter: ',',
            headers: vec!["Nota".to_string(), "Valor".to_string(), "Nota".to_string()],
            rows: vec![vec!["1".to_string(), "10".to_string(), "9".to_string()]],
        }
    }

    #[test]
    fn test_raw_table_duplicate_header_takes_first() {
        let t = table();
        assert_eq!(t.header_index("Nota"), Some(0));
        assert_eq!(t.cell(0, "Nota"), Some("1"));
        assert_eq!(t.cell(0, "Missing"), None);
    }

    #[test]
    fn test_raw_row_json_keeps_values() {
        let t = table();
        let json = t.raw_row_json(0);
        assert!(json.contains("\"Valor\":\"10\""));
    }

    #[test]
    fn test_mapping_assign_keeps_injective() {
        let mut m = MappingResult::new(Destination::Sales, 1.0);
        assert_eq!(m.assign("Nota", "invoice_number"), None);
        assert_eq!(
            m.assign("Documento", "invoice_number"),
            Some("Nota".to_string())
        );
        assert!(m.is_injective());
        assert_eq!(m.field_for("Nota"), None);
        assert_eq!(m.header_for("invoice_number"), Some("Documento"));

        // 同一表头重复指定不挤掉自己
        assert_eq!(m.assign("Documento", "invoice_number"), None);
        assert_eq!(m.unassign("Documento"), Some("invoice_number".to_string()));
        assert!(m.header_to_field.is_empty());
    }

    #[test]
    fn test_report_summary() {
        let report = ImportReport {
            job_id: "job".to_string(),
            destination: Destination::Sales,
            confidence: 0.9,
            total_rows: 3,
            inserted: 1,
            skipped_invalid: 0,
            skipped_duplicate: 2,
            failed: 0,
            errors: vec![],
            errors_truncated: false,
            cancelled: false,
            elapsed_ms: 5,
            outcome: ImportOutcome::default(),
        };
        let s = report.summary();
        assert!(s.contains("共 3 行"));
        assert!(s.contains("导入 1"));
        assert!(s.contains("跳过(重复) 2"));
    }
}
