// ==========================================
// ERP 导入引擎 - 分隔文本解析器
// ==========================================
// 职责: 原始文本 → 表头 + 数据行
// 规则:
// - 分隔符: 首行中 ';' 多于 ',' 时取 ';'，否则取 ','
// - 双引号内的分隔符不切分，引号本身剥离
// - 空白记录丢弃（引号内的换行与空行属于单元格）；首个非空记录为表头
// - 短行补空串到表头列数，超长行截断
// ==========================================

use crate::domain::record::RawTable;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::TableParser;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// 候选分隔符
pub const COMMA: char = ',';
pub const SEMICOLON: char = ';';

/// 统计首行分隔符出现次数，择多者（平局取逗号）
pub fn detect_delimiter(first_line: &str) -> char {
    let commas = first_line.matches(COMMA).count();
    let semicolons = first_line.matches(SEMICOLON).count();
    if semicolons > commas {
        SEMICOLON
    } else {
        COMMA
    }
}

// ==========================================
// DelimitedTextParser
// ==========================================
pub struct DelimitedTextParser;

impl TableParser for DelimitedTextParser {
    fn parse(&self, text: &str) -> ImportResult<RawTable> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let first_line = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or(ImportError::EmptyInput)?;
        let delimiter = detect_delimiter(first_line);
        debug!(delimiter = %delimiter, "分隔符识别完成");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter as u8)
            .from_reader(text.as_bytes());

        // 空白行按记录丢弃，引号内的空行保留在单元格中
        let mut records = reader.records().filter(|result| match result {
            Ok(record) => record.iter().any(|field| !field.trim().is_empty()),
            Err(_) => true,
        });

        let headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(ImportError::EmptyInput),
        };
        let width = headers.len();

        let mut rows = Vec::new();
        for result in records {
            let record = result?;
            let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
            if record.len() > width {
                debug!(row = rows.len(), extra = record.len() - width, "超长行已截断");
            }
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(RawTable {
            delimiter,
            headers,
            rows,
        })
    }
}

/// 读取 UTF-8 文本文件
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> ImportResult<String> {
    let path = file_path.as_ref();
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

impl DelimitedTextParser {
    /// 读取 UTF-8 文件并解析
    pub fn parse_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawTable> {
        let text = read_text_file(file_path)?;
        self.parse(&text)
    }
}
