// ==========================================
// ERP 导入引擎 - 列类型推断
// ==========================================
// 职责: 抽样列值 → date / currency / number / text
// 规则:
// - 只抽取非空值，最多 sample_size 个
// - 依次测试 日期 > 金额 > 数值，命中比例 ≥ 阈值即采纳
// - 全部不满足 → text
// ==========================================

use crate::domain::record::RawTable;
use crate::domain::types::PrimitiveType;
use once_cell::sync::Lazy;
use regex::Regex;

/// 默认抽样数
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// 默认采纳比例
pub const DEFAULT_MATCH_RATIO: f64 = 0.8;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}/\d{2}/\d{4}|\d{4}-\d{2}-\d{2})$").unwrap());

// 可选货币符号 + 千分位分组数字 + 小数逗号
static CURRENCY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\s*(R\$|US\$|\$|€)?\s*-?(\d{1,3}(\.\d{3})+|\d+),\d{1,2}$").unwrap()
});

pub fn looks_like_date(value: &str) -> bool {
    DATE_PATTERN.is_match(value.trim())
}

pub fn looks_like_currency(value: &str) -> bool {
    CURRENCY_PATTERN.is_match(value.trim())
}

pub fn looks_like_number(value: &str) -> bool {
    let normalized = value.trim().replace(',', ".");
    !normalized.is_empty() && normalized.parse::<f64>().is_ok_and(f64::is_finite)
}

// ==========================================
// TypeDetector
// ==========================================
#[derive(Debug, Clone)]
pub struct TypeDetector {
    sample_size: usize,
    match_ratio: f64,
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE, DEFAULT_MATCH_RATIO)
    }
}

impl TypeDetector {
    pub fn new(sample_size: usize, match_ratio: f64) -> Self {
        Self {
            sample_size: sample_size.max(1),
            match_ratio,
        }
    }

    /// 推断单列类型
    pub fn detect<'a, I>(&self, values: I) -> PrimitiveType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sample: Vec<&str> = values
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .take(self.sample_size)
            .collect();

        if sample.is_empty() {
            return PrimitiveType::Text;
        }

        let accepted = |test: fn(&str) -> bool| {
            let hits = sample.iter().filter(|&&v| test(v)).count();
            hits as f64 / sample.len() as f64 >= self.match_ratio
        };

        if accepted(looks_like_date) {
            PrimitiveType::Date
        } else if accepted(looks_like_currency) {
            PrimitiveType::Currency
        } else if accepted(looks_like_number) {
            PrimitiveType::Number
        } else {
            PrimitiveType::Text
        }
    }

    /// 推断整表每列类型（与表头同序）
    pub fn detect_table(&self, table: &RawTable) -> Vec<PrimitiveType> {
        (0..table.headers.len())
            .map(|col| self.detect(table.column_values(col)))
            .collect()
    }
}
