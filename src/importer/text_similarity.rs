// ==========================================
// ERP 导入引擎 - 表头文本相似度
// ==========================================
// 职责: 表头规范化（小写/去重音/去标点）+ 词元重叠打分
// 使用方: 目标表分类器、列映射器
// ==========================================
// 打分权重（只保证相对顺序: 精确 > 词元重叠 > 关键词 > 类型加分）
// ==========================================

use crate::importer::schema_registry::CanonicalField;
use once_cell::sync::Lazy;
use regex::Regex;
use strsim::jaro_winkler;

/// 规范化后完全相等的固定得分（主导项）
pub const EXACT_MATCH_SCORE: f64 = 10.0;

/// 表头与字段名/显示名的词元重叠权重
pub const NAME_SIMILARITY_WEIGHT: f64 = 3.0;

/// 表头与字段关键词的词元重叠权重
pub const KEYWORD_SIMILARITY_WEIGHT: f64 = 1.5;

/// 参与比较的最短词元长度（字符数）
pub const MIN_TOKEN_LEN: usize = 3;

/// 词元完全相同的得分
pub const EXACT_TOKEN_CREDIT: f64 = 1.0;

/// 词元仅部分重叠（子串 / 近似拼写）的得分
pub const PARTIAL_TOKEN_CREDIT: f64 = 0.5;

/// 近似拼写判定阈值（Jaro-Winkler）
pub const FUZZY_TOKEN_THRESHOLD: f64 = 0.92;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// 去除拉丁字母重音
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// 规范化: 小写 → 去重音 → 非字母数字替换为空格 → 合并空白
///
/// `"Número_da Nota "` → `"numero da nota"`
pub fn normalize(value: &str) -> String {
    let folded: String = value.to_lowercase().chars().map(fold_diacritic).collect();
    NON_WORD.replace_all(&folded, " ").trim().to_string()
}

/// 切分词元（去重，丢弃短词元）
pub fn tokens(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in normalize(value).split_whitespace() {
        if token.chars().count() >= MIN_TOKEN_LEN && !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// 词元重叠得分，范围 [0, 1]
///
/// 以 source 为基准: 每个 source 词元取其在 target 中的最好匹配，
/// 完全相同记 1.0，子串或近似拼写记 0.5，最后按 source 词元数取平均。
pub fn token_overlap(source: &[String], target: &[String]) -> f64 {
    if source.is_empty() || target.is_empty() {
        return 0.0;
    }

    let total: f64 = source
        .iter()
        .map(|token| {
            if target.iter().any(|t| t == token) {
                EXACT_TOKEN_CREDIT
            } else if target
                .iter()
                .any(|t| t.contains(token.as_str()) || token.contains(t.as_str()))
            {
                PARTIAL_TOKEN_CREDIT
            } else if target
                .iter()
                .any(|t| jaro_winkler(t, token) >= FUZZY_TOKEN_THRESHOLD)
            {
                PARTIAL_TOKEN_CREDIT
            } else {
                0.0
            }
        })
        .sum();

    total / source.len() as f64
}

/// 表头对单个标准字段的文本得分拆解
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextScore {
    pub exact: bool,
    pub name: f64,
    pub keyword: f64,
}

impl TextScore {
    /// 加权合计（不含类型加分）
    pub fn weighted(&self) -> f64 {
        let exact = if self.exact { EXACT_MATCH_SCORE } else { 0.0 };
        exact + NAME_SIMILARITY_WEIGHT * self.name + KEYWORD_SIMILARITY_WEIGHT * self.keyword
    }
}

/// 规范化表头是否与字段名或显示名完全相同
pub fn is_exact_match(normalized_header: &str, field: &CanonicalField) -> bool {
    !normalized_header.is_empty()
        && (normalized_header == normalize(field.name)
            || normalized_header == normalize(field.label))
}

/// 计算表头对字段的文本得分
pub fn score_header(header: &str, field: &CanonicalField) -> TextScore {
    let normalized = normalize(header);
    let header_tokens = tokens(header);

    let name_tokens = tokens(&format!("{} {}", field.name, field.label));
    let keyword_tokens = tokens(&field.keywords.join(" "));

    TextScore {
        exact: is_exact_match(&normalized, field),
        name: token_overlap(&header_tokens, &name_tokens),
        keyword: token_overlap(&header_tokens, &keyword_tokens),
    }
}
