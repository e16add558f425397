// ==========================================
// ERP 导入引擎 - 目标表分类器
// ==========================================
// 职责: 用全部表头对三张目标表打分，选出最匹配的目标表
// 打分: 每个 (表头, 字段) 对 = 精确匹配 + 加权字段名重叠 + 加权关键词重叠，按目标表求和
// 置信度: (第一名 - 第二名) / 第一名；第一名为 0 时置信度为 0
// ==========================================

use crate::domain::types::Destination;
use crate::importer::schema_registry::{all_schemas, SchemaDefinition};
use crate::importer::text_similarity::score_header;
use serde::{Deserialize, Serialize};

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub destination: Destination,
    pub confidence: f64,
    /// 各目标表总分（Destination::ALL 顺序）
    pub scores: Vec<(Destination, f64)>,
}

impl Classification {
    pub fn score_of(&self, destination: Destination) -> f64 {
        self.scores
            .iter()
            .find(|(d, _)| *d == destination)
            .map(|(_, s)| *s)
            .unwrap_or(0.0)
    }
}

pub struct DestinationClassifier;

impl DestinationClassifier {
    /// 单张目标表总分
    pub fn score_schema(&self, headers: &[String], schema: &SchemaDefinition) -> f64 {
        headers
            .iter()
            .flat_map(|header| {
                schema
                    .fields
                    .iter()
                    .map(move |field| score_header(header, field).weighted())
            })
            .sum()
    }

    /// 分类（平局按 Destination::ALL 顺序取先者）
    pub fn classify(&self, headers: &[String]) -> Classification {
        let scores: Vec<(Destination, f64)> = all_schemas()
            .iter()
            .map(|schema| (schema.destination, self.score_schema(headers, schema)))
            .collect();

        let mut ranked = scores.clone();
        // 稳定排序，平局保持原有顺序
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (destination, top) = ranked[0];
        let second = ranked.get(1).map(|(_, s)| *s).unwrap_or(0.0);

        let confidence = if top > 0.0 {
            ((top - second) / top).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Classification {
            destination,
            confidence,
            scores,
        }
    }
}
