// ==========================================
// ERP 导入引擎 - 重复检测器
// ==========================================
// 职责: 按自然键检测与已落库记录的重复
// 规则:
// - 收集非空、去首尾空白后的去重键值，按块批量查询存储
// - 键在存储返回集合中 → 标记重复
// - 空键不标记（交给必填校验）
// - 文件内部重复键不标记（只认存储中已存在的键）
// 红线: 不写存储
// ==========================================

use crate::domain::record::{DuplicateFlag, TransformedRow};
use crate::domain::types::FieldValue;
use crate::importer::error::ImportResult;
use crate::importer::schema_registry::SchemaDefinition;
use crate::repository::record_store::RecordStore;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// 行的自然键（去首尾空白，空值为 None）
pub fn natural_key_of(row: &TransformedRow, schema: &SchemaDefinition) -> Option<String> {
    let key = match row.get(schema.natural_key) {
        FieldValue::Null => return None,
        other => other.to_raw(),
    };
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub struct DuplicateDetector {
    chunk_size: usize,
}

impl DuplicateDetector {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// 检测重复（与 rows 同序，每行一个标记）
    ///
    /// # 返回
    /// - Err: 存储查询失败（不可达或查询错误），作业无法判断重复
    pub async fn detect<S>(
        &self,
        store: &S,
        schema: &SchemaDefinition,
        rows: &[TransformedRow],
    ) -> ImportResult<Vec<DuplicateFlag>>
    where
        S: RecordStore + ?Sized,
    {
        let keys: Vec<String> = rows
            .iter()
            .filter_map(|row| natural_key_of(row, schema))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut existing: HashSet<String> = HashSet::new();
        for chunk in keys.chunks(self.chunk_size) {
            let found = store
                .exists_by_key(schema.destination, schema.natural_key, chunk)
                .await?;
            existing.extend(found.into_iter().map(|k| k.trim().to_string()));
        }

        debug!(
            destination = %schema.destination,
            distinct_keys = keys.len(),
            existing = existing.len(),
            "重复检测完成"
        );

        Ok(rows
            .iter()
            .map(|row| match natural_key_of(row, schema) {
                Some(key) if existing.contains(&key) => DuplicateFlag {
                    row_index: row.row_index,
                    is_duplicate: true,
                    reason: Some(format!("自然键 {} = {} 已存在", schema.natural_key, key)),
                },
                _ => DuplicateFlag::clear(row.row_index),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::canonical::CanonicalRecord;
    use crate::domain::types::Destination;
    use crate::importer::schema_registry::SALES_SCHEMA;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct KeyStore {
        keys: HashSet<String>,
        calls: Mutex<Vec<usize>>,
        fail: bool,
    }

    impl KeyStore {
        fn with_keys(keys: &[&str]) -> Self {
            Self {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl RecordStore for KeyStore {
        async fn exists_by_key(
            &self,
            _destination: Destination,
            _key_field: &str,
            values: &[String],
        ) -> RepositoryResult<HashSet<String>> {
            if self.fail {
                return Err(RepositoryError::DatabaseConnectionError("down".into()));
            }
            self.calls.lock().unwrap().push(values.len());
            Ok(values.iter().filter(|v| self.keys.contains(*v)).cloned().collect())
        }

        async fn insert_many(
            &self,
            _destination: Destination,
            _records: Vec<CanonicalRecord>,
        ) -> RepositoryResult<usize> {
            panic!("duplicate detection must not write");
        }
    }

    fn row(index: usize, invoice: &str) -> TransformedRow {
        let mut values = BTreeMap::new();
        let value = if invoice.is_empty() {
            FieldValue::Null
        } else {
            FieldValue::Text(invoice.to_string())
        };
        values.insert("invoice_number".to_string(), value);
        TransformedRow {
            row_index: index,
            destination: Destination::Sales,
            values,
        }
    }

    #[tokio::test]
    async fn test_whitespace_key_flagged_duplicate() {
        let store = KeyStore::with_keys(&["1001"]);
        let rows = vec![row(0, " 1001 "), row(1, "1002"), row(2, "")];
        let flags = DuplicateDetector::new(500)
            .detect(&store, &SALES_SCHEMA, &rows)
            .await
            .unwrap();

        assert!(flags[0].is_duplicate);
        assert!(flags[0].reason.as_deref().unwrap().contains("1001"));
        assert!(!flags[1].is_duplicate);
        assert!(!flags[2].is_duplicate);
        assert_eq!(flags[2].reason, None);
    }

    #[tokio::test]
    async fn test_distinct_keys_queried_in_chunks() {
        let store = KeyStore::with_keys(&[]);
        let rows: Vec<_> = (0..7).map(|i| row(i, &format!("{}", i % 5))).collect();
        DuplicateDetector::new(2)
            .detect(&store, &SALES_SCHEMA, &rows)
            .await
            .unwrap();

        // 5 个不同键，每块 2 个
        assert_eq!(*store.calls.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_no_query_without_keys() {
        let store = KeyStore::with_keys(&["1"]);
        let flags = DuplicateDetector::new(10)
            .detect(&store, &SALES_SCHEMA, &[row(0, "")])
            .await
            .unwrap();
        assert!(store.calls.lock().unwrap().is_empty());
        assert!(!flags[0].is_duplicate);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = KeyStore::with_keys(&[]);
        store.fail = true;
        let result = DuplicateDetector::new(10)
            .detect(&store, &SALES_SCHEMA, &[row(0, "1")])
            .await;
        assert!(matches!(
            result,
            Err(crate::importer::error::ImportError::StoreUnavailable(_))
        ));
    }
}
