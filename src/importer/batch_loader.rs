// ==========================================
// ERP 导入引擎 - 分批落库
// ==========================================
// 职责: 将通过校验且不重复的记录按固定批大小写入存储
// 规则:
// - 批次严格顺序执行，一批完成后才发下一批
// - 单批失败: 该批所有行记入 failed_rows，继续下一批
// - 存储不可达: 中止作业，错误抛给调用方
// - 取消: 只在批次之间检查，返回已累计的结果
// - 每批完成后回调进度（百分比单调递增）
// ==========================================

use crate::app::session::ImportSession;
use crate::domain::canonical::CanonicalRecord;
use crate::domain::record::{FailedRow, ImportOutcome, ProgressUpdate};
use crate::domain::types::Destination;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::record_store::RecordStore;
use tracing::{debug, info, warn};

/// 待写入的一行
#[derive(Debug, Clone)]
pub struct LoadItem {
    pub row_index: usize,
    pub record: CanonicalRecord,
    /// 原始行（JSON），失败时原样保留
    pub raw_data: String,
}

pub struct BatchLoader {
    batch_size: usize,
}

impl BatchLoader {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.batch_size)
    }

    /// 分批写入
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 含插入数、失败行、完成批次数、是否取消
    /// - Err(StoreUnavailable): 存储不可达，已完成批次的数据保留在存储中
    pub async fn load<S>(
        &self,
        store: &S,
        destination: Destination,
        items: Vec<LoadItem>,
        session: &ImportSession,
        progress: &mut (dyn FnMut(ProgressUpdate) + Send),
    ) -> ImportResult<ImportOutcome>
    where
        S: RecordStore + ?Sized,
    {
        let batches_total = self.batch_count(items.len());
        let mut outcome = ImportOutcome {
            batches_total,
            ..ImportOutcome::default()
        };

        if batches_total == 0 {
            progress(ProgressUpdate {
                batches_completed: 0,
                batches_total: 0,
                percent: 100,
                message: "没有可写入的行".to_string(),
            });
            return Ok(outcome);
        }

        for (batch_idx, batch) in items.chunks(self.batch_size).enumerate() {
            if session.is_cancelled() {
                info!(
                    job_id = %session.job_id(),
                    batches_completed = outcome.batches_completed,
                    batches_total,
                    "作业已取消，停止后续批次"
                );
                outcome.cancelled = true;
                break;
            }

            let records: Vec<CanonicalRecord> =
                batch.iter().map(|item| item.record.clone()).collect();

            let message = match store.insert_many(destination, records).await {
                Ok(inserted) => {
                    outcome.inserted_count += inserted;
                    debug!(batch = batch_idx + 1, inserted, "批次写入成功");
                    format!("第 {}/{} 批完成: 写入 {} 行", batch_idx + 1, batches_total, inserted)
                }
                Err(e) if e.is_unreachable() => {
                    warn!(batch = batch_idx + 1, error = %e, "存储不可达，中止作业");
                    return Err(ImportError::StoreUnavailable(e.to_string()));
                }
                Err(e) => {
                    warn!(
                        batch = batch_idx + 1,
                        rows = batch.len(),
                        error = %e,
                        "批次写入失败，继续下一批"
                    );
                    let error = e.to_string();
                    outcome
                        .failed_rows
                        .extend(batch.iter().map(|item| FailedRow {
                            row_index: item.row_index,
                            error: error.clone(),
                            raw_data: item.raw_data.clone(),
                        }));
                    format!("第 {}/{} 批失败: {}", batch_idx + 1, batches_total, error)
                }
            };

            outcome.batches_completed = batch_idx + 1;
            progress(ProgressUpdate {
                batches_completed: outcome.batches_completed,
                batches_total,
                percent: ((outcome.batches_completed * 100) / batches_total) as u8,
                message,
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::canonical::CatalogItem;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// 第 fail_on 次调用返回错误（从 1 开始）
    struct ScriptedStore {
        calls: Mutex<usize>,
        fail_on: Option<usize>,
        unreachable: bool,
    }

    #[async_trait]
    impl RecordStore for ScriptedStore {
        async fn exists_by_key(
            &self,
            _destination: Destination,
            _key_field: &str,
            _values: &[String],
        ) -> RepositoryResult<HashSet<String>> {
            Ok(HashSet::new())
        }

        async fn insert_many(
            &self,
            _destination: Destination,
            records: Vec<CanonicalRecord>,
        ) -> RepositoryResult<usize> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if Some(*calls) == self.fail_on {
                return Err(if self.unreachable {
                    RepositoryError::DatabaseConnectionError("offline".into())
                } else {
                    RepositoryError::UniqueConstraintViolation("catalog.product_code".into())
                });
            }
            Ok(records.len())
        }
    }

    fn items(n: usize) -> Vec<LoadItem> {
        (0..n)
            .map(|i| LoadItem {
                row_index: i,
                record: CanonicalRecord::CatalogItem(CatalogItem {
                    product_code: Some(format!("P{}", i)),
                    description: Some("Item".into()),
                    category: None,
                    brand: None,
                    unit: None,
                    sale_price: None,
                    cost_price: None,
                    stock_quantity: None,
                    barcode: None,
                }),
                raw_data: format!("{{\"SKU\":\"P{}\"}}", i),
            })
            .collect()
    }

    fn store(fail_on: Option<usize>, unreachable: bool) -> ScriptedStore {
        ScriptedStore {
            calls: Mutex::new(0),
            fail_on,
            unreachable,
        }
    }

    #[tokio::test]
    async fn test_failed_batch_isolated() {
        let store = store(Some(3), false);
        let mut updates = Vec::new();
        let outcome = BatchLoader::new(10)
            .load(
                &store,
                Destination::Catalog,
                items(50),
                &ImportSession::new(),
                &mut |u| updates.push(u),
            )
            .await
            .unwrap();

        assert_eq!(outcome.inserted_count, 40);
        assert_eq!(outcome.batches_completed, 5);
        let failed: Vec<usize> = outcome.failed_rows.iter().map(|f| f.row_index).collect();
        assert_eq!(failed, (20..30).collect::<Vec<_>>());
        assert!(outcome.failed_rows[0].raw_data.contains("P20"));

        let percents: Vec<u8> = updates.iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![20, 40, 60, 80, 100]);
    }

    #[tokio::test]
    async fn test_unreachable_store_aborts() {
        let store = store(Some(2), true);
        let result = BatchLoader::new(10)
            .load(
                &store,
                Destination::Catalog,
                items(30),
                &ImportSession::new(),
                &mut |_| {},
            )
            .await;
        assert!(matches!(result, Err(ImportError::StoreUnavailable(_))));
        assert_eq!(*store.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancel_between_batches_keeps_progress() {
        let store = store(None, false);
        let session = ImportSession::new();
        let handle = session.clone();
        let outcome = BatchLoader::new(10)
            .load(&store, Destination::Catalog, items(30), &session, &mut |u| {
                if u.batches_completed == 1 {
                    handle.cancel();
                }
            })
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.inserted_count, 10);
        assert_eq!(outcome.batches_completed, 1);
        assert_eq!(outcome.batches_total, 3);
    }

    #[tokio::test]
    async fn test_empty_input_reports_complete() {
        let store = store(None, false);
        let mut last = None;
        let outcome = BatchLoader::new(100)
            .load(
                &store,
                Destination::Catalog,
                Vec::new(),
                &ImportSession::new(),
                &mut |u| last = Some(u),
            )
            .await
            .unwrap();
        assert_eq!(outcome.inserted_count, 0);
        assert_eq!(last.map(|u| u.percent), Some(100));
        assert_eq!(*store.calls.lock().unwrap(), 0);
    }
}
