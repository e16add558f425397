// ==========================================
// 分批落库与重复检测集成测试（内存存储）
// ==========================================
// 测试目标: 批次失败隔离 / 存储不可达中止 / 协作式取消 / 自然键去重
// ==========================================


use erp_import::config::DefaultImportConfig;
use erp_import::domain::Destination;
use erp_import::importer::{
    schema_for, BatchLoader, ImportEngine, ImportError, ImportOptions, ImportPipeline, LoadItem,
};
use erp_import::ImportSession;
use test_helpers::{sales_csv, sales_record, InsertFailure, ProgressLog, ScriptedStore};

fn engine(store: ScriptedStore) -> ImportEngine<ScriptedStore, DefaultImportConfig> {
    ImportEngine::new(store, DefaultImportConfig)
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_job() {
    let engine = engine(ScriptedStore::default().fail_on(2, InsertFailure::Constraint));
    let mut log = ProgressLog::default();

    let report = engine
        .run_import(
            &sales_csv(1, 500),
            ImportOptions::default(),
            &ImportSession::new(),
            &mut |p| log.updates.push(p),
        )
        .await
        .unwrap();

    assert_eq!(report.total_rows, 500);
    assert_eq!(report.inserted, 400);
    assert_eq!(report.failed, 100);
    assert_eq!(log.percents(), vec![20, 40, 60, 80, 100]);

    // 第 3 批（行 200..300）整体失败
    let failed: Vec<usize> = report
        .outcome
        .failed_rows
        .iter()
        .map(|f| f.row_index)
        .collect();
    assert_eq!(failed, (200..300).collect::<Vec<_>>());
    assert!(report.outcome.failed_rows[0].error.contains("UNIQUE"));
    assert!(report.outcome.failed_rows[0].raw_data.contains("\"Nota\":\"201\""));

    // 错误列表有上限
    assert_eq!(report.errors.len(), 50);
    assert!(report.errors_truncated);

    let calls = engine.store().insert_calls.lock().unwrap().clone();
    assert_eq!(calls, vec![100; 5]);
}

#[tokio::test]
async fn test_unreachable_store_aborts_job() {
    let engine = engine(ScriptedStore::default().fail_on(1, InsertFailure::Unreachable));

    let result = engine
        .run_import(
            &sales_csv(1, 250),
            ImportOptions::default(),
            &ImportSession::new(),
            &mut |_| {},
        )
        .await;

    assert!(matches!(result, Err(ImportError::StoreUnavailable(_))));
    // 已完成批次保留
    assert_eq!(engine.store().stored_keys().len(), 100);
    assert_eq!(engine.store().insert_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_between_batches_keeps_progress() {
    let engine = engine(ScriptedStore::default());
    let session = ImportSession::with_job_id("job-cancel");
    let handle = session.clone();
    let mut percents = Vec::new();

    let report = engine
        .run_import(
            &sales_csv(1, 300),
            ImportOptions::default(),
            &session,
            &mut |p| {
                percents.push(p.percent);
                handle.cancel();
            },
        )
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.job_id, "job-cancel");
    assert_eq!(report.inserted, 100);
    assert_eq!(report.outcome.batches_completed, 1);
    assert_eq!(report.outcome.batches_total, 3);
    assert_eq!(percents, vec![33]);
    assert!(report.summary().contains("作业已取消"));
}

#[tokio::test]
async fn test_trimmed_key_matches_existing_record() {
    let engine = engine(ScriptedStore::with_existing(&["1001"]));
    let text = "Nota;Data;Valor\n 1001 ;01/01/2024;10\n1002;01/01/2024;20\n";

    let suggestion = engine.suggest_mapping(text, None).await.unwrap();
    let preview = engine
        .preview(text, &suggestion.mapping, None)
        .await
        .unwrap();

    assert!(preview[0].duplicate.is_duplicate);
    assert!(!preview[1].duplicate.is_duplicate);
    assert_eq!(preview[1].duplicate.reason, None);

    // 预览只查询，不写入
    assert!(engine.store().insert_calls.lock().unwrap().is_empty());
    assert_eq!(engine.store().exists_calls.lock().unwrap().clone(), vec![2]);
}

#[tokio::test]
async fn test_loader_directly_with_small_batches() {
    let store = ScriptedStore::default().fail_on(0, InsertFailure::Constraint);
    let items: Vec<LoadItem> = (0..5)
        .map(|i| LoadItem {
            row_index: i,
            record: sales_record(&format!("A{}", i)),
            raw_data: "{}".to_string(),
        })
        .collect();

    let mut log = ProgressLog::default();
    let outcome = BatchLoader::new(2)
        .load(
            &store,
            schema_for(Destination::Sales).destination,
            items,
            &ImportSession::new(),
            &mut |p| log.updates.push(p),
        )
        .await
        .unwrap();

    assert_eq!(outcome.batches_total, 3);
    assert_eq!(outcome.batches_completed, 3);
    assert_eq!(outcome.inserted_count, 3);
    assert_eq!(outcome.failed_rows.len(), 2);
    assert_eq!(log.percents(), vec![33, 66, 100]);
    assert!(!store.stored_keys().contains("A0"));
    assert!(store.stored_keys().contains("A4"));
}
