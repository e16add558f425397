// ==========================================
// 导入流水线集成测试（SQLite 存储）
// ==========================================
// 测试目标: 解析 → 映射 → 预览 → 去重 → 分批落库 全流程
// ==========================================


use erp_import::config::config_keys;
use erp_import::domain::{Destination, FieldValue};
use erp_import::importer::{read_text_file, ImportError, ImportOptions, ImportPipeline};
use erp_import::logging;
use erp_import::repository::RecordStore;
use erp_import::ImportSession;
use std::io::Write;
use tempfile::NamedTempFile;
use test_helpers::{create_sqlite_engine, create_test_db, sales_csv, sales_record};

const SALES_FILE: &str = "Nota,Data,Valor\n\
100,25/12/2023,\"R$ 10,00\"\n\
101,26/12/2023,\"R$ 20,00\"\n\
100,27/12/2023,\"R$ 5,00\"\n";

#[tokio::test]
async fn test_sales_file_against_existing_invoice() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    engine
        .store()
        .insert_many(Destination::Sales, vec![sales_record("100")])
        .await
        .unwrap();

    // 映射建议
    let suggestion = engine.suggest_mapping(SALES_FILE, None).await.unwrap();
    let mapping = suggestion.mapping;
    assert_eq!(mapping.destination, Destination::Sales);
    assert_eq!(mapping.field_for("Nota"), Some("invoice_number"));
    assert_eq!(mapping.field_for("Data"), Some("issue_date"));
    assert_eq!(mapping.field_for("Valor"), Some("total_amount"));

    // 预览: 第 1、3 行重复
    let preview = engine.preview(SALES_FILE, &mapping, None).await.unwrap();
    assert_eq!(preview.len(), 3);
    let duplicates: Vec<bool> = preview.iter().map(|p| p.duplicate.is_duplicate).collect();
    assert_eq!(duplicates, vec![true, false, true]);
    assert!(preview[0]
        .duplicate
        .reason
        .as_deref()
        .unwrap()
        .contains("100"));
    assert_eq!(
        preview[1].row.get("issue_date"),
        &FieldValue::Text("2023-12-26".to_string())
    );

    // 预览不写库
    assert_eq!(engine.store().count(Destination::Sales).unwrap(), 1);

    // 正式导入
    let mut percents = Vec::new();
    let report = engine
        .run_import(
            SALES_FILE,
            ImportOptions {
                destination_override: None,
                mapping_override: Some(mapping),
            },
            &ImportSession::new(),
            &mut |p| percents.push(p.percent),
        )
        .await
        .unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.outcome.inserted_count, 1);
    assert_eq!(report.skipped_duplicate, 2);
    assert_eq!(report.skipped_invalid, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(percents, vec![100]);

    let store = engine.store();
    assert_eq!(store.count(Destination::Sales).unwrap(), 2);
    assert_eq!(
        store
            .get_value(Destination::Sales, "101", "total_amount")
            .unwrap(),
        Some(FieldValue::Number(20.0))
    );
    assert_eq!(
        store
            .get_value(Destination::Sales, "101", "issue_date")
            .unwrap(),
        Some(FieldValue::Text("2023-12-26".to_string()))
    );
}

#[tokio::test]
async fn test_reimport_same_file_is_all_duplicates() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    let text = sales_csv(1, 5);

    let first = engine
        .run_import(&text, ImportOptions::default(), &ImportSession::new(), &mut |_| {})
        .await
        .unwrap();
    assert_eq!(first.inserted, 5);

    let second = engine
        .run_import(&text, ImportOptions::default(), &ImportSession::new(), &mut |_| {})
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 5);
    assert_eq!(engine.store().count(Destination::Sales).unwrap(), 5);
}

#[tokio::test]
async fn test_batch_size_from_config() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    engine
        .config()
        .set_config_value(config_keys::BATCH_SIZE, "2")
        .unwrap();

    let mut percents = Vec::new();
    let report = engine
        .run_import(
            &sales_csv(10, 5),
            ImportOptions::default(),
            &ImportSession::new(),
            &mut |p| percents.push(p.percent),
        )
        .await
        .unwrap();

    assert_eq!(report.inserted, 5);
    assert_eq!(report.outcome.batches_total, 3);
    assert_eq!(report.outcome.batches_completed, 3);
    assert_eq!(percents, vec![33, 66, 100]);
}

#[tokio::test]
async fn test_repeated_key_within_file_fails_its_batch() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    engine
        .config()
        .set_config_value(config_keys::BATCH_SIZE, "1")
        .unwrap();

    let text = "Nota;Data;Valor\n200;01/03/2024;10\n200;02/03/2024;20\n";
    let report = engine
        .run_import(text, ImportOptions::default(), &ImportSession::new(), &mut |_| {})
        .await
        .unwrap();

    // 文件内重复不做去重，第二批触发唯一约束
    assert_eq!(report.skipped_duplicate, 0);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outcome.failed_rows[0].row_index, 1);
    assert!(report.errors[0].starts_with("第 2 行写入失败"));
    assert_eq!(
        engine
            .store()
            .get_value(Destination::Sales, "200", "total_amount")
            .unwrap(),
        Some(FieldValue::Number(10.0))
    );
}

#[tokio::test]
async fn test_invalid_config_value_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    engine
        .config()
        .set_config_value(config_keys::BATCH_SIZE, "0")
        .unwrap();

    let result = engine
        .run_import(
            &sales_csv(1, 2),
            ImportOptions::default(),
            &ImportSession::new(),
            &mut |_| {},
        )
        .await;
    match result {
        Err(ImportError::ConfigValueError { key, .. }) => assert_eq!(key, config_keys::BATCH_SIZE),
        other => panic!("期望 ConfigValueError，实际: {:?}", other.map(|r| r.inserted)),
    }
    assert_eq!(engine.store().count(Destination::Sales).unwrap(), 0);
}

#[tokio::test]
async fn test_customer_file_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "CPF/CNPJ;Razão Social;E-mail;Cidade;UF").unwrap();
    writeln!(file, "123.456.789-09;Maria Souza;maria@example.com;Recife;PE").unwrap();
    writeln!(file, "12.345.678/0001-90;Loja Azul Ltda;contato@azul.com;Natal;RN").unwrap();
    writeln!(file, ";Sem Documento;x@example.com;Natal;RN").unwrap();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    let text = read_text_file(file.path()).unwrap();

    let suggestion = engine.suggest_mapping(&text, None).await.unwrap();
    assert_eq!(suggestion.mapping.destination, Destination::Customers);

    let report = engine
        .run_import(&text, ImportOptions::default(), &ImportSession::new(), &mut |_| {})
        .await
        .unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped_invalid, 1);
    assert!(report.errors[0].starts_with("第 3 行校验失败"));

    // 证件号只保留数字
    assert_eq!(
        engine
            .store()
            .get_value(Destination::Customers, "12345678000190", "name")
            .unwrap(),
        Some(FieldValue::Text("Loja Azul Ltda".to_string()))
    );
}

#[tokio::test]
async fn test_tax_id_without_digits_does_not_fail_batch() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let engine = create_sqlite_engine(&db_path).unwrap();
    let text = "CNPJ;Razão Social\n\
11.111.111/0001-11;Alfa\n\
ISENTO;Beta\n\
22.222.222/0001-22;Gama\n";

    let report = engine
        .run_import(text, ImportOptions::default(), &ImportSession::new(), &mut |_| {})
        .await
        .unwrap();

    assert_eq!(report.destination, Destination::Customers);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.failed, 0);
    assert!(report.errors[0].starts_with("第 2 行校验失败"));
    assert!(report.errors[0].contains("ISENTO"));
    assert_eq!(engine.store().count(Destination::Customers).unwrap(), 2);
    assert_eq!(
        engine
            .store()
            .get_value(Destination::Customers, "22222222000122", "name")
            .unwrap(),
        Some(FieldValue::Text("Gama".to_string()))
    );
}

#[test]
fn test_missing_file_reported() {
    let err = read_text_file("/nonexistent/erp/export.csv").unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}
