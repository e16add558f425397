// ==========================================
// ERP 导入引擎 - 命令行入口
// ==========================================
// 用法: erp-import <文件> [sales|customers|catalog]
// 写入默认数据库（ERP_IMPORT_DB_PATH 可覆盖），输出报告摘要
// ==========================================

use anyhow::{bail, Context};
use erp_import::app::{get_default_db_path, AppState, ImportSession};
use erp_import::importer::{read_text_file, ImportOptions, ImportPipeline};
use erp_import::Destination;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    erp_import::logging::init();

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        bail!("用法: erp-import <文件> [sales|customers|catalog]");
    };
    let destination_override = args
        .next()
        .map(|s| s.parse::<Destination>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    tracing::info!("{} v{}", erp_import::APP_NAME, erp_import::VERSION);

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let text = read_text_file(&file_path).with_context(|| format!("无法读取 {}", file_path))?;

    let suggestion = state
        .engine
        .suggest_mapping(&text, destination_override)
        .await?;
    if suggestion.ambiguous {
        eprintln!(
            "警告: 目标表判定置信度偏低 ({:.2})，建议人工指定目标表",
            suggestion.mapping.confidence
        );
    }
    for (header, field) in &suggestion.mapping.header_to_field {
        eprintln!("  {} → {}", header, field);
    }
    if !suggestion.unmapped_headers.is_empty() {
        eprintln!("  未映射: {}", suggestion.unmapped_headers.join(", "));
    }

    let session = ImportSession::new();
    let options = ImportOptions {
        destination_override,
        mapping_override: Some(suggestion.mapping),
    };
    let report = state
        .engine
        .run_import(&text, options, &session, &mut |p| {
            eprintln!("[{:>3}%] {}", p.percent, p.message);
        })
        .await?;

    println!("{}", report.summary());
    for error in &report.errors {
        println!("  - {}", error);
    }
    if report.errors_truncated {
        println!("  ...（更多错误已省略）");
    }

    Ok(())
}
