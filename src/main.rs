// ==========================================
// InsightStore - 命令行入口
// ==========================================
// 用法: insight-store <file> [db_path] [owner_id] [append|replace]
// 输出: 导入报告 + 落库统计（JSON，stdout）
// ==========================================

use anyhow::{Context, Result};
use insight_store::config::{ConfigManager, ImportConfig};
use insight_store::db::{get_default_db_path, open_sqlite_connection};
use insight_store::domain::PersistMode;
use insight_store::importer::{StoreImporter, StoreImporterImpl};
use insight_store::repository::{StoreRepository, StoreRepositoryImpl};
use insight_store::{i18n, logging};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

const DEFAULT_OWNER_ID: &str = "local";

fn print_usage() {
    eprintln!("{} {}", insight_store::APP_NAME, insight_store::VERSION);
    eprintln!();
    eprintln!("用法: insight-store <file> [db_path] [owner_id] [append|replace]");
    eprintln!("  file      .csv / .xlsx / .xlsm / .xls / .xlsb / .ods");
    eprintln!("  db_path   默认: $INSIGHT_STORE_DB_PATH 或用户数据目录");
    eprintln!("  owner_id  默认: {}", DEFAULT_OWNER_ID);
    eprintln!("  mode      默认: append");
}

async fn run(args: Vec<String>) -> Result<()> {
    let file_path = &args[0];
    let db_path = args.get(1).cloned().unwrap_or_else(get_default_db_path);
    let owner_id = args.get(2).map(String::as_str).unwrap_or(DEFAULT_OWNER_ID);
    let mode = match args.get(3) {
        Some(raw) => raw.parse::<PersistMode>().map_err(anyhow::Error::msg)?,
        None => PersistMode::default(),
    };

    info!(file = %file_path, db_path = %db_path, owner_id = %owner_id, mode = ?mode, "InsightStore 启动");

    // 配置与仓储共享同一连接
    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    let conn = Arc::new(Mutex::new(conn));
    let config_manager = ConfigManager::from_connection(conn.clone())?;
    let repo = StoreRepositoryImpl::from_connection(conn)?;

    let config = ImportConfig::load(&config_manager).await?;
    i18n::set_locale(&config.locale);

    let importer = StoreImporterImpl::new(config);
    let outcome = importer.import_file(file_path).await?;
    let summary = repo.save(owner_id, &outcome.data, mode).await?;

    let output = json!({
        "report": outcome.report,
        "persist": summary,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        std::process::exit(2);
    }

    if let Err(e) = run(args).await {
        error!(error = %e, "导入失败");
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
