// ==========================================
// 导入器端到端集成测试
// ==========================================
// 测试目标: 文件 → 导入 → 落库 → 读取；批量导入；持久化配置覆盖
// ==========================================

mod test_helpers;

use insight_store::config::{config_keys, ConfigManager, ImportConfig};
use insight_store::db::open_sqlite_connection;
use insight_store::domain::PersistMode;
use insight_store::importer::{ImportError, StoreImporter, StoreImporterImpl};
use insight_store::repository::{StoreRepository, StoreRepositoryImpl, DEFAULT_SALES_LIMIT};
use std::sync::{Arc, Mutex};
use test_helpers::{create_test_db, write_temp_file};

const SALES_CSV: &str = "\
Código;Produto;Categoria;Preço;Estoque;Data;Qtd
P001;Camiseta;Roupas;60,00;50;01/10/2023;2
P001;Camiseta;Roupas;60,00;48;03/10/2023;1
P002;Caneca;;15,5;;02/10/2023;4
";

#[tokio::test]
async fn test_import_file_and_persist() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let csv_file = write_temp_file(SALES_CSV.as_bytes(), ".csv");

    let importer = StoreImporterImpl::new(ImportConfig::default());
    let outcome = importer.import_file(csv_file.path()).await.unwrap();

    assert_eq!(outcome.report.products, 2);
    assert_eq!(outcome.report.sales, 3);
    assert_eq!(outcome.report.rejected_rows, 0);

    let repo = StoreRepositoryImpl::new(&db_path).unwrap();
    repo.save("loja-1", &outcome.data, PersistMode::Replace)
        .await
        .unwrap();

    let loaded = repo
        .load("loja-1", DEFAULT_SALES_LIMIT)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loaded.products.len(), 2);
    assert_eq!(loaded.products[1].category, "General");
    assert_eq!(loaded.inventory[0].quantity, 48);
    assert_eq!(loaded.inventory[1].quantity, 0);

    let totals: Vec<f64> = loaded.sales.iter().map(|s| s.total).collect();
    assert_eq!(totals, vec![60.0, 62.0, 120.0]);
}

#[tokio::test]
async fn test_batch_import_preserves_input_order() {
    let good = write_temp_file(b"codigo,produto\nP001,A\n", ".csv");
    let no_products = write_temp_file(b"foo,bar\n1,2\n", ".csv");
    let unsupported = write_temp_file(b"irrelevant", ".json");

    let importer = StoreImporterImpl::new(ImportConfig::default());
    let paths = vec![
        good.path().to_path_buf(),
        no_products.path().to_path_buf(),
        unsupported.path().to_path_buf(),
        std::path::PathBuf::from("/nonexistent/dir/vendas.csv"),
    ];

    let results = importer.batch_import(paths).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap().report.products, 1);
    assert!(matches!(
        results[1],
        Err(ImportError::NoValidProducts { ref columns }) if columns == &["foo", "bar"]
    ));
    assert!(matches!(results[2], Err(ImportError::UnsupportedFormat(_))));
    assert!(matches!(results[3], Err(ImportError::FileNotFound(_))));
}

#[tokio::test]
async fn test_persisted_config_overrides_defaults() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));
    let config_manager = ConfigManager::from_connection(conn).unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_CATEGORY, "Diversos")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_MIN_STOCK, "0")
        .unwrap();

    let importer = StoreImporterImpl::new(config_manager);
    let outcome = importer
        .import_bytes(b"sku,item\nS-1,Borracha\n".to_vec(), "csv")
        .await
        .unwrap();

    let product = &outcome.data.products[0];
    assert_eq!(product.category, "Diversos");
    assert_eq!(product.min_stock_level, 0);
}

#[tokio::test]
async fn test_invalid_persisted_config_is_reported() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_global_config_value(config_keys::DECODE_TIMEOUT_MS, "soon")
        .unwrap();

    let importer = StoreImporterImpl::new(config_manager);
    let err = importer
        .import_bytes(b"sku,item\nS-1,Borracha\n".to_vec(), "csv")
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Config { ref key, .. } if key == config_keys::DECODE_TIMEOUT_MS));
}
