// ==========================================
// InsightStore - 核心库
// ==========================================
// 定位: 门店数据导入引擎
// 输入: 任意表头 / 任意地区格式的表格文件
// 输出: 商品 / 库存快照 / 销售记录 三元组
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据仓储层 - 数据访问
pub mod repository;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CellValue, DecodedTable, ImportOutcome, ImportReport, InventoryItem, PersistMode,
    PersistSummary, Product, RawRow, Sale, SourceFormat, StoreData,
};

// 导入
pub use importer::{
    normalize_key, ImportError, ImportResult, IngestionPipeline, StoreImporter,
    StoreImporterImpl, UniversalFileParser,
};

// 配置
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};

// 仓储
pub use repository::{RepositoryError, StoreRepository, StoreRepositoryImpl};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "InsightStore";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
