// ==========================================
// InsightStore - 导入层
// ==========================================
// 职责: 任意表格文件 → 规范化 StoreData
// 支持: CSV, Excel (xlsx/xlsm/xls/xlsb), ODS
// ==========================================
// 组件（由叶到根）:
// key_normalizer → field_mapper → data_cleaner → entity_builder → pipeline
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod entity_builder;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod key_normalizer;
pub mod pipeline;
pub mod store_importer_impl;
pub mod store_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use entity_builder::{BuildSummary, EntityBuilder, EntityMap, MergePolicy};
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use field_mapper::{CanonicalRow, LogicalField, ALIAS_TABLE, TEMPLATE_HEADERS};
pub use file_parser::{CsvParser, SpreadsheetParser, UniversalFileParser};
pub use key_normalizer::normalize_key;
pub use pipeline::IngestionPipeline;
pub use store_importer_impl::StoreImporterImpl;

// 重导出 Trait 接口
pub use store_importer_trait::{DataCleaner, FieldMapper, FileParser, StoreImporter};
