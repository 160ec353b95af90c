// ==========================================
// InsightStore - 领域层
// ==========================================
// 职责: 定义导入产出实体、中间表格模型与导入过程模型
// 红线: 领域层不依赖数据库与文件系统
// ==========================================

pub mod import;
pub mod store;
pub mod table;

// 重导出核心类型
pub use import::{ImportOutcome, ImportPhase, ImportReport, PersistMode, PersistSummary, RejectedRow};
pub use store::{InventoryItem, Product, Sale, StoreData};
pub use table::{CellValue, DecodedTable, RawRow, SourceFormat};
