// ==========================================
// InsightStore - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 按用户身份持久化 StoreData，屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod store_repo;
pub mod store_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use store_repo::{StoreRepository, DEFAULT_SALES_LIMIT};
pub use store_repo_impl::StoreRepositoryImpl;
