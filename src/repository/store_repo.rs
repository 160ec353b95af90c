// ==========================================
// InsightStore - 门店数据 Repository Trait
// ==========================================
// 职责: 定义 StoreData 持久化接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 顺序: 删除 Sale → InventoryItem → Product；写入反向
// ==========================================

use crate::domain::import::{PersistMode, PersistSummary};
use crate::domain::store::StoreData;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// load 默认返回的销售记录上限
pub const DEFAULT_SALES_LIMIT: usize = 1000;

// ==========================================
// StoreRepository Trait
// ==========================================
// 用途: 按用户身份（owner_id）隔离的门店数据访问
// 实现者: StoreRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// 保存一次导入的 StoreData（单事务）
    ///
    /// # 参数
    /// - owner_id: 用户身份（不可为空）
    /// - data: 导入产出
    /// - mode: Append（商品/库存 upsert，销售追加）或 Replace（先清空再写入）
    ///
    /// # 返回
    /// - Ok(PersistSummary): 删除/写入计数
    /// - Err: 数据库错误（整个事务回滚）
    async fn save(
        &self,
        owner_id: &str,
        data: &StoreData,
        mode: PersistMode,
    ) -> RepositoryResult<PersistSummary>;

    /// 读取用户的门店数据
    ///
    /// # 返回
    /// - Ok(None): 该用户尚无商品
    /// - Ok(Some): 商品/库存按写入顺序，销售按日期降序且最多 sales_limit 条
    async fn load(&self, owner_id: &str, sales_limit: usize) -> RepositoryResult<Option<StoreData>>;

    /// 删除用户全部门店数据
    async fn clear(&self, owner_id: &str) -> RepositoryResult<PersistSummary>;
}
