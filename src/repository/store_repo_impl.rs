// ==========================================
// InsightStore - 门店数据 Repository 实现
// ==========================================
// 存储: products / inventory / sales（主键均含 owner_id）
// 事务: 每次 save / clear 为单个事务，失败整体回滚
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::import::{PersistMode, PersistSummary};
use crate::domain::store::{InventoryItem, Product, Sale, StoreData};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store_repo::StoreRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

// ==========================================
// StoreRepositoryImpl
// ==========================================
pub struct StoreRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl StoreRepositoryImpl {
    /// 创建新的 Repository 实例（必要时建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 Sale → InventoryItem → Product 顺序删除
    fn delete_owner_rows_tx(
        tx: &Transaction,
        owner_id: &str,
        summary: &mut PersistSummary,
    ) -> RepositoryResult<()> {
        summary.deleted_sales = tx.execute("DELETE FROM sales WHERE owner_id = ?1", params![owner_id])?;
        summary.deleted_inventory =
            tx.execute("DELETE FROM inventory WHERE owner_id = ?1", params![owner_id])?;
        summary.deleted_products =
            tx.execute("DELETE FROM products WHERE owner_id = ?1", params![owner_id])?;
        Ok(())
    }

    fn upsert_products_tx(tx: &Transaction, owner_id: &str, products: &[Product]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO products (owner_id, id, name, category, cost, price, min_stock_level)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(owner_id, id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                cost = excluded.cost,
                price = excluded.price,
                min_stock_level = excluded.min_stock_level
            "#,
        )?;

        let mut count = 0;
        for product in products {
            count += stmt.execute(params![
                owner_id,
                product.id,
                product.name,
                product.category,
                product.cost,
                product.price,
                product.min_stock_level,
            ])?;
        }
        Ok(count)
    }

    fn upsert_inventory_tx(
        tx: &Transaction,
        owner_id: &str,
        inventory: &[InventoryItem],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO inventory (owner_id, product_id, quantity, last_updated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(owner_id, product_id) DO UPDATE SET
                quantity = excluded.quantity,
                last_updated = excluded.last_updated
            "#,
        )?;

        let mut count = 0;
        for item in inventory {
            count += stmt.execute(params![owner_id, item.product_id, item.quantity, item.last_updated])?;
        }
        Ok(count)
    }

    /// 追加销售；seq 延续已有最大值，保证同日期记录的读取顺序与写入一致
    fn append_sales_tx(tx: &Transaction, owner_id: &str, sales: &[Sale]) -> RepositoryResult<usize> {
        let mut next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM sales WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO sales (owner_id, id, product_id, quantity, total, date, seq)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;

        let mut count = 0;
        for sale in sales {
            next_seq += 1;
            count += stmt.execute(params![
                owner_id,
                sale.id,
                sale.product_id,
                sale.quantity,
                sale.total,
                sale.date,
                next_seq,
            ])?;
        }
        Ok(count)
    }
}

fn require_owner(owner_id: &str) -> RepositoryResult<&str> {
    let owner = owner_id.trim();
    if owner.is_empty() {
        return Err(RepositoryError::OwnerRequired);
    }
    Ok(owner)
}

#[async_trait]
impl StoreRepository for StoreRepositoryImpl {
    async fn save(
        &self,
        owner_id: &str,
        data: &StoreData,
        mode: PersistMode,
    ) -> RepositoryResult<PersistSummary> {
        let owner = require_owner(owner_id)?;
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut summary = PersistSummary {
            mode,
            ..PersistSummary::default()
        };

        if mode == PersistMode::Replace {
            Self::delete_owner_rows_tx(&tx, owner, &mut summary)?;
            debug!(
                owner_id = %owner,
                sales = summary.deleted_sales,
                inventory = summary.deleted_inventory,
                products = summary.deleted_products,
                "已清除旧数据"
            );
        }

        // 写入顺序: Product → InventoryItem → Sale
        summary.products = Self::upsert_products_tx(&tx, owner, &data.products)?;
        summary.inventory_items = Self::upsert_inventory_tx(&tx, owner, &data.inventory)?;
        summary.sales = Self::append_sales_tx(&tx, owner, &data.sales)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            owner_id = %owner,
            mode = ?mode,
            products = summary.products,
            inventory = summary.inventory_items,
            sales = summary.sales,
            "门店数据已保存"
        );
        Ok(summary)
    }

    async fn load(&self, owner_id: &str, sales_limit: usize) -> RepositoryResult<Option<StoreData>> {
        let owner = require_owner(owner_id)?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, category, cost, price, min_stock_level
             FROM products WHERE owner_id = ?1 ORDER BY rowid",
        )?;
        let products = stmt
            .query_map(params![owner], |row| {
                Ok(Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    cost: row.get(3)?,
                    price: row.get(4)?,
                    min_stock_level: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if products.is_empty() {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT product_id, quantity, last_updated
             FROM inventory WHERE owner_id = ?1 ORDER BY rowid",
        )?;
        let inventory = stmt
            .query_map(params![owner], |row| {
                Ok(InventoryItem {
                    product_id: row.get(0)?,
                    quantity: row.get(1)?,
                    last_updated: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, product_id, quantity, total, date
             FROM sales WHERE owner_id = ?1
             ORDER BY date DESC, seq ASC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(sales_limit).unwrap_or(i64::MAX);
        let sales = stmt
            .query_map(params![owner, limit], |row| {
                Ok(Sale {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    quantity: row.get(2)?,
                    total: row.get(3)?,
                    date: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // 已按日期降序读取
        Ok(Some(StoreData {
            products,
            inventory,
            sales,
        }))
    }

    async fn clear(&self, owner_id: &str) -> RepositoryResult<PersistSummary> {
        let owner = require_owner(owner_id)?;
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut summary = PersistSummary {
            mode: PersistMode::Replace,
            ..PersistSummary::default()
        };
        Self::delete_owner_rows_tx(&tx, owner, &mut summary)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(summary)
    }
}
