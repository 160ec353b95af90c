// ==========================================
// InsightStore - 实体构建器
// ==========================================
// 职责: 逐行消费 CanonicalRow，增量构建 Product / InventoryItem / Sale
// 合并策略（同一键控映射，按实体类型参数化）:
// - Product: 首写优先
// - InventoryItem: 有效库存值后写覆盖；缺失时仅补 0
// - Sale: 仅追加（每条合格行生成唯一键）
// 红线: 行顺序即语义，不允许乱序/并行处理
// ==========================================

use crate::config::ImportConfig;
use crate::domain::import::RejectedRow;
use crate::domain::store::{InventoryItem, Product, Sale, StoreData};
use crate::importer::field_mapper::CanonicalRow;
use crate::importer::store_importer_trait::DataCleaner;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};
use uuid::Uuid;

// ==========================================
// MergePolicy - 键冲突时的合并策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// 已存在则保持不变
    FirstWriteWins,
    /// 已存在则整体覆盖
    LastWriteWins,
    /// 键由调用方保证唯一；冲突时拒绝写入
    AppendOnly,
}

// ==========================================
// EntityMap - 保序键控映射
// ==========================================
#[derive(Debug, Clone)]
pub struct EntityMap<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for EntityMap<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> EntityMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按策略写入；返回是否发生写入
    ///
    /// `make` 仅在需要写入时调用
    pub fn merge(&mut self, key: &str, policy: MergePolicy, make: impl FnOnce() -> V) -> bool {
        match self.entries.get_mut(key) {
            Some(existing) => match policy {
                MergePolicy::LastWriteWins => {
                    *existing = make();
                    true
                }
                MergePolicy::FirstWriteWins | MergePolicy::AppendOnly => false,
            },
            None => {
                self.entries.insert(key.to_string(), make());
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按首次插入顺序输出
    pub fn into_values(self) -> Vec<V> {
        self.entries.into_values().collect()
    }
}

// ==========================================
// BuildSummary - 构建结果
// ==========================================
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub data: StoreData,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub rejected_samples: Vec<RejectedRow>,
    pub observed_columns: Vec<String>,
}

// ==========================================
// EntityBuilder
// ==========================================
pub struct EntityBuilder<'a> {
    config: &'a ImportConfig,
    cleaner: &'a dyn DataCleaner,
    ingested_at: DateTime<Utc>,

    products: EntityMap<Product>,
    inventory: EntityMap<InventoryItem>,
    sales: EntityMap<Sale>,

    accepted_rows: usize,
    rejected_rows: usize,
    rejected_samples: Vec<RejectedRow>,
    observed_columns: IndexSet<String>,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(config: &'a ImportConfig, cleaner: &'a dyn DataCleaner, ingested_at: DateTime<Utc>) -> Self {
        Self {
            config,
            cleaner,
            ingested_at,
            products: EntityMap::new(),
            inventory: EntityMap::new(),
            sales: EntityMap::new(),
            accepted_rows: 0,
            rejected_rows: 0,
            rejected_samples: Vec::new(),
            observed_columns: IndexSet::new(),
        }
    }

    /// 消费一行；返回该行是否通过校验
    pub fn accept(&mut self, row: &CanonicalRow) -> bool {
        self.observed_columns.extend(row.observed_columns.iter().cloned());

        let cleaner = self.cleaner;
        let config = self.config;
        let ingested_at = self.ingested_at;

        // 校验: id 与 name 必须非空
        let (id, name) = match (
            cleaner.clean_text(row.id.as_ref()),
            cleaner.clean_text(row.name.as_ref()),
        ) {
            (Some(id), Some(name)) => (id, name),
            _ => {
                self.reject(row);
                return false;
            }
        };
        self.accepted_rows += 1;

        // 1. Product（首写优先）
        self.products.merge(&id, MergePolicy::FirstWriteWins, || Product {
            id: id.clone(),
            name,
            category: cleaner
                .clean_text(row.category.as_ref())
                .unwrap_or_else(|| config.default_category.clone()),
            cost: cleaner.coerce_decimal(row.cost.as_ref()).max(0.0),
            price: cleaner.coerce_decimal(row.price.as_ref()).max(0.0),
            min_stock_level: cleaner
                .coerce_integer(row.min_stock.as_ref())
                .unwrap_or(config.default_min_stock)
                .max(0),
        });

        // 2. InventoryItem（有效值覆盖；缺失仅补 0）
        let stock = cleaner.coerce_integer(row.current_stock.as_ref());
        let policy = if stock.is_some() {
            MergePolicy::LastWriteWins
        } else {
            MergePolicy::FirstWriteWins
        };
        self.inventory.merge(&id, policy, || InventoryItem {
            product_id: id.clone(),
            quantity: stock.unwrap_or(0).max(0),
            last_updated: ingested_at,
        });

        // 3. Sale（有日期且数量 > 0）
        let quantity = cleaner.coerce_integer(row.quantity_sold.as_ref());
        if let (Some(date), Some(quantity)) = (row.date.as_ref(), quantity) {
            if quantity > 0 {
                let price = self.products.get(&id).map(|p| p.price).unwrap_or(0.0);
                let sale_id = Uuid::new_v4().to_string();
                self.sales.merge(&sale_id, MergePolicy::AppendOnly, || Sale {
                    id: sale_id.clone(),
                    product_id: id.clone(),
                    quantity,
                    total: price * quantity as f64,
                    date: cleaner.coerce_date(Some(date), ingested_at),
                });
            }
        }

        true
    }

    fn reject(&mut self, row: &CanonicalRow) {
        self.rejected_rows += 1;

        if self.rejected_rows <= self.config.rejected_row_log_limit {
            warn!(
                row_number = row.row_number,
                columns = ?row.observed_columns,
                "行缺少商品编码或名称，已跳过"
            );
        } else if self.rejected_rows == self.config.rejected_row_log_limit + 1 {
            debug!("后续被拒行不再逐条记录");
        }

        if self.rejected_samples.len() < self.config.rejected_row_sample_limit {
            self.rejected_samples.push(RejectedRow {
                row_number: row.row_number,
                observed_columns: row.observed_columns.clone(),
            });
        }
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// 结束构建，sales 按日期降序（稳定）
    pub fn finish(self) -> BuildSummary {
        BuildSummary {
            data: StoreData::new(
                self.products.into_values(),
                self.inventory.into_values(),
                self.sales.into_values(),
            ),
            accepted_rows: self.accepted_rows,
            rejected_rows: self.rejected_rows,
            rejected_samples: self.rejected_samples,
            observed_columns: self.observed_columns.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::CellValue;
    use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn row(id: &str, name: &str) -> CanonicalRow {
        CanonicalRow {
            id: Some(CellValue::from(id)),
            name: Some(CellValue::from(name)),
            ..CanonicalRow::default()
        }
    }

    #[test]
    fn test_entity_map_policies() {
        let mut map = EntityMap::new();
        assert!(map.merge("k", MergePolicy::FirstWriteWins, || 1));
        assert!(!map.merge("k", MergePolicy::FirstWriteWins, || 2));
        assert_eq!(map.get("k"), Some(&1));

        assert!(map.merge("k", MergePolicy::LastWriteWins, || 3));
        assert_eq!(map.get("k"), Some(&3));

        assert!(!map.merge("k", MergePolicy::AppendOnly, || 4));
        assert!(map.merge("j", MergePolicy::AppendOnly, || 5));
        assert_eq!(map.into_values(), vec![3, 5]);
    }

    #[test]
    fn test_product_defaults() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());

        assert!(builder.accept(&row("P001", "Camiseta")));
        let summary = builder.finish();

        let product = &summary.data.products[0];
        assert_eq!(product.category, "General");
        assert_eq!(product.cost, 0.0);
        assert_eq!(product.price, 0.0);
        assert_eq!(product.min_stock_level, 5);
        assert_eq!(summary.data.inventory[0].quantity, 0);
        assert_eq!(summary.data.inventory[0].last_updated, now());
    }

    #[test]
    fn test_negative_values_clamped() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());
        let mut r = row("P001", "Camiseta");
        r.price = Some(CellValue::from("-10"));
        r.min_stock = Some(CellValue::from("-2"));
        r.current_stock = Some(CellValue::from("-7"));

        builder.accept(&r);
        let summary = builder.finish();

        assert_eq!(summary.data.products[0].price, 0.0);
        assert_eq!(summary.data.products[0].min_stock_level, 0);
        assert_eq!(summary.data.inventory[0].quantity, 0);
    }

    #[test]
    fn test_explicit_zero_min_stock_kept() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());
        let mut r = row("P001", "Camiseta");
        r.min_stock = Some(CellValue::from("0"));

        builder.accept(&r);

        assert_eq!(builder.finish().data.products[0].min_stock_level, 0);
    }

    #[test]
    fn test_absent_stock_does_not_reset_existing() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());
        let mut first = row("P001", "Camiseta");
        first.current_stock = Some(CellValue::from("12"));
        let second = row("P001", "Camiseta");

        builder.accept(&first);
        builder.accept(&second);

        assert_eq!(builder.finish().data.inventory[0].quantity, 12);
    }

    #[test]
    fn test_sale_requires_date_and_positive_quantity() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());

        let mut no_date = row("P001", "Camiseta");
        no_date.quantity_sold = Some(CellValue::from("3"));
        let mut zero_qty = row("P001", "Camiseta");
        zero_qty.quantity_sold = Some(CellValue::from("0"));
        zero_qty.date = Some(CellValue::from("01/10/2023"));
        let mut valid = row("P001", "Camiseta");
        valid.price = Some(CellValue::from("10,5"));
        valid.quantity_sold = Some(CellValue::from("2"));
        valid.date = Some(CellValue::from("nao sei"));

        builder.accept(&no_date);
        builder.accept(&zero_qty);
        builder.accept(&valid);
        let summary = builder.finish();

        // 价格取首行（0），日期无法解析时取导入时刻
        assert_eq!(summary.data.sales.len(), 1);
        assert_eq!(summary.data.sales[0].total, 0.0);
        assert_eq!(summary.data.sales[0].date, now());
    }

    #[test]
    fn test_rejected_rows_counted_and_sampled() {
        let config = ImportConfig::default();
        let mut builder = EntityBuilder::new(&config, &DataCleanerImpl, now());

        for n in 1..=5 {
            let r = CanonicalRow {
                name: Some(CellValue::from("sem codigo")),
                row_number: n,
                observed_columns: vec!["nome".to_string()],
                ..CanonicalRow::default()
            };
            assert!(!builder.accept(&r));
        }
        builder.accept(&row("  ", "blank id"));

        let summary = builder.finish();
        assert_eq!(summary.rejected_rows, 6);
        assert_eq!(summary.accepted_rows, 0);
        assert_eq!(summary.rejected_samples.len(), 3);
        assert_eq!(summary.rejected_samples[0].row_number, 1);
        assert_eq!(summary.observed_columns, vec!["nome"]);
        assert!(summary.data.is_empty());
    }
}
