// ==========================================
// InsightStore - 门店领域模型
// ==========================================
// 职责: 定义导入产出的三类规范实体 + StoreData 三元组
// 红线: 实体只承载数据，不含解析/合并逻辑
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 商品
// ==========================================
// 主键: id（外部提供，已 trim，保留大小写）
// 合并策略: 首写优先（同一导入内首次出现的行决定全部属性）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,       // 缺省 "General"
    pub cost: f64,              // 成本价（>= 0）
    pub price: f64,             // 售价（>= 0）
    pub min_stock_level: i64,   // 最低库存预警线（>= 0，缺省 5）
}

// ==========================================
// InventoryItem - 库存快照
// ==========================================
// 主键: product_id（必须引用同一导入中的 Product）
// 合并策略: 有效数值后写覆盖；从未出现库存列则为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub product_id: String,
    pub quantity: i64,
    pub last_updated: DateTime<Utc>, // 导入时刻，不取自文件
}

// ==========================================
// Sale - 销售记录
// ==========================================
// 主键: 生成的唯一标识（源数据无自然键）
// 合并策略: 仅追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,          // > 0
    pub total: f64,             // 商品单价 × 数量
    pub date: DateTime<Utc>,
}

// ==========================================
// StoreData - 一次导入的完整产出
// ==========================================
// products/inventory 保持构建顺序；sales 按 date 降序（稳定排序）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    pub products: Vec<Product>,
    pub inventory: Vec<InventoryItem>,
    pub sales: Vec<Sale>,
}

impl StoreData {
    /// 组装 StoreData，并对 sales 做按日期降序的稳定排序
    pub fn new(products: Vec<Product>, inventory: Vec<InventoryItem>, mut sales: Vec<Sale>) -> Self {
        sales.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            products,
            inventory,
            sales,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn inventory_for(&self, product_id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.product_id == product_id)
    }
}
