// ==========================================
// InsightStore - 字段映射器实现
// ==========================================
// 职责: 别名解析（规范化列名 → 逻辑字段） + 单行规范化
// 别名表为静态常量，顺序即优先级（首个命中者胜出）
// ==========================================

use crate::domain::table::{CellValue, RawRow};
use crate::importer::key_normalizer::normalize_key;
use crate::importer::store_importer_trait::FieldMapper as FieldMapperTrait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// LogicalField - 逻辑字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalField {
    Id,
    Name,
    Category,
    Cost,
    Price,
    MinStock,
    CurrentStock,
    QuantitySold,
    Date,
}

impl LogicalField {
    pub const ALL: [LogicalField; 9] = [
        LogicalField::Id,
        LogicalField::Name,
        LogicalField::Category,
        LogicalField::Cost,
        LogicalField::Price,
        LogicalField::MinStock,
        LogicalField::CurrentStock,
        LogicalField::QuantitySold,
        LogicalField::Date,
    ];

    /// 按优先级排列的别名列表
    pub fn aliases(self) -> &'static [&'static str] {
        ALIAS_TABLE
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalField::Id => "id",
            LogicalField::Name => "name",
            LogicalField::Category => "category",
            LogicalField::Cost => "cost",
            LogicalField::Price => "price",
            LogicalField::MinStock => "minStock",
            LogicalField::CurrentStock => "currentStock",
            LogicalField::QuantitySold => "quantitySold",
            LogicalField::Date => "date",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 别名表（与既有模板/历史文件保持兼容，不可随意调整顺序）
// ==========================================
pub static ALIAS_TABLE: [(LogicalField, &[&str]); 9] = [
    (
        LogicalField::Id,
        &[
            "product_id", "id_produto", "id", "codigo", "cod", "sku", "referencia", "ref",
            "codigo_produto",
        ],
    ),
    (
        LogicalField::Name,
        &[
            "product_name", "nome_produto", "produto", "name", "nome", "descricao", "item",
            "titulo", "mercadoria",
        ],
    ),
    (
        LogicalField::Category,
        &["category", "categoria", "cat", "departamento", "grupo", "secao"],
    ),
    (
        LogicalField::Cost,
        &["cost", "custo", "valor_custo", "preco_custo", "pc", "vlr_custo"],
    ),
    (
        LogicalField::Price,
        &["price", "preco", "valor", "valor_venda", "preco_venda", "pv", "unitario"],
    ),
    (
        LogicalField::MinStock,
        &["min_stock", "estoque_minimo", "min", "minimo", "ponto_pedido", "alertar_em"],
    ),
    (
        LogicalField::CurrentStock,
        &[
            "current_stock", "estoque_atual", "estoque", "saldo", "quantidade_estoque",
            "qtd_atual",
        ],
    ),
    (
        LogicalField::QuantitySold,
        &[
            "quantity_sold", "quantidade_vendida", "qtd_vendida", "vendas", "qtd", "quantidade",
            "saida",
        ],
    ),
    (
        LogicalField::Date,
        &["date", "data", "data_venda", "dia", "emissao", "data_movimento"],
    ),
];

/// 标准模板表头（下载模板所用的规范列名）
pub const TEMPLATE_HEADERS: [&str; 9] = [
    "date",
    "product_id",
    "product_name",
    "category",
    "cost",
    "price",
    "quantity_sold",
    "current_stock",
    "min_stock",
];

/// 规范化后的行：canonical token → 原始值（保持列顺序）
pub type NormalizedRow = IndexMap<String, CellValue>;

/// 对规范化行解析单个逻辑字段
///
/// 返回优先级最高且非空的别名对应的值；均不存在时返回 None
pub fn resolve<'a>(row: &'a NormalizedRow, field: LogicalField) -> Option<&'a CellValue> {
    field
        .aliases()
        .iter()
        .filter_map(|alias| row.get(*alias))
        .find(|value| !value.is_blank())
}

/// 规范化一行的全部表头（空 token 丢弃）
///
/// 同一 token 由多个原始表头产生时，保留第一个非空值
pub fn normalize_row(row: &RawRow) -> NormalizedRow {
    let mut normalized = NormalizedRow::with_capacity(row.len());
    for (raw_key, value) in row {
        let token = normalize_key(raw_key);
        if token.is_empty() {
            continue;
        }
        match normalized.get(&token) {
            Some(existing) if !existing.is_blank() => {}
            _ => {
                normalized.insert(token, value.clone());
            }
        }
    }
    normalized
}

// ==========================================
// CanonicalRow - 逻辑字段集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    pub id: Option<CellValue>,
    pub name: Option<CellValue>,
    pub category: Option<CellValue>,
    pub cost: Option<CellValue>,
    pub price: Option<CellValue>,
    pub min_stock: Option<CellValue>,
    pub current_stock: Option<CellValue>,
    pub quantity_sold: Option<CellValue>,
    pub date: Option<CellValue>,

    // 元信息
    pub row_number: usize,
    pub observed_columns: Vec<String>,
}

impl CanonicalRow {
    pub fn get(&self, field: LogicalField) -> Option<&CellValue> {
        match field {
            LogicalField::Id => self.id.as_ref(),
            LogicalField::Name => self.name.as_ref(),
            LogicalField::Category => self.category.as_ref(),
            LogicalField::Cost => self.cost.as_ref(),
            LogicalField::Price => self.price.as_ref(),
            LogicalField::MinStock => self.min_stock.as_ref(),
            LogicalField::CurrentStock => self.current_stock.as_ref(),
            LogicalField::QuantitySold => self.quantity_sold.as_ref(),
            LogicalField::Date => self.date.as_ref(),
        }
    }
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn canonicalize(&self, row: &RawRow, row_number: usize) -> CanonicalRow {
        let normalized = normalize_row(row);
        let pick = |field: LogicalField| resolve(&normalized, field).cloned();

        CanonicalRow {
            id: pick(LogicalField::Id),
            name: pick(LogicalField::Name),
            category: pick(LogicalField::Category),
            cost: pick(LogicalField::Cost),
            price: pick(LogicalField::Price),
            min_stock: pick(LogicalField::MinStock),
            current_stock: pick(LogicalField::CurrentStock),
            quantity_sold: pick(LogicalField::QuantitySold),
            date: pick(LogicalField::Date),
            row_number,
            observed_columns: normalized.keys().cloned().collect(),
        }
    }
}
