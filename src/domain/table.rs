// ==========================================
// InsightStore - 解码后表格模型
// ==========================================
// 用途: 文件解析层 → 导入管道之间的中间结构
// 生命周期: 仅在一次导入流程内
// ==========================================

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 原始单元格值
// ==========================================
// 电子表格的日期单元格以 DateTime 保留（不退化为序列号或字符串）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// 空单元格或纯空白文本视为缺失
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::DateTime(_) => false,
        }
    }

    /// 文本形式（trim 后），空值返回 None
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::DateTime(value)
    }
}

/// 原始行：原始表头 → 单元格值（保持列顺序）
pub type RawRow = IndexMap<String, CellValue>;

// ==========================================
// SourceFormat - 源文件格式
// ==========================================
// 以扩展名为准，不做内容嗅探
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
    Xls,
    Xlsb,
    Ods,
}

impl SourceFormat {
    /// 根据扩展名提示识别格式（大小写不敏感，可带前导点）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" | "txt" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" => Some(SourceFormat::Xlsx),
            "xls" => Some(SourceFormat::Xls),
            "xlsb" => Some(SourceFormat::Xlsb),
            "ods" => Some(SourceFormat::Ods),
            _ => None,
        }
    }

    pub fn is_spreadsheet(&self) -> bool {
        !matches!(self, SourceFormat::Csv)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
            SourceFormat::Xls => "xls",
            SourceFormat::Xlsb => "xlsb",
            SourceFormat::Ods => "ods",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// DecodedTable - 解码结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTable {
    pub format: SourceFormat,
    pub rows: Vec<RawRow>,
}

impl DecodedTable {
    pub fn new(format: SourceFormat, rows: Vec<RawRow>) -> Self {
        Self { format, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::from("   ").is_blank());
        assert!(!CellValue::from("0").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension(".xlsx"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_extension("pdf"), None);
    }
}
