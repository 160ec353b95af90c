// ==========================================
// InsightStore - 导入过程领域模型
// ==========================================
// 职责: 导入报告 / 被拒行诊断 / 管道阶段 / 持久化模式
// ==========================================

use crate::domain::store::StoreData;
use crate::domain::table::SourceFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportPhase - 管道状态机
// ==========================================
// Decoding → Iterating → Validating → Done | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportPhase {
    Decoding,
    Iterating,
    Validating,
    Done,
    Failed,
}

impl ImportPhase {
    /// 合法迁移判定
    pub fn can_transition_to(self, next: ImportPhase) -> bool {
        use ImportPhase::*;
        matches!(
            (self, next),
            (Decoding, Iterating)
                | (Decoding, Failed)
                | (Iterating, Validating)
                | (Validating, Done)
                | (Validating, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ImportPhase::Done | ImportPhase::Failed)
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportPhase::Decoding => "DECODING",
            ImportPhase::Iterating => "ITERATING",
            ImportPhase::Validating => "VALIDATING",
            ImportPhase::Done => "DONE",
            ImportPhase::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// RejectedRow - 被拒行诊断样本
// ==========================================
// 仅保留前若干条，避免大文件诊断无限增长
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row_number: usize,              // 数据行号（从 1 开始，不含表头）
    pub observed_columns: Vec<String>,  // 该行规范化后的列标识
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub import_id: String,
    pub source_format: Option<SourceFormat>,
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    pub rejected_samples: Vec<RejectedRow>,
    pub products: usize,
    pub inventory_items: usize,
    pub sales: usize,
    pub observed_columns: Vec<String>,
    pub ingested_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

// ==========================================
// ImportOutcome - 成功导入的产出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub data: StoreData,
    pub report: ImportReport,
}

// ==========================================
// PersistMode - 落库模式
// ==========================================
// Replace: 先按 Sale → InventoryItem → Product 顺序删除该身份下全部旧数据
// Append: 商品/库存按自然键 upsert，销售直接追加
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    #[default]
    Append,
    Replace,
}

impl std::str::FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(PersistMode::Append),
            "replace" => Ok(PersistMode::Replace),
            other => Err(format!("unknown persist mode: {}", other)),
        }
    }
}

// ==========================================
// PersistSummary - 落库统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistSummary {
    pub mode: PersistMode,
    pub deleted_sales: usize,
    pub deleted_inventory: usize,
    pub deleted_products: usize,
    pub products: usize,
    pub inventory_items: usize,
    pub sales: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        assert!(ImportPhase::Decoding.can_transition_to(ImportPhase::Iterating));
        assert!(ImportPhase::Decoding.can_transition_to(ImportPhase::Failed));
        assert!(!ImportPhase::Iterating.can_transition_to(ImportPhase::Failed));
        assert!(!ImportPhase::Done.can_transition_to(ImportPhase::Decoding));
        assert!(ImportPhase::Failed.is_terminal());
    }

    #[test]
    fn test_persist_mode_parse() {
        assert_eq!("Replace".parse::<PersistMode>(), Ok(PersistMode::Replace));
        assert_eq!(" append ".parse::<PersistMode>(), Ok(PersistMode::Append));
        assert!("merge".parse::<PersistMode>().is_err());
    }
}
