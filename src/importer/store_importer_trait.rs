// ==========================================
// InsightStore - 门店数据导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// 管道: 文件解码 → 行规范化 → 值转换 → 实体构建 → 汇总校验
// ==========================================

use crate::domain::import::ImportOutcome;
use crate::domain::table::{CellValue, RawRow};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::CanonicalRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

// ==========================================
// StoreImporter Trait
// ==========================================
// 用途: 文件级导入主接口
// 实现者: StoreImporterImpl
#[async_trait]
pub trait StoreImporter: Send + Sync {
    /// 从文件导入门店数据（格式以扩展名为准）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): StoreData + 导入报告
    /// - Err: 文件读取超时、解码失败、空表、无有效商品
    async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportOutcome>;

    /// 从已读取的字节导入（由调用方负责传输层）
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - extension_hint: 扩展名提示（"csv" / "xlsx" / ...）
    async fn import_bytes(&self, bytes: Vec<u8>, extension_hint: &str) -> ImportResult<ImportOutcome>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不共享可变状态
    /// - 某个文件失败不影响其他文件，结果顺序与输入一致
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportOutcome>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 解码接口（Decoding 阶段）
// 实现者: CsvParser, SpreadsheetParser
pub trait FileParser: Send + Sync {
    /// 将字节解码为原始行（原始表头 → 单元格值，保持列顺序）
    ///
    /// 完全空白的行被跳过；零数据行返回空列表，由管道判定 EmptySource
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行规范化接口
// 实现者: FieldMapper（field_mapper.rs）
pub trait FieldMapper: Send + Sync {
    /// 规范化表头并解析全部逻辑字段
    ///
    /// # 参数
    /// - row: 原始行
    /// - row_number: 数据行号（从 1 开始，用于诊断）
    fn canonicalize(&self, row: &RawRow, row_number: usize) -> CanonicalRow;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 值转换接口（所有方法均不失败）
// 实现者: DataCleaner（data_cleaner.rs）
pub trait DataCleaner: Send + Sync {
    /// TRIM + 空值标准化（空白 → None）
    fn clean_text(&self, value: Option<&CellValue>) -> Option<String>;

    /// 小数转换；失败返回 0
    fn coerce_decimal(&self, value: Option<&CellValue>) -> f64;

    /// 整数转换；失败返回 None（与显式 0 区分）
    fn coerce_integer(&self, value: Option<&CellValue>) -> Option<i64>;

    /// 日期转换；失败返回 fallback（导入时刻）
    fn coerce_date(&self, value: Option<&CellValue>, fallback: DateTime<Utc>) -> DateTime<Utc>;
}
