// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、临时文件、内存表格构造
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use insight_store::db::{ensure_schema, open_sqlite_connection};
use insight_store::domain::{CellValue, DecodedTable, RawRow, SourceFormat};
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入带指定后缀的临时文件
pub fn write_temp_file(content: &[u8], suffix: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::with_suffix(suffix).unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// 由 (表头, 文本值) 对构造内存表格
pub fn text_table(rows: &[&[(&str, &str)]]) -> DecodedTable {
    let rows = rows
        .iter()
        .map(|pairs| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
                .collect::<RawRow>()
        })
        .collect();
    DecodedTable::new(SourceFormat::Csv, rows)
}

/// 固定的导入时刻
pub fn ingested_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}
