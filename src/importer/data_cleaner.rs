// ==========================================
// InsightStore - 数据清洗器实现（值转换）
// ==========================================
// 职责: TRIM / 空值标准化 / 小数、整数、日期的宽容转换
// 红线: 转换永不失败，失败时返回安全缺省
//   - 小数 → 0
//   - 整数 → None（与显式 0 区分）
//   - 日期 → 导入时刻
// ==========================================

use crate::domain::table::CellValue;
use crate::importer::store_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

// DD/MM/YYYY 前缀（目标地区常用的日-月-年写法）
static DMY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})").expect("DD/MM/YYYY 正则无效")
});

// 通用日期时间格式（按顺序尝试）
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y%m%d%H%M%S",
];

// 通用日期格式（按顺序尝试）
const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: Option<&CellValue>) -> Option<String> {
        value.and_then(CellValue::as_text)
    }

    fn coerce_decimal(&self, value: Option<&CellValue>) -> f64 {
        let parsed = match value {
            Some(CellValue::Number(n)) => Some(*n),
            Some(CellValue::Text(s)) => leading_float(&s.replacen(',', ".", 1)),
            _ => None,
        };
        parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
    }

    fn coerce_integer(&self, value: Option<&CellValue>) -> Option<i64> {
        match value {
            Some(CellValue::Number(n)) if n.is_finite() => Some(n.trunc() as i64),
            Some(CellValue::Text(s)) => leading_integer(s),
            _ => None,
        }
    }

    fn coerce_date(&self, value: Option<&CellValue>, fallback: DateTime<Utc>) -> DateTime<Utc> {
        match value {
            Some(CellValue::DateTime(dt)) => *dt,
            Some(CellValue::Text(s)) => parse_date_text(s).unwrap_or(fallback),
            // 数值单元格不按日期解释（序列号语义不可靠）
            _ => fallback,
        }
    }
}

/// 解析文本日期
///
/// 1. DD/MM/YYYY 前缀（可带 HH:MM[:SS]），按 UTC 解释；日历非法时返回 None
/// 2. 否则尝试 RFC 3339 / RFC 2822 / 常见 ISO 与英文月份写法
pub fn parse_date_text(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = DMY_PREFIX.captures(trimmed) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let rest = trimmed[caps[0].len()..].trim();
        let time = NaiveTime::parse_from_str(rest, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(rest, "%H:%M"))
            .unwrap_or(NaiveTime::MIN);
        return Some(Utc.from_utc_datetime(&date.and_time(time)));
    }

    parse_generic_date(trimmed)
}

fn parse_generic_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// 取最长的数值前缀（可选符号、整数部分、小数部分、指数）
fn leading_float(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        end = j;
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// 取前导整数（可选符号 + 数字）
fn leading_integer(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    s[..end].parse::<i64>().ok()
}
