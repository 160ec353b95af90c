// ==========================================
// InsightStore - 文件解析器实现
// ==========================================
// 阶段: Decoding（字节 → 有序原始行）
// 支持: CSV (.csv/.txt) / Excel (.xlsx/.xlsm/.xls/.xlsb) / ODS (.ods)
// 规则: 扩展名即格式，不做内容嗅探；仅读取第一个工作表
// ==========================================

use crate::domain::table::{CellValue, DecodedTable, RawRow, SourceFormat};
use crate::i18n::t;
use crate::importer::data_cleaner::parse_date_text;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::store_importer_trait::FileParser;
use calamine::{Data, Ods, Range, Reader, Sheets, Xls, Xlsb, Xlsx};
use chrono::{TimeZone, Utc};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

// 候选分隔符（平局时取靠前者）
const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        // CSV 必须是 UTF-8 文本
        let text = std::str::from_utf8(bytes)?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(sniff_delimiter(text))
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let cells = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header, text_cell(record.get(idx).unwrap_or(""))));

            if let Some(row) = collect_row(cells) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

/// 根据表头行识别分隔符（忽略引号内字符）
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut in_quotes = false;

    for b in header.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(idx) = DELIMITER_CANDIDATES.iter().position(|c| *c == b) {
            counts[idx] += 1;
        }
    }

    let mut best = 0;
    for idx in 1..counts.len() {
        if counts[idx] > counts[best] {
            best = idx;
        }
    }
    DELIMITER_CANDIDATES[best]
}

fn text_cell(value: &str) -> CellValue {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(trimmed.to_string())
    }
}

/// 组装一行；完全空白的行返回 None
///
/// 重复表头保留第一个非空值
fn collect_row<'a>(cells: impl Iterator<Item = (&'a String, CellValue)>) -> Option<RawRow> {
    let mut row = RawRow::new();
    for (header, value) in cells {
        match row.get(header) {
            Some(existing) if !existing.is_blank() => {}
            _ => {
                row.insert(header.clone(), value);
            }
        }
    }

    if row.values().all(CellValue::is_blank) {
        None
    } else {
        Some(row)
    }
}

// ==========================================
// Spreadsheet Parser 实现
// ==========================================
pub struct SpreadsheetParser {
    format: SourceFormat,
}

impl SpreadsheetParser {
    pub fn new(format: SourceFormat) -> Self {
        Self { format }
    }

    fn open(&self, bytes: &[u8]) -> ImportResult<Sheets<Cursor<Vec<u8>>>> {
        let cursor = Cursor::new(bytes.to_vec());
        let workbook = match self.format {
            SourceFormat::Xlsx => Sheets::Xlsx(Xlsx::new(cursor).map_err(calamine::Error::Xlsx)?),
            SourceFormat::Xls => Sheets::Xls(Xls::new(cursor).map_err(calamine::Error::Xls)?),
            SourceFormat::Xlsb => Sheets::Xlsb(Xlsb::new(cursor).map_err(calamine::Error::Xlsb)?),
            SourceFormat::Ods => Sheets::Ods(Ods::new(cursor).map_err(calamine::Error::Ods)?),
            SourceFormat::Csv => {
                return Err(ImportError::UnsupportedFormat(self.format.to_string()));
            }
        };
        Ok(workbook)
    }
}

impl FileParser for SpreadsheetParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut workbook = self.open(bytes)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::SourceUnreadable(t("import.no_sheets")))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        Ok(rows_from_range(&range))
    }
}

/// 工作表区域 → 原始行（第一行为表头）
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Vec::new(),
    };

    rows.filter_map(|data_row| {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header, data_row.get(idx).map(cell_from_data).unwrap_or_default()));
        collect_row(cells)
    })
    .collect()
}

/// 单元格转换：日期单元格保留为时间戳
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => text_cell(s),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(Utc.from_utc_datetime(&naive)),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| text_cell(s)),
        Data::DurationIso(s) => text_cell(s),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 按扩展名提示解码字节
    pub fn decode(&self, bytes: &[u8], extension_hint: &str) -> ImportResult<DecodedTable> {
        let format = SourceFormat::from_extension(extension_hint)
            .ok_or_else(|| ImportError::UnsupportedFormat(extension_hint.to_string()))?;

        let rows = match format {
            SourceFormat::Csv => CsvParser.parse_bytes(bytes)?,
            spreadsheet => SpreadsheetParser::new(spreadsheet).parse_bytes(bytes)?,
        };

        Ok(DecodedTable::new(format, rows))
    }

    /// 读取并解码本地文件（同步，测试与 CLI 使用）
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<DecodedTable> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        self.decode(&bytes, &extension_of(path))
    }
}

/// 文件扩展名（小写，无扩展名时为空串）
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse_csv(content: &str) -> Vec<RawRow> {
        CsvParser.parse_bytes(content.as_bytes()).unwrap()
    }

    #[test]
    fn test_csv_parser_valid_content() {
        let rows = parse_csv("Código,Produto,Preço\nP001,Camiseta,\"60,00\"\nP002,Calça,120\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Código"), Some(&CellValue::from("P001")));
        assert_eq!(rows[0].get("Preço"), Some(&CellValue::from("60,00")));
        assert_eq!(rows[1].get("Produto"), Some(&CellValue::from("Calça")));
    }

    #[test]
    fn test_csv_parser_semicolon_and_bom() {
        let rows = parse_csv("\u{feff}codigo;produto;preco\nP001;Camiseta;60,00\n");

        assert_eq!(rows.len(), 1);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["codigo", "produto", "preco"]);
        assert_eq!(rows[0].get("preco"), Some(&CellValue::from("60,00")));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let rows = parse_csv("codigo,produto\nP001,A\n,\nP002,B\n");

        // 应跳过空行
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_csv_parser_short_row_pads_empty() {
        let rows = parse_csv("codigo,produto,estoque\nP001,A\n");

        assert_eq!(rows[0].get("estoque"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_parser_header_only_is_empty() {
        assert!(parse_csv("codigo,produto\n").is_empty());
        assert!(parse_csv("").is_empty());
    }

    #[test]
    fn test_csv_parser_rejects_invalid_utf8() {
        let result = CsvParser.parse_bytes(&[0x63, 0x6f, 0xff, 0xfe, 0x0a]);
        assert!(matches!(result, Err(ImportError::SourceUnreadable(_))));
    }

    #[test]
    fn test_sniff_delimiter_ignores_quoted() {
        assert_eq!(sniff_delimiter("\"a;b;c\",d,e"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("single"), b',');
    }

    #[test]
    fn test_cell_from_data_keeps_native_kinds() {
        assert_eq!(cell_from_data(&Data::Float(60.5)), CellValue::Number(60.5));
        assert_eq!(cell_from_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_from_data(&Data::String("  ".to_string())), CellValue::Empty);
        assert_eq!(
            cell_from_data(&Data::DateTimeIso("2023-10-05T00:00:00".to_string())),
            CellValue::DateTime(Utc.with_ymd_and_hms(2023, 10, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rows_from_range_uses_first_row_as_header() {
        let mut range = Range::new((0, 0), (2, 1));
        range.set_value((0, 0), Data::String("codigo".to_string()));
        range.set_value((0, 1), Data::String("estoque".to_string()));
        range.set_value((1, 0), Data::String("P001".to_string()));
        range.set_value((1, 1), Data::Float(50.0));
        // 第三行保持空白

        let rows = rows_from_range(&range);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("estoque"), Some(&CellValue::Number(50.0)));
    }

    #[test]
    fn test_universal_parser_unsupported_extension() {
        let result = UniversalFileParser.decode(b"x", "pdf");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_universal_parser_file_not_found() {
        let result = UniversalFileParser.parse(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_corrupt_spreadsheet() {
        let result = UniversalFileParser.decode(b"not a zip archive", "xlsx");
        assert!(matches!(result, Err(ImportError::SourceUnreadable(_))));
    }

    #[test]
    fn test_universal_parser_reads_csv_file() {
        let mut temp_file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp_file, "codigo,produto").unwrap();
        writeln!(temp_file, "P001,Camiseta").unwrap();

        let table = UniversalFileParser.parse(temp_file.path()).unwrap();

        assert_eq!(table.format, SourceFormat::Csv);
        assert_eq!(table.len(), 1);
    }
}
