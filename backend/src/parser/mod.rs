//! Catalog loader for spreadsheets and delimited text.
//!
//! Workbooks (xlsx, xlsm, xlsb, xls, ods) are read with `calamine`, first sheet
//! only. Delimited files go through encoding and delimiter auto-detection and
//! the `csv` reader. Both end up as a raw cell grid that [`table_from_grid`]
//! turns into a [`Table`]:
//!
//! - the header is the physical row `header_row` (0-based, default 11)
//! - blank header cells are named `Unnamed: <index>`
//! - repeated header names become `name`, `name.1`, `name.2`, ...
//! - fully blank data rows are skipped
//! - configured text columns (`Codigo`) are forced to text

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

use crate::config::SourceSettings;
use crate::error::{LoadError, LoadResult};
use crate::models::{cell_text, is_blank, number_value, Table};

/// Kind of source that was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited,
}

/// Loaded table with metadata about how it was read
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    /// Parsed catalog
    pub table: Table,
    pub format: SourceFormat,
    /// Worksheet read (spreadsheets only)
    pub sheet: Option<String>,
    /// Detected encoding (delimited only)
    pub encoding: Option<String>,
    /// Detected delimiter (delimited only)
    pub delimiter: Option<char>,
    /// Physical rows above the header
    pub skipped_rows: usize,
}

/// Load a catalog, picking the reader from the file extension.
pub fn load_catalog<P: AsRef<Path>>(path: P, settings: &SourceSettings) -> LoadResult<LoadedCatalog> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path, settings),
        "csv" | "tsv" | "txt" => {
            let bytes = std::fs::read(path)?;
            load_delimited_bytes(&bytes, settings)
        }
        other => Err(LoadError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

/// Read the first worksheet of a workbook.
pub fn load_spreadsheet<P: AsRef<Path>>(path: P, settings: &SourceSettings) -> LoadResult<LoadedCatalog> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet)?;

    let grid = range_to_grid(&range);
    let table = table_from_grid(grid, settings, false)?;

    Ok(LoadedCatalog {
        table,
        format: SourceFormat::Spreadsheet,
        sheet: Some(sheet),
        encoding: None,
        delimiter: None,
        skipped_rows: settings.header_row,
    })
}

/// Read delimited text with encoding and delimiter auto-detection.
pub fn load_delimited_bytes(bytes: &[u8], settings: &SourceSettings) -> LoadResult<LoadedCatalog> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = record
            .iter()
            .map(|field| {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    Value::Null
                } else {
                    Value::String(trimmed.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }

    let table = table_from_grid(grid, settings, true)?;

    Ok(LoadedCatalog {
        table,
        format: SourceFormat::Delimited,
        sheet: None,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        skipped_rows: settings.header_row,
    })
}

/// Physical-position grid of a worksheet range.
///
/// `calamine` ranges start at the first used cell, so leading empty rows and
/// columns are restored to keep the header at its physical row.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<Value>> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<Value>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Value::Null; col_offset];
        cells.extend(row.iter().map(data_to_value));
        grid.push(cells);
    }
    grid
}

fn data_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Float(f) => number_value(*f),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        // Serial date number, as Excel stores it
        Data::DateTime(dt) => number_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

/// Build a table from a raw cell grid.
///
/// With `infer_numbers`, text cells that parse as numbers become numbers
/// (delimited sources carry no types). Text columns are exempt.
pub fn table_from_grid(
    grid: Vec<Vec<Value>>,
    settings: &SourceSettings,
    infer_numbers: bool,
) -> LoadResult<Table> {
    let header_row = settings.header_row;
    if grid.len() <= header_row {
        return Err(LoadError::HeaderRowMissing {
            row: header_row + 1,
            available: grid.len(),
        });
    }

    let width = grid[header_row..].iter().map(Vec::len).max().unwrap_or(0);
    let headers = header_names(&grid[header_row], width);

    let mut table = Table::new(headers.clone());
    for cells in grid.into_iter().skip(header_row + 1) {
        if cells.iter().all(is_blank) {
            continue;
        }

        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = cells.get(i).cloned().unwrap_or(Value::Null);
            let value = if settings.text_columns.iter().any(|c| c == header) {
                force_text(raw)
            } else if infer_numbers {
                infer_number(raw)
            } else {
                raw
            };
            row.insert(header.clone(), value);
        }
        table.push_row(row);
    }

    Ok(table)
}

/// Header names for `width` columns: blank → `Unnamed: i`, repeats → `name.n`.
fn header_names(cells: &[Value], width: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(width);

    for i in 0..width {
        let raw = cells.get(i).map(cell_text).unwrap_or_default();
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

fn force_text(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s),
        other => Value::String(cell_text(&other)),
    }
}

fn infer_number(value: Value) -> Value {
    match &value {
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => number_value(n),
            _ => value,
        },
        _ => value,
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()
        }
        // UTF-8 and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the leading lines.
///
/// Catalog exports open with title rows that hold few or no separators,
/// so the counts of the first 20 lines are summed.
pub fn detect_delimiter(content: &str) -> char {
    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count: usize = content
            .lines()
            .take(20)
            .map(|line| line.matches(sep).count())
            .sum();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(header_row: usize) -> SourceSettings {
        SourceSettings {
            header_row,
            text_columns: vec!["Codigo".to_string()],
        }
    }

    fn csv_with_preamble(body: &str) -> String {
        let mut content = String::new();
        for i in 0..11 {
            content.push_str(&format!("Titulo {}\n", i));
        }
        content.push_str(body);
        content
    }

    #[test]
    fn test_header_on_twelfth_row() {
        let content = csv_with_preamble("orden;Linea;Codigo;Rubro\n1;8;00123;5 - Bebidas\n2;31;456;5 - Bebidas\n");
        let loaded = load_delimited_bytes(content.as_bytes(), &settings(11)).unwrap();

        assert_eq!(loaded.delimiter, Some(';'));
        assert_eq!(loaded.table.columns(), &["orden", "Linea", "Codigo", "Rubro"]);
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.skipped_rows, 11);
    }

    #[test]
    fn test_codigo_stays_text() {
        let content = csv_with_preamble("Codigo;l1 5\n00123;100.5\n");
        let loaded = load_delimited_bytes(content.as_bytes(), &settings(11)).unwrap();

        assert_eq!(loaded.table.get(0, "Codigo"), Some(&json!("00123")));
        assert_eq!(loaded.table.get(0, "l1 5"), Some(&json!(100.5)));
    }

    #[test]
    fn test_header_row_missing() {
        let err = load_delimited_bytes(b"a;b\n1;2\n", &settings(11)).unwrap_err();
        assert!(matches!(err, LoadError::HeaderRowMissing { row: 12, available: 2 }));
    }

    #[test]
    fn test_blank_rows_skipped() {
        let content = csv_with_preamble("a;b\n1;2\n;\n3;4\n");
        let loaded = load_delimited_bytes(content.as_bytes(), &settings(11)).unwrap();
        assert_eq!(loaded.table.len(), 2);
    }

    #[test]
    fn test_unnamed_and_duplicate_headers() {
        let names = header_names(&[json!("orden"), Value::Null, json!("l2 5"), json!("l2 5")], 5);
        assert_eq!(names, vec!["orden", "Unnamed: 1", "l2 5", "l2 5.1", "Unnamed: 4"]);
    }

    #[test]
    fn test_numeric_header_text() {
        let names = header_names(&[json!(0.05), json!(0.11)], 2);
        assert_eq!(names, vec!["0.05", "0.11"]);
    }

    #[test]
    fn test_grid_keeps_types_without_inference() {
        let mut grid = vec![Vec::new(); 2];
        grid.push(vec![json!("Codigo"), json!("Linea")]);
        grid.push(vec![json!(123.0), json!(8.0)]);
        let table = table_from_grid(grid, &settings(2), false).unwrap();

        assert_eq!(table.get(0, "Codigo"), Some(&json!("123")));
        assert_eq!(table.get(0, "Linea"), Some(&json!(8.0)));
    }

    #[test]
    fn test_short_rows_padded_with_null() {
        let grid = vec![vec![json!("a"), json!("b"), json!("c")], vec![json!("x")]];
        let table = table_from_grid(grid, &settings(0), false).unwrap();
        assert_eq!(table.get(0, "c"), Some(&Value::Null));
    }

    /// Workbook with the header on row 12 starting at column B, as exported
    /// catalogs usually are. Nothing is written above the header or in column A.
    fn write_offset_workbook(path: &Path) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet().set_name("Madre").unwrap();
        for (col, name) in ["Linea", "Codigo", "Rubro"].iter().enumerate() {
            sheet.write_string(11, col as u16 + 1, *name).unwrap();
        }
        sheet.write_number(12, 1, 8).unwrap();
        sheet.write_number(12, 2, 42).unwrap();
        sheet.write_string(12, 3, "5 - Bebidas").unwrap();
        // row 14 left blank
        sheet.write_number(14, 1, 31).unwrap();
        sheet.write_string(14, 2, "00042").unwrap();
        sheet.write_boolean(14, 3, true).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_workbook_offsets_restored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogo.xlsx");
        write_offset_workbook(&path);

        let loaded = load_catalog(&path, &settings(11)).unwrap();
        assert_eq!(loaded.format, SourceFormat::Spreadsheet);
        assert_eq!(loaded.sheet.as_deref(), Some("Madre"));
        assert_eq!(loaded.skipped_rows, 11);

        let table = &loaded.table;
        assert_eq!(table.columns(), &["Unnamed: 0", "Linea", "Codigo", "Rubro"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Unnamed: 0"), Some(&Value::Null));
        assert_eq!(table.get(0, "Linea"), Some(&json!(8.0)));
        assert_eq!(table.get(0, "Linea").and_then(crate::models::line_code), Some(8));
        assert_eq!(table.get(0, "Codigo"), Some(&json!("42")));
        assert_eq!(table.get(0, "Rubro"), Some(&json!("5 - Bebidas")));
        assert_eq!(table.get(1, "Codigo"), Some(&json!("00042")));
        assert_eq!(table.get(1, "Rubro"), Some(&json!(true)));
    }

    #[test]
    fn test_workbook_header_row_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogo.xlsx");
        write_offset_workbook(&path);

        let err = load_spreadsheet(&path, &settings(20)).unwrap_err();
        assert!(matches!(err, LoadError::HeaderRowMissing { row: 21, available: 15 }));
    }

    #[test]
    fn test_data_to_value() {
        assert_eq!(data_to_value(&Data::Empty), Value::Null);
        assert_eq!(data_to_value(&Data::String(String::new())), Value::Null);
        assert_eq!(data_to_value(&Data::Float(12.5)), json!(12.5));
        assert_eq!(data_to_value(&Data::Int(7)), json!(7));
        assert_eq!(data_to_value(&Data::Bool(false)), json!(false));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_catalog("catalogo.pdf", &settings(11)).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "pdf"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_ignores_title_rows() {
        let content = "CATALOGO\nLista de precios\na,b,c\n1,2,3";
        assert_eq!(detect_delimiter(content), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Línea" in ISO-8859-1
        let bytes: &[u8] = &[0x4C, 0xED, 0x6E, 0x65, 0x61];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Línea");
    }
}
