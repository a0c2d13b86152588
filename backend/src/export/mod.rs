//! Styled workbook export and console preview.
//!
//! # Layout
//!
//! ```text
//! row 1   CATÁLOGO MADRE - EXPORTACIÓN
//! row 2   Fecha: 2024-05-02 10:31:07
//! row 3   Zona: INTERIOR
//! row 4   Líneas procesadas: [1, 2, 8]
//! row 5   Total productos: 128
//! row 6   header (bold, white on blue, centered, bordered)
//! row 7+  one row per catalog row (bordered, numeric columns as 0.00)
//! ```
//!
//! The workbook is built in memory and saved once; a failure leaves no file.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog::export::{export_catalog, ExportMeta};
//!
//! let meta = ExportMeta::new(Zone::GbaCaba, vec![1, 2]);
//! export_catalog(&table, &meta, "salida.xlsx", &profile.export)?;
//! ```

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::config::ExportSettings;
use crate::error::{ExportError, ExportResult};
use crate::models::{cell_text, number_value, round2, to_number, Table, Zone};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
const METADATA_ROWS: usize = 5;

/// Run details written in the metadata block.
#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub zone: Zone,
    pub lines: Vec<u32>,
    pub generated_at: DateTime<Local>,
}

impl ExportMeta {
    /// Metadata stamped with the current local time.
    pub fn new(zone: Zone, lines: Vec<u32>) -> Self {
        Self {
            zone,
            lines,
            generated_at: Local::now(),
        }
    }

    /// The five metadata lines for a table of `total` rows.
    pub fn header_lines(&self, total: usize, settings: &ExportSettings) -> [String; METADATA_ROWS] {
        [
            settings.title.clone(),
            format!(
                "{}: {}",
                settings.date_label,
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("{}: {}", settings.zone_label, self.zone),
            format!("{}: {:?}", settings.lines_label, self.lines),
            format!("{}: {}", settings.total_label, total),
        ]
    }
}

/// Coerce the known numeric columns to numbers rounded to 2 decimals.
///
/// Invalid cells become null. Columns not present are ignored.
pub fn normalize_numeric(table: &Table, settings: &ExportSettings) -> Table {
    let mut out = table.clone();
    for column in &settings.numeric_columns {
        out.map_column(column, |value| {
            to_number(value)
                .map(|n| number_value(round2(n)))
                .unwrap_or(Value::Null)
        });
    }
    out
}

/// Write `table` as a styled single-sheet workbook at `path`.
///
/// Numeric columns are normalized first; the caller's table is not modified.
pub fn export_catalog<P: AsRef<Path>>(
    table: &Table,
    meta: &ExportMeta,
    path: P,
    settings: &ExportSettings,
) -> ExportResult<()> {
    if table.len() + METADATA_ROWS + 1 > MAX_ROWS {
        return Err(ExportError::TooLarge(format!("{} rows", table.len())));
    }
    if table.columns().len() > MAX_COLUMNS {
        return Err(ExportError::TooLarge(format!("{} columns", table.columns().len())));
    }

    let table = normalize_numeric(table, settings);
    let numeric: HashSet<&str> = settings.numeric_columns.iter().map(String::as_str).collect();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(parse_rgb(&settings.header_color)))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);
    let number_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_num_format(&settings.number_format);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(&settings.sheet_name)?;

    let metadata = meta.header_lines(table.len(), settings);
    for (row, line) in metadata.iter().enumerate() {
        worksheet.write_string(row as u32, 0, line)?;
    }

    let header_row = METADATA_ROWS as u32;
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(header_row, col as u16, name, &header_format)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        let excel_row = header_row + 1 + r as u32;
        for (col, name) in table.columns().iter().enumerate() {
            let excel_col = col as u16;
            let format = if numeric.contains(name.as_str()) {
                &number_format
            } else {
                &cell_format
            };

            let value = row.get(name).unwrap_or(&Value::Null);
            match value {
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        worksheet.write_number_with_format(excel_row, excel_col, f, format)?;
                    }
                    None => {
                        worksheet.write_blank(excel_row, excel_col, format)?;
                    }
                },
                Value::Bool(b) => {
                    worksheet.write_boolean_with_format(excel_row, excel_col, *b, format)?;
                }
                Value::String(s) if !s.is_empty() => {
                    worksheet.write_string_with_format(excel_row, excel_col, s, format)?;
                }
                _ => {
                    worksheet.write_blank(excel_row, excel_col, format)?;
                }
            }
        }
    }

    for (col, width) in column_widths(&table, &metadata).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

/// Column widths in characters: the longest text in each column plus 2.
///
/// `metadata` lines sit in the first column and count toward its width.
/// Null cells count as empty.
pub fn column_widths<S: AsRef<str>>(table: &Table, metadata: &[S]) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let longest_cell = table
                .column_values(name)
                .map(|v| cell_text(v).chars().count())
                .max()
                .unwrap_or(0);
            let longest_meta = if col == 0 {
                metadata.iter().map(|l| l.as_ref().chars().count()).max().unwrap_or(0)
            } else {
                0
            };
            name.chars().count().max(longest_cell).max(longest_meta) + 2
        })
        .collect()
}

/// `RRGGBB` hex to a packed RGB value; black when unparsable.
fn parse_rgb(hex: &str) -> u32 {
    u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0)
}

// =============================================================================
// Preview
// =============================================================================

/// Text snapshot of the first rows for the console.
///
/// Shows the configured preview columns that exist (all columns when none
/// does). The selected price is rendered as `1,234.50`, display only.
pub fn preview(table: &Table, settings: &ExportSettings, price_column: &str) -> String {
    let wanted: Vec<&str> = settings
        .preview_columns
        .iter()
        .map(String::as_str)
        .filter(|c| table.has_column(c))
        .collect();
    let head = if wanted.is_empty() {
        table.head(settings.preview_rows)
    } else {
        table.select_columns(&wanted).head(settings.preview_rows)
    };

    let columns = head.columns();
    let mut cells: Vec<Vec<String>> = vec![columns.to_vec()];
    for row in head.rows() {
        cells.push(
            columns
                .iter()
                .map(|c| {
                    let value = row.get(c).unwrap_or(&Value::Null);
                    if c == price_column {
                        to_number(value).map(format_thousands).unwrap_or_default()
                    } else {
                        cell_text(value)
                    }
                })
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| cells.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    cells
        .iter()
        .map(|r| {
            r.iter()
                .zip(&widths)
                .map(|(text, &w)| format!("{:>w$}", text, w = w))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Two decimals with comma thousands separators: `1234.5` → `1,234.50`.
pub fn format_thousands(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if n < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use calamine::{open_workbook_auto, Data, Reader};
    use serde_json::json;
    use std::io::Read;
    use tempfile::tempdir;

    /// One XML part of a saved workbook package.
    fn package_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn attr(fragment: &str, name: &str) -> Option<String> {
        let key = format!(" {}=\"", name);
        let start = fragment.find(&key)? + key.len();
        let end = fragment[start..].find('"')? + start;
        Some(fragment[start..end].to_string())
    }

    /// Style index of `cell` in sheet XML (0 when unstyled).
    fn cell_style(sheet: &str, cell: &str) -> usize {
        let open = format!("<c r=\"{}\"", cell);
        let start = sheet.find(&open).unwrap_or_else(|| panic!("no cell {}", cell));
        let end = sheet[start..].find('>').unwrap() + start;
        attr(&sheet[start..end], "s").map(|s| s.parse().unwrap()).unwrap_or(0)
    }

    /// The `<xf>` entries of `<cellXfs>`, in index order.
    fn cell_xfs(styles: &str) -> Vec<String> {
        let start = styles.find("<cellXfs").unwrap();
        let end = styles.find("</cellXfs>").unwrap();
        styles[start..end].split("<xf ").skip(1).map(|xf| format!(" {}", xf)).collect()
    }

    fn processed() -> Table {
        Table::from_records(
            ["orden", "ord", "Rubro", "Marca", "precio_seleccionado", "l1 5", "0.05"],
            vec![
                json!({"orden": 1, "ord": "a12.eps", "Rubro": "5 - Bebidas", "Marca": "Alfa", "precio_seleccionado": 1234.5, "l1 5": "1234.499", "0.05": 1}),
                json!({"orden": 2, "ord": "Vacio.eps", "Rubro": "5 - Bebidas", "Marca": "", "precio_seleccionado": null, "l1 5": "x", "0.05": 0.0}),
            ],
        )
    }

    #[test]
    fn test_normalize_rounds_and_nulls() {
        let settings = Profile::default().export;
        let out = normalize_numeric(&processed(), &settings);
        assert_eq!(out.get(0, "l1 5"), Some(&json!(1234.5)));
        assert_eq!(out.get(1, "l1 5"), Some(&Value::Null));
        assert_eq!(out.get(0, "0.05"), Some(&json!(1.0)));
        // non-numeric columns untouched
        assert_eq!(out.get(0, "orden"), Some(&json!(1)));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(-1.005_000_1), -1.01);
    }

    #[test]
    fn test_header_lines() {
        let settings = Profile::default().export;
        let meta = ExportMeta::new(Zone::Interior, vec![1, 8, 32]);
        let lines = meta.header_lines(42, &settings);
        assert_eq!(lines[0], "CATÁLOGO MADRE - EXPORTACIÓN");
        assert!(lines[1].starts_with("Fecha: "));
        assert_eq!(lines[1].len(), "Fecha: 2024-01-01 00:00:00".len());
        assert_eq!(lines[2], "Zona: INTERIOR");
        assert_eq!(lines[3], "Líneas procesadas: [1, 8, 32]");
        assert_eq!(lines[4], "Total productos: 42");
    }

    #[test]
    fn test_export_layout_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("salida.xlsx");
        let settings = Profile::default().export;
        let meta = ExportMeta::new(Zone::GbaCaba, vec![1, 2]);

        export_catalog(&processed(), &meta, &path, &settings).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Catálogo Procesado".to_string()]);
        let range = workbook.worksheet_range("Catálogo Procesado").unwrap();

        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("CATÁLOGO MADRE - EXPORTACIÓN".into()))
        );
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("Zona: GBA-CABA".into())));
        assert_eq!(range.get_value((4, 0)), Some(&Data::String("Total productos: 2".into())));
        assert_eq!(range.get_value((5, 0)), Some(&Data::String("orden".into())));
        assert_eq!(range.get_value((5, 4)), Some(&Data::String("precio_seleccionado".into())));
        assert_eq!(range.get_value((6, 1)), Some(&Data::String("a12.eps".into())));
        assert_eq!(range.get_value((6, 4)), Some(&Data::Float(1234.5)));
        assert_eq!(range.get_value((7, 1)), Some(&Data::String("Vacio.eps".into())));
    }

    #[test]
    fn test_export_styles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("salida.xlsx");
        let settings = Profile::default().export;
        let meta = ExportMeta::new(Zone::GbaCaba, vec![1, 2]);
        export_catalog(&processed(), &meta, &path, &settings).unwrap();

        let styles = package_part(&path, "xl/styles.xml");
        let sheet = package_part(&path, "xl/worksheets/sheet1.xml");
        let xfs = cell_xfs(&styles);

        let fmt_start = styles.find("formatCode=\"0.00\"").expect("0.00 number format");
        let fmt_open = styles[..fmt_start].rfind("<numFmt ").unwrap();
        let two_decimals = attr(&styles[fmt_open..fmt_start], "numFmtId").unwrap();

        // header: bold white text on the configured fill, centered, bordered
        assert!(styles.contains("<b/>"));
        assert!(styles.contains("rgb=\"FF366092\""));
        assert!(styles.contains("rgb=\"FFFFFFFF\""));
        let header = &xfs[cell_style(&sheet, "E6")];
        assert_ne!(attr(header, "fontId").as_deref(), Some("0"));
        assert_ne!(attr(header, "fillId").as_deref(), Some("0"));
        assert_ne!(attr(header, "borderId").as_deref(), Some("0"));
        assert!(header.contains("horizontal=\"center\""));

        // numeric columns carry 0.00, including blank cells; others only a border
        for cell in ["E7", "F7", "G7", "E8", "F8"] {
            let xf = &xfs[cell_style(&sheet, cell)];
            assert_eq!(attr(xf, "numFmtId"), Some(two_decimals.clone()), "{}", cell);
            assert_ne!(attr(xf, "borderId").as_deref(), Some("0"), "{}", cell);
        }
        for cell in ["A7", "B7", "C7", "D7", "D8"] {
            let xf = &xfs[cell_style(&sheet, cell)];
            assert_eq!(attr(xf, "numFmtId").as_deref(), Some("0"), "{}", cell);
            assert_ne!(attr(xf, "borderId").as_deref(), Some("0"), "{}", cell);
        }

        // metadata rows are unstyled
        assert_eq!(cell_style(&sheet, "A1"), 0);
    }

    #[test]
    fn test_column_widths() {
        let settings = Profile::default().export;
        let table = normalize_numeric(&processed(), &settings);
        let meta = ExportMeta::new(Zone::GbaCaba, vec![1, 2]);
        let widths = column_widths(&table, &meta.header_lines(table.len(), &settings));

        // column A sized by the title line
        assert_eq!(widths[0], "CATÁLOGO MADRE - EXPORTACIÓN".chars().count() + 2);
        // header longer than every value
        assert_eq!(widths[4], "precio_seleccionado".len() + 2);
        // value longer than the header
        assert_eq!(widths[2], "5 - Bebidas".len() + 2);
        // null and empty cells count as zero
        let sparse = Table::from_records(["k"], vec![json!({"k": null}), json!({"k": ""})]);
        assert_eq!(column_widths::<&str>(&sparse, &[]), vec![3]);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let settings = Profile::default().export;
        let meta = ExportMeta::new(Zone::GbaCaba, vec![1]);
        let result = export_catalog(&processed(), &meta, "/no/such/dir/out.xlsx", &settings);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_sheet_name_rejected() {
        let dir = tempdir().unwrap();
        let mut settings = Profile::default().export;
        settings.sheet_name = "bad[name]".to_string();
        let meta = ExportMeta::new(Zone::GbaCaba, vec![1]);
        let err = export_catalog(&processed(), &meta, dir.path().join("x.xlsx"), &settings).unwrap_err();
        assert!(matches!(err, ExportError::Xlsx(_)));
        assert!(!dir.path().join("x.xlsx").exists());
    }

    #[test]
    fn test_preview_formats_price() {
        let settings = Profile::default().export;
        let text = preview(&processed(), &settings, "precio_seleccionado");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("orden"));
        assert!(!lines[0].contains("ord "));
        assert!(lines[1].contains("1,234.50"));
        assert!(!text.contains("l1 5"));
    }

    #[test]
    fn test_preview_falls_back_to_all_columns() {
        let settings = Profile::default().export;
        let table = Table::from_records(["x", "y"], vec![json!({"x": 1, "y": "a"})]);
        let text = preview(&table, &settings, "precio_seleccionado");
        assert!(text.starts_with('x'));
        assert!(text.contains('y'));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1234.5), "1,234.50");
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(999.999), "1,000.00");
        assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
        assert_eq!(format_thousands(-12345.0), "-12,345.00");
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("366092"), 0x366092);
        assert_eq!(parse_rgb("zz"), 0);
    }
}
