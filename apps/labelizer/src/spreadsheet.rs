//! Spreadsheet input via calamine.
//!
//! Only the first worksheet is read, and only columns A–C (print count,
//! product code, product name). Cells are rendered to strings the way a
//! string-typed read would see them: whole floats lose their `.0`.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::errors::LabelError;
use crate::records::{RawRow, REQUIRED_FIELDS};

/// Reads the first worksheet of `path` into raw rows.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>, LabelError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LabelError::EmptyWorkbook(path.to_path_buf()))??;

    let (Some((first_row, _)), Some((last_row, _))) = (range.start(), range.end()) else {
        debug!(file = %path.display(), "Worksheet is empty");
        return Ok(Vec::new());
    };

    let rows = (first_row..=last_row)
        .map(|r| {
            let fields = (0..REQUIRED_FIELDS as u32)
                .map(|c| range.get_value((r, c)).map(cell_to_string).unwrap_or_default())
                .collect();
            RawRow::new(r as usize + 1, fields)
        })
        .collect::<Vec<_>>();

    debug!(file = %path.display(), rows = rows.len(), "Read worksheet");
    Ok(rows)
}

/// Renders a cell as text.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_float(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

// Product codes stored as numbers come back as floats.
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    #[test]
    fn test_cell_to_string_whole_float_has_no_fraction() {
        assert_eq!(cell_to_string(&Data::Float(2.0)), "2");
        assert_eq!(cell_to_string(&Data::Float(36000291452.0)), "36000291452");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
    }

    #[test]
    fn test_cell_to_string_passes_strings_through() {
        assert_eq!(cell_to_string(&Data::String("012345678905".to_string())), "012345678905");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_read_rows_from_xlsx() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_number(0, 0, 2).unwrap();
        sheet.write_string(0, 1, "012345678905").unwrap();
        sheet.write_string(0, 2, "Widget").unwrap();
        sheet.write_number(1, 0, 1).unwrap();
        sheet.write_number(1, 1, 36000291452.0).unwrap();
        sheet.write_string(1, 2, "Gadget").unwrap();
        sheet.write_string(1, 3, "ignored column").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].fields, vec!["2", "012345678905", "Widget"]);
        assert_eq!(rows[1].fields, vec!["1", "36000291452", "Gadget"]);
    }

    #[test]
    fn test_read_rows_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = read_rows(&dir.path().join("absent.xlsx"));
        assert!(result.is_err());
    }
}
