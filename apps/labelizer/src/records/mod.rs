//! Record normalization: turns raw spreadsheet rows into product records.
//!
//! Rows are assumed ordered. A short row ends the file (the usual cause is a
//! trailing blank line); an invalid row is skipped and the loop moves on.
//! A row with a count and a code but no name is a record with an empty caption.

pub mod caption;

use serde::Serialize;
use tracing::{debug, warn};

pub use caption::CaptionLayout;

/// Minimum number of fields a row must carry: print count, code, name.
pub const REQUIRED_FIELDS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// One spreadsheet row with cells rendered as strings.
///
/// A row whose cells are all blank has no fields at all. Any other row keeps
/// every cell, blank ones included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based row number in the worksheet, for operator messages.
    pub row: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new(row: usize, fields: Vec<String>) -> Self {
        let fields = if fields.iter().all(|f| f.trim().is_empty()) {
            Vec::new()
        } else {
            fields
        };
        RawRow { row, fields }
    }
}

/// A normalized product row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub row: usize,
    pub print_count: u32,
    pub code: String,
    pub name: String,
}

/// Result of normalizing a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record(ProductRecord),
    /// Fewer than three fields: stop processing the remaining rows.
    ShortRow,
    /// Three fields but unusable: skip this row and continue.
    Invalid { row: usize, reason: String },
}

/// Records extracted from one file, plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRows {
    pub records: Vec<ProductRecord>,
    pub rejected: Vec<(usize, String)>,
    /// Row number of the short row that ended the scan, if any.
    pub stopped_at: Option<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes one row.
pub fn normalize_row(raw: &RawRow) -> RowOutcome {
    if raw.fields.len() < REQUIRED_FIELDS {
        return RowOutcome::ShortRow;
    }

    let count_field = raw.fields[0].trim();
    let print_count = match count_field.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            return RowOutcome::Invalid {
                row: raw.row,
                reason: format!("print count {count_field:?} is not a non-negative integer"),
            }
        }
    };

    let code = raw.fields[1].trim();
    if code.is_empty() {
        return RowOutcome::Invalid {
            row: raw.row,
            reason: "product code is blank".to_string(),
        };
    }

    RowOutcome::Record(ProductRecord {
        row: raw.row,
        print_count,
        code: code.to_string(),
        name: raw.fields[2].clone(),
    })
}

/// Normalizes rows in order, stopping at the first short row.
pub fn normalize_rows(rows: &[RawRow]) -> NormalizedRows {
    let mut out = NormalizedRows::default();

    for raw in rows {
        debug!(row = raw.row, fields = %raw.fields.join(" : "), "Row");
        match normalize_row(raw) {
            RowOutcome::Record(record) => out.records.push(record),
            RowOutcome::ShortRow => {
                out.stopped_at = Some(raw.row);
                break;
            }
            RowOutcome::Invalid { row, reason } => {
                warn!(row, %reason, "Skipping invalid row");
                out.rejected.push((row, reason));
            }
        }
    }

    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: usize, fields: &[&str]) -> RawRow {
        RawRow::new(n, fields.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_raw_row_keeps_blank_cells_unless_row_is_blank() {
        let r = row(4, &["2", "012345678905", ""]);
        assert_eq!(r.fields.len(), 3, "a blank name is still a field");
        let blank = row(5, &["", " ", ""]);
        assert!(blank.fields.is_empty());
    }

    #[test]
    fn test_blank_name_is_a_record_with_empty_name() {
        let outcome = normalize_row(&row(2, &["2", "036000291452", ""]));
        assert!(
            matches!(&outcome, RowOutcome::Record(r) if r.name.is_empty() && r.print_count == 2),
            "got {outcome:?}"
        );
    }

    #[test]
    fn test_blank_name_does_not_end_file() {
        let rows = vec![
            row(1, &["1", "012345678905", "Widget"]),
            row(2, &["2", "036000291452", ""]),
            row(3, &["3", "042100005264", "Gizmo"]),
        ];
        let out = normalize_rows(&rows);
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.stopped_at, None);
        assert_eq!(out.records[2].name, "Gizmo");
    }

    #[test]
    fn test_normalize_valid_row() {
        let outcome = normalize_row(&row(1, &["2", "012345678905", "Widget"]));
        assert_eq!(
            outcome,
            RowOutcome::Record(ProductRecord {
                row: 1,
                print_count: 2,
                code: "012345678905".to_string(),
                name: "Widget".to_string(),
            })
        );
    }

    #[test]
    fn test_short_row_signals_stop() {
        assert_eq!(normalize_row(&row(3, &["2", "012345678905"])), RowOutcome::ShortRow);
        assert_eq!(normalize_row(&row(3, &[])), RowOutcome::ShortRow);
    }

    #[test]
    fn test_non_numeric_print_count_is_invalid() {
        match normalize_row(&row(7, &["abc", "012345678905", "Widget"])) {
            RowOutcome::Invalid { row, reason } => {
                assert_eq!(row, 7);
                assert!(reason.contains("abc"), "reason should quote the value: {reason}");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_print_count_is_invalid() {
        assert!(matches!(
            normalize_row(&row(2, &["-1", "012345678905", "Widget"])),
            RowOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_zero_print_count_is_valid() {
        assert!(matches!(
            normalize_row(&row(2, &["0", "012345678905", "Widget"])),
            RowOutcome::Record(ProductRecord { print_count: 0, .. })
        ));
    }

    #[test]
    fn test_blank_code_is_invalid() {
        assert!(matches!(
            normalize_row(&row(2, &["1", "  ", "Widget"])),
            RowOutcome::Invalid { .. }
        ));
    }

    #[test]
    fn test_normalize_rows_skips_invalid_and_stops_at_short_row() {
        let rows = vec![
            row(1, &["1", "012345678905", "Widget"]),
            row(2, &["abc", "036000291452", "Gadget"]),
            row(3, &["3", "036000291452", "Gadget"]),
            row(4, &[]),
            row(5, &["9", "042100005264", "Never reached"]),
        ];
        let out = normalize_rows(&rows);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].code, "012345678905");
        assert_eq!(out.records[1].print_count, 3);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].0, 2);
        assert_eq!(out.stopped_at, Some(4), "row after the short row must not be read");
    }
}
