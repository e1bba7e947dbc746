//! Label sheet geometry.
//!
//! All lengths are millimetres. Cells are numbered row-major from the top-left.

use serde::Serialize;
use tracing::warn;

pub const MM_PER_INCH: f32 = 25.4;
pub const MM_PER_PT: f32 = MM_PER_INCH / 72.0;

/// Converts decimal inches to millimetres.
pub fn inches_to_mm(inches: f32) -> f32 {
    inches * MM_PER_INCH
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

/// Physical layout of one label sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGeometry {
    pub sheet_width: f32,
    pub sheet_height: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub left_margin: f32,
    pub columns: u32,
    pub rows: u32,
    pub column_gap: f32,
    pub row_gap: f32,
    pub label_width: f32,
    pub label_height: f32,
}

/// Cell rectangle in page coordinates (origin bottom-left, millimetres).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFrame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Returns the default sheet: US letter, 3 × 10 labels of 2.625" × 1".
pub fn default_geometry() -> LabelGeometry {
    LabelGeometry {
        sheet_width: inches_to_mm(8.5),
        sheet_height: inches_to_mm(11.0),
        top_margin: inches_to_mm(0.5),
        bottom_margin: inches_to_mm(0.5),
        left_margin: inches_to_mm(0.1875),
        columns: 3,
        rows: 10,
        column_gap: inches_to_mm(0.125),
        row_gap: inches_to_mm(0.0),
        label_width: inches_to_mm(2.625),
        label_height: inches_to_mm(1.0),
    }
}

impl LabelGeometry {
    pub fn cells_per_page(&self) -> u32 {
        self.columns * self.rows
    }

    /// Horizontal extent of the label grid including the left margin.
    pub fn used_width(&self) -> f32 {
        self.left_margin
            + self.columns as f32 * self.label_width
            + self.columns.saturating_sub(1) as f32 * self.column_gap
    }

    /// Vertical extent of the label grid including both margins.
    pub fn used_height(&self) -> f32 {
        self.top_margin
            + self.bottom_margin
            + self.rows as f32 * self.label_height
            + self.rows.saturating_sub(1) as f32 * self.row_gap
    }

    pub fn right_margin(&self) -> f32 {
        self.sheet_width - self.used_width()
    }

    /// Frame of the cell at (`row`, `column`), both 0-based from the top-left.
    pub fn cell_frame(&self, row: u32, column: u32) -> CellFrame {
        let x = self.left_margin + column as f32 * (self.label_width + self.column_gap);
        let top = self.sheet_height
            - self.top_margin
            - row as f32 * (self.label_height + self.row_gap);
        CellFrame {
            x,
            y: top - self.label_height,
            width: self.label_width,
            height: self.label_height,
        }
    }

    /// Consistency problems with this geometry. Empty when it fits the sheet.
    ///
    /// Rounding of inch conversions is tolerated up to 0.01mm.
    pub fn check(&self) -> Vec<String> {
        const TOLERANCE: f32 = 0.01;
        let mut problems = Vec::new();

        if self.columns == 0 || self.rows == 0 {
            problems.push(format!(
                "grid has {} columns and {} rows",
                self.columns, self.rows
            ));
        }
        if self.label_width <= 0.0 || self.label_height <= 0.0 {
            problems.push("label dimensions must be positive".to_string());
        }
        let excess_w = -self.right_margin();
        if excess_w > TOLERANCE {
            problems.push(format!("labels overrun sheet width by {excess_w:.2}mm"));
        }
        let excess_h = self.used_height() - self.sheet_height;
        if excess_h > TOLERANCE {
            problems.push(format!("labels overrun sheet height by {excess_h:.2}mm"));
        }

        problems
    }

    /// Logs each consistency problem; the geometry is used regardless.
    pub fn warn_if_inconsistent(&self) {
        for problem in self.check() {
            warn!(%problem, "Label geometry is inconsistent");
        }
    }
}
