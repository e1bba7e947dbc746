//! Sheet fill analysis: how much of the printed stock a document uses.
//!
//! Skipped cells count as used, since they are already gone from the stock.

use serde::Serialize;

use crate::layout::geometry::LabelGeometry;
use crate::layout::sheet::Placement;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SheetFillVerdict {
    /// No labels placed.
    Empty,
    /// Every page is completely used.
    FullPages,
    /// The last page has free cells left.
    PartialLastPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetFillAnalysis {
    pub pages: usize,
    pub labels_placed: usize,
    pub cells_available: usize,
    /// Free cells remaining on the last page.
    pub cells_unused: usize,
    pub last_page_fill: f32,
    pub verdict: SheetFillVerdict,
}

/// Analyzes placements made on a sheet with the given geometry.
pub fn analyze_sheet_fill<P>(placements: &[Placement<P>], geometry: &LabelGeometry) -> SheetFillAnalysis {
    let per_page = geometry.cells_per_page() as usize;
    let Some(last) = placements.last() else {
        return SheetFillAnalysis {
            pages: 0,
            labels_placed: 0,
            cells_available: 0,
            cells_unused: 0,
            last_page_fill: 0.0,
            verdict: SheetFillVerdict::Empty,
        };
    };

    let pages = last.page + 1;
    let last_index = last.row as usize * geometry.columns as usize + last.column as usize;
    let used_on_last = last_index + 1;
    let cells_unused = per_page.saturating_sub(used_on_last);

    SheetFillAnalysis {
        pages,
        labels_placed: placements.len(),
        cells_available: pages * per_page,
        cells_unused,
        last_page_fill: used_on_last as f32 / per_page.max(1) as f32,
        verdict: if cells_unused == 0 {
            SheetFillVerdict::FullPages
        } else {
            SheetFillVerdict::PartialLastPage
        },
    }
}
