// Sheet layout: label geometry, grid placement with pagination, the barcode
// cell painter, and fill analysis.

pub mod compact;
pub mod fill;
pub mod geometry;
pub mod painter;
pub mod sheet;

pub use fill::{analyze_sheet_fill, SheetFillAnalysis};
pub use geometry::{default_geometry, LabelGeometry};
pub use painter::BarcodeCellPainter;
pub use sheet::Sheet;
