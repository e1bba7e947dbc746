use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type.
/// Each variant maps to one failure boundary of the labelling pipeline.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook has no worksheets: {0}")]
    EmptyWorkbook(PathBuf),

    /// Caption wrapping found no space at or after the break threshold.
    #[error("No line break point in caption: {0:?}")]
    NoBreakPoint(String),

    #[error("Invalid product code {code:?}: {reason}")]
    InvalidCode { code: String, reason: String },

    #[error("No barcode image for code {code:?} at {}", path.display())]
    MissingImage { code: String, path: PathBuf },

    #[error("Invalid layout request: {0}")]
    Layout(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    /// True for the coarse failure that ends a file's barcode generation
    /// instead of skipping a single record.
    pub fn stops_generation(&self) -> bool {
        matches!(self, LabelError::NoBreakPoint(_))
    }
}
