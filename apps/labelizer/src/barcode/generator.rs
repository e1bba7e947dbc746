//! Barcode image generation for one file's records.
//!
//! # Failure policy
//! - A caption with no break point ends generation for the rest of the file.
//!   Images already written stay on disk.
//! - Any other per-record failure is logged and the next record is tried.
//!
//! A code repeated with the same name is rendered once. A code repeated with a
//! different name is rendered again, so the last row's caption is the one on
//! every label for that code.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use rusttype::Font;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::barcode::metrics::{check_caption_fit, CaptionFitVerdict};
use crate::barcode::render::{rasterize, write_image, WriterOptions};
use crate::barcode::symbology::SymbolEncoder;
use crate::errors::LabelError;
use crate::records::{CaptionLayout, ProductRecord};

/// What happened while generating a file's images.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub generated: Vec<String>,
    /// (code, error) for records skipped individually.
    pub failed: Vec<(String, String)>,
    /// Row at which generation was abandoned, if it was.
    pub halted_at_row: Option<usize>,
}

pub struct BarcodeGenerator {
    encoder: Arc<dyn SymbolEncoder>,
    options: WriterOptions,
    image_dir: PathBuf,
    font: Option<Font<'static>>,
}

impl BarcodeGenerator {
    pub fn new(
        encoder: Arc<dyn SymbolEncoder>,
        options: WriterOptions,
        image_dir: impl Into<PathBuf>,
        font: Option<Font<'static>>,
    ) -> Self {
        BarcodeGenerator {
            encoder,
            options,
            image_dir: image_dir.into(),
            font,
        }
    }

    /// Deterministic image path for a product code.
    pub fn image_path(&self, code: &str) -> PathBuf {
        self.image_dir
            .join(format!("{code}.{}", self.options.extension()))
    }

    /// Generates one image and returns its path.
    pub fn generate(&self, code: &str, name: &str) -> Result<PathBuf, LabelError> {
        let caption = CaptionLayout::for_name(name)?;
        let symbol = self.encoder.encode(code)?;
        let options = self.options.for_caption(&caption);

        let fit = check_caption_fit(&caption, options.image_width_mm(symbol.modules.len()));
        if let CaptionFitVerdict::Overflows { fraction } = fit.verdict {
            warn!(
                code,
                caption = %caption.single_line(),
                overflow = fraction,
                "Caption is wider than the barcode image"
            );
        }

        let img = rasterize(&symbol, &caption, &options, self.font.as_ref());
        let path = self.image_path(code);
        write_image(&img, &path, &options)?;
        debug!(
            code,
            symbology = self.encoder.name(),
            caption_lines = caption.line_count(),
            path = %path.display(),
            "Wrote barcode"
        );
        Ok(path)
    }

    /// Generates images for every record, in order, under the failure policy.
    ///
    /// A code already rendered with the same name is not rendered again.
    pub fn generate_all(&self, records: &[ProductRecord]) -> GenerationReport {
        info!(records = records.len(), "Generating barcodes");
        let mut report = GenerationReport::default();
        let mut rendered: HashMap<&str, &str> = HashMap::new();

        for record in records {
            if rendered.get(record.code.as_str()) == Some(&record.name.as_str()) {
                debug!(code = %record.code, "Barcode already generated for this file");
                continue;
            }

            match self.generate(&record.code, &record.name) {
                Ok(_) => {
                    rendered.insert(&record.code, &record.name);
                    report.generated.push(record.code.clone());
                }
                Err(e) if e.stops_generation() => {
                    error!(
                        row = record.row,
                        code = %record.code,
                        error = %e,
                        "Stopping barcode generation for this file"
                    );
                    report.halted_at_row = Some(record.row);
                    break;
                }
                Err(e) => {
                    error!(row = record.row, code = %record.code, error = %e, "Barcode generation failed");
                    report.failed.push((record.code.clone(), e.to_string()));
                }
            }
        }

        info!(
            generated = report.generated.len(),
            failed = report.failed.len(),
            halted = report.halted_at_row.is_some(),
            "Generation of barcode images is complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::symbology::UpcA;
    use tempfile::TempDir;

    fn record(row: usize, count: u32, code: &str, name: &str) -> ProductRecord {
        ProductRecord {
            row,
            print_count: count,
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    fn generator(dir: &TempDir) -> BarcodeGenerator {
        BarcodeGenerator::new(Arc::new(UpcA), WriterOptions::default(), dir.path(), None)
    }

    #[test]
    fn test_image_path_is_keyed_by_code() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        assert_eq!(g.image_path("012345678905"), dir.path().join("012345678905.png"));
    }

    #[test]
    fn test_generate_writes_png() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let path = g.generate("012345678905", "Widget").unwrap();
        assert!(path.exists());
        let img = image::open(&path).unwrap();
        assert!(img.width() > 0 && img.height() > 0);
    }

    #[test]
    fn test_bad_code_is_skipped_and_generation_continues() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let records = vec![
            record(1, 1, "NOTACODE", "Broken"),
            record(2, 1, "036000291452", "Gadget"),
        ];
        let report = g.generate_all(&records);
        assert_eq!(report.generated, vec!["036000291452".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.halted_at_row, None);
        assert!(g.image_path("036000291452").exists());
    }

    #[test]
    fn test_unbreakable_caption_halts_file_and_keeps_prior_images() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let records = vec![
            record(1, 1, "012345678905", "Widget"),
            record(2, 1, "036000291452", "Ab cdefghijklmnopqrstuvwxyz123"),
            record(3, 1, "042100005264", "Never generated"),
        ];
        let report = g.generate_all(&records);
        assert_eq!(report.generated, vec!["012345678905".to_string()]);
        assert_eq!(report.halted_at_row, Some(2));
        assert!(g.image_path("012345678905").exists(), "prior image must remain");
        assert!(!g.image_path("036000291452").exists());
        assert!(!g.image_path("042100005264").exists());
    }

    #[test]
    fn test_duplicate_codes_render_once() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let records = vec![
            record(1, 1, "012345678905", "Widget"),
            record(2, 4, "012345678905", "Widget"),
        ];
        let report = g.generate_all(&records);
        assert_eq!(report.generated.len(), 1);
    }

    #[test]
    fn test_repeated_code_with_new_name_uses_last_name() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let records = vec![
            record(1, 1, "012345678905", "Widget"),
            record(2, 1, "012345678905", "Stainless Steel Water Bottle 750ml"),
        ];
        let report = g.generate_all(&records);
        assert_eq!(report.generated.len(), 2);

        let reference_dir = TempDir::new().unwrap();
        let reference = generator(&reference_dir)
            .generate("012345678905", "Stainless Steel Water Bottle 750ml")
            .unwrap();
        assert_eq!(
            std::fs::read(g.image_path("012345678905")).unwrap(),
            std::fs::read(reference).unwrap(),
            "image must carry the last row's caption"
        );
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let g = generator(&dir);
        let path = g.generate("012345678905", "Widget").unwrap();
        let first = std::fs::read(&path).unwrap();
        g.generate("012345678905", "Widget").unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }
}
