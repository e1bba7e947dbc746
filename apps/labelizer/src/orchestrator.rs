//! Run orchestration: workspace cleanup, input discovery and the per-file
//! pipeline (parse → generate → lay out → save).
//!
//! A failure inside one file is reported and the run moves on to the next
//! file. Layout submission uses a single policy: a record without an image
//! is logged and skipped, later records are still placed.

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::barcode::{load_caption_font, BarcodeGenerator, GenerationReport};
use crate::errors::LabelError;
use crate::layout::{analyze_sheet_fill, BarcodeCellPainter, SheetFillAnalysis, Sheet};
use crate::records::{normalize_rows, CaptionLayout, NormalizedRows};
use crate::spreadsheet::read_rows;
use crate::state::RunState;

/// Spreadsheet extension accepted as input.
pub const INPUT_EXTENSION: &str = "xlsx";
/// Leading character of editor lock/temporary files.
pub const TEMP_FILE_MARKER: char = '~';
pub const OUTPUT_EXTENSION: &str = "pdf";

// ────────────────────────────────────────────────────────────────────────────
// Reports
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    Parsing,
    Generating,
    LayingOut,
    Saving,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FileStatus {
    Saved { output: PathBuf },
    Failed { stage: FileStage, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub records: usize,
    pub rejected_rows: Vec<(usize, String)>,
    pub stopped_at_row: Option<usize>,
    pub generation: GenerationReport,
    /// (code, count) in submission order.
    pub submitted: Vec<(String, u32)>,
    /// (code, reason) for records left off the sheet.
    pub skipped: Vec<(String, String)>,
    pub labels_placed: usize,
    pub fill: Option<SheetFillAnalysis>,
}

impl FileReport {
    fn new(file: String) -> Self {
        FileReport {
            file,
            status: FileStatus::Failed {
                stage: FileStage::Parsing,
                error: "not processed".to_string(),
            },
            records: 0,
            rejected_rows: Vec::new(),
            stopped_at_row: None,
            generation: GenerationReport::default(),
            submitted: Vec::new(),
            skipped: Vec::new(),
            labels_placed: 0,
            fill: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.status, FileStatus::Saved { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents_saved: usize,
    pub files_failed: usize,
    pub labels_placed: usize,
    pub files: Vec<FileReport>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct Orchestrator {
    state: RunState,
    generator: BarcodeGenerator,
}

impl Orchestrator {
    pub fn new(state: RunState) -> Self {
        let font = load_caption_font(state.config.caption_font.as_deref());
        let generator = BarcodeGenerator::new(
            state.encoder.clone(),
            state.writer_options.clone(),
            state.config.image_dir.clone(),
            font,
        );
        Orchestrator { state, generator }
    }

    /// Clears and runs every eligible input file.
    ///
    /// Only workspace preparation and input discovery fail the whole run.
    pub fn run(&self) -> Result<RunSummary, LabelError> {
        let started_at = Utc::now();
        self.state.geometry.warn_if_inconsistent();
        self.clear_workspace()?;

        let inputs = self.discover_inputs()?;
        info!(files = inputs.len(), dir = %self.state.config.input_dir.display(), "Found input spreadsheets");

        let files: Vec<FileReport> = inputs.iter().map(|path| self.process_file(path)).collect();

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            documents_saved: files.iter().filter(|f| f.is_saved()).count(),
            files_failed: files.iter().filter(|f| !f.is_saved()).count(),
            labels_placed: files.iter().map(|f| f.labels_placed).sum(),
            files,
        };
        info!(
            saved = summary.documents_saved,
            failed = summary.files_failed,
            labels = summary.labels_placed,
            "Run complete"
        );
        Ok(summary)
    }

    /// Creates the image and output directories if needed and removes the
    /// previous run's images and documents.
    pub fn clear_workspace(&self) -> Result<(), LabelError> {
        let config = &self.state.config;
        let removed_images = clear_dir(&config.image_dir, self.state.writer_options.extension())?;
        let removed_docs = clear_dir(&config.output_dir, OUTPUT_EXTENSION)?;
        info!(images = removed_images, documents = removed_docs, "Cleared workspace");
        Ok(())
    }

    /// Eligible spreadsheets in the input directory, sorted by name.
    pub fn discover_inputs(&self) -> Result<Vec<PathBuf>, LabelError> {
        let mut inputs = Vec::new();
        for entry in fs::read_dir(&self.state.config.input_dir)? {
            let path = entry?.path();
            if path.is_file() && is_eligible_input(&path) {
                inputs.push(path);
            }
        }
        inputs.sort();
        Ok(inputs)
    }

    /// Runs the pipeline for one spreadsheet. Never fails: errors are
    /// recorded in the returned report.
    pub fn process_file(&self, path: &Path) -> FileReport {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let span = info_span!("file", name = %file);
        let _guard = span.enter();
        info!("Processing spreadsheet");

        let mut report = FileReport::new(file);
        let mut stage = FileStage::Parsing;

        match self.run_stages(path, &mut report, &mut stage) {
            Ok(output) => {
                info!(output = %output.display(), labels = report.labels_placed, "Saved labels document");
                report.status = FileStatus::Saved { output };
            }
            Err(e) => {
                let chain = error_chain(&e);
                error!(stage = ?stage, error = %chain, "File failed");
                report.status = FileStatus::Failed { stage, error: chain };
            }
        }
        report
    }

    fn run_stages(
        &self,
        path: &Path,
        report: &mut FileReport,
        stage: &mut FileStage,
    ) -> Result<PathBuf, LabelError> {
        // Parsing
        let rows = read_rows(path)?;
        let NormalizedRows {
            records,
            rejected,
            stopped_at,
        } = normalize_rows(&rows);
        report.records = records.len();
        report.rejected_rows = rejected;
        report.stopped_at_row = stopped_at;

        // Generating
        *stage = FileStage::Generating;
        report.generation = self.generator.generate_all(&records);

        // Laying out
        *stage = FileStage::LayingOut;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "labels".to_string());
        let mut sheet = Sheet::new(
            self.state.geometry.clone(),
            BarcodeCellPainter::new(),
            self.state.config.border,
        )
        .with_title(title.clone());
        if self.state.config.skip_cells > 0 {
            sheet.skip_cells(self.state.config.skip_cells)?;
        }

        info!("Adding barcodes to labels document");
        for record in &records {
            let image = self.generator.image_path(&record.code);
            if !image.is_file() {
                let e = LabelError::MissingImage {
                    code: record.code.clone(),
                    path: image,
                };
                warn!(row = record.row, error = %e, "Skipping record");
                report.skipped.push((record.code.clone(), e.to_string()));
                continue;
            }
            let caption = CaptionLayout::for_name(&record.name)
                .map(|c| c.single_line())
                .unwrap_or_else(|_| record.name.clone());
            info!(
                row = record.row,
                count = record.print_count,
                code = %record.code,
                %caption,
                "Adding label"
            );
            report.labels_placed += sheet.add_label(image, record.print_count);
            report.submitted.push((record.code.clone(), record.print_count));
        }

        // Saving
        *stage = FileStage::Saving;
        let output = self
            .state
            .config
            .output_dir
            .join(format!("{title}.{OUTPUT_EXTENSION}"));
        sheet.save(&output)?;

        let fill = analyze_sheet_fill(sheet.placements(), sheet.geometry());
        info!(
            pages = fill.pages,
            labels = fill.labels_placed,
            unused_cells = fill.cells_unused,
            verdict = ?fill.verdict,
            "Sheet fill"
        );
        report.fill = Some(fill);
        Ok(output)
    }
}

fn is_eligible_input(path: &Path) -> bool {
    let has_extension = path.extension().is_some_and(|ext| ext == INPUT_EXTENSION);
    let is_temp = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(TEMP_FILE_MARKER));
    has_extension && !is_temp
}

/// Creates `dir` if missing and deletes its files with `extension`.
/// Returns the number of files removed.
fn clear_dir(dir: &Path, extension: &str) -> Result<usize, LabelError> {
    fs::create_dir_all(dir)?;
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn error_chain(e: &LabelError) -> String {
    let mut chain = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // `#[from]` variants already print their source.
        if !chain.ends_with(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }
        source = cause.source();
    }
    chain
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
