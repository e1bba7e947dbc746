//! Label sheet: places repeated payloads into a paginated grid and
//! serializes the pages to PDF.
//!
//! Placement is row-major: left to right, then top to bottom, then the next
//! page. Drawing is delegated to a `CellPainter`, called once per placed cell
//! when the sheet is saved. The written document is compacted so repeated
//! images are stored once.

use std::fs;
use std::path::Path;

use printpdf::{Color, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb};
use tracing::{debug, warn};

use crate::errors::LabelError;
use crate::layout::compact::compact_document;
use crate::layout::geometry::{CellFrame, LabelGeometry};

/// Draws one payload into one cell.
pub trait CellPainter<P> {
    fn paint(
        &mut self,
        layer: &PdfLayerReference,
        frame: &CellFrame,
        payload: &P,
    ) -> Result<(), LabelError>;
}

/// One filled cell. `page`, `row` and `column` are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<P> {
    pub page: usize,
    pub row: u32,
    pub column: u32,
    pub payload: P,
}

pub struct Sheet<P, C> {
    geometry: LabelGeometry,
    painter: C,
    border: bool,
    title: String,
    placements: Vec<Placement<P>>,
    /// Global index of the next free cell across all pages.
    next_cell: usize,
}

impl<P: Clone, C: CellPainter<P>> Sheet<P, C> {
    pub fn new(geometry: LabelGeometry, painter: C, border: bool) -> Self {
        Sheet {
            geometry,
            painter,
            border,
            title: "Labels".to_string(),
            placements: Vec::new(),
            next_cell: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn geometry(&self) -> &LabelGeometry {
        &self.geometry
    }

    pub fn placements(&self) -> &[Placement<P>] {
        &self.placements
    }

    pub fn label_count(&self) -> usize {
        self.placements.len()
    }

    pub fn page_count(&self) -> usize {
        self.placements.last().map(|p| p.page + 1).unwrap_or(0)
    }

    /// Marks the first `n` cells of the first page as already used.
    ///
    /// Only valid on a fresh sheet and for fewer cells than a page holds.
    pub fn skip_cells(&mut self, n: u32) -> Result<(), LabelError> {
        if !self.placements.is_empty() || self.next_cell != 0 {
            return Err(LabelError::Layout(
                "cells can only be skipped before any label is placed".to_string(),
            ));
        }
        let per_page = self.geometry.cells_per_page();
        if n >= per_page {
            return Err(LabelError::Layout(format!(
                "cannot skip {n} cells on a page of {per_page}"
            )));
        }
        self.next_cell = n as usize;
        Ok(())
    }

    /// Places `count` copies of `payload` in the next free cells.
    /// Returns the number of cells filled.
    pub fn add_label(&mut self, payload: P, count: u32) -> usize {
        let per_page = self.geometry.cells_per_page() as usize;
        if per_page == 0 {
            warn!("Label geometry has no cells; nothing placed");
            return 0;
        }
        let columns = self.geometry.columns as usize;

        for _ in 0..count {
            let page = self.next_cell / per_page;
            let within = self.next_cell % per_page;
            self.placements.push(Placement {
                page,
                row: (within / columns) as u32,
                column: (within % columns) as u32,
                payload: payload.clone(),
            });
            self.next_cell += 1;
        }
        count as usize
    }

    /// Renders every page and writes the document to `path`.
    ///
    /// An empty sheet still produces one blank page.
    pub fn save(&mut self, path: &Path) -> Result<(), LabelError> {
        let g = &self.geometry;
        let (doc, first_page, first_layer) = PdfDocument::new(
            self.title.clone(),
            Mm(g.sheet_width),
            Mm(g.sheet_height),
            "Labels",
        );

        let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
        for _ in 1..self.page_count().max(1) {
            let (page, layer) = doc.add_page(Mm(g.sheet_width), Mm(g.sheet_height), "Labels");
            layers.push(doc.get_page(page).get_layer(layer));
        }

        if self.border {
            for layer in &layers {
                layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
                layer.set_outline_thickness(0.25);
            }
        }

        for placement in &self.placements {
            let layer = &layers[placement.page];
            let frame = g.cell_frame(placement.row, placement.column);
            if self.border {
                draw_border(layer, &frame);
            }
            self.painter.paint(layer, &frame, &placement.payload)?;
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| LabelError::Pdf(e.to_string()))?;
        fs::write(path, compact_document(&bytes)?)?;

        debug!(
            path = %path.display(),
            pages = layers.len(),
            labels = self.placements.len(),
            "Saved label sheet"
        );
        Ok(())
    }
}

fn draw_border(layer: &PdfLayerReference, frame: &CellFrame) {
    let corners = [
        (frame.x, frame.y),
        (frame.x + frame.width, frame.y),
        (frame.x + frame.width, frame.y + frame.height),
        (frame.x, frame.y + frame.height),
    ];
    let line = Line {
        points: corners
            .iter()
            .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
            .collect(),
        is_closed: true,
    };
    layer.add_line(line);
}
