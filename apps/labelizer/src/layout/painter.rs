//! Draws a barcode image file into a label cell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfLayerReference, Px,
};

use crate::errors::LabelError;
use crate::layout::geometry::{pt_to_mm, CellFrame};
use crate::layout::sheet::CellPainter;

/// Space kept free at the cell's left edge.
pub const LEFT_INSET_PT: f32 = 20.0;
/// Total horizontal space not covered by the image (left inset included).
pub const HORIZONTAL_INSET_PT: f32 = 60.0;

/// Resolution used to turn pixel sizes into physical sizes before scaling.
const PLACEMENT_DPI: f32 = 300.0;

#[derive(Debug, Clone)]
struct DecodedImage {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

/// Paints the image at a path payload: inset from the left, full cell height.
/// Each file is decoded once per painter.
#[derive(Default)]
pub struct BarcodeCellPainter {
    cache: HashMap<PathBuf, DecodedImage>,
}

impl BarcodeCellPainter {
    pub fn new() -> Self {
        Self::default()
    }

    fn decoded(&mut self, path: &Path) -> Result<&DecodedImage, LabelError> {
        if !self.cache.contains_key(path) {
            let luma = image::open(path)?.to_luma8();
            let (width, height) = luma.dimensions();
            self.cache.insert(
                path.to_path_buf(),
                DecodedImage {
                    width,
                    height,
                    luma: luma.into_raw(),
                },
            );
        }
        self.cache
            .get(path)
            .ok_or_else(|| LabelError::Layout(format!("image cache miss for {}", path.display())))
    }
}

/// Target rectangle for the image inside a cell: (x, y, width, height) in mm.
pub fn image_rect(frame: &CellFrame) -> (f32, f32, f32, f32) {
    (
        frame.x + pt_to_mm(LEFT_INSET_PT),
        frame.y,
        frame.width - pt_to_mm(HORIZONTAL_INSET_PT),
        frame.height,
    )
}

impl CellPainter<PathBuf> for BarcodeCellPainter {
    fn paint(
        &mut self,
        layer: &PdfLayerReference,
        frame: &CellFrame,
        payload: &PathBuf,
    ) -> Result<(), LabelError> {
        let (x, y, width, height) = image_rect(frame);
        if width <= 0.0 || height <= 0.0 {
            return Err(LabelError::Layout(format!(
                "cell {:.1}×{:.1}mm is too small for the image inset",
                frame.width, frame.height
            )));
        }

        let decoded = self.decoded(payload)?;
        let native_width_mm = decoded.width as f32 / PLACEMENT_DPI * 25.4;
        let native_height_mm = decoded.height as f32 / PLACEMENT_DPI * 25.4;

        let image = Image::from(ImageXObject {
            width: Px(decoded.width as usize),
            height: Px(decoded.height as usize),
            color_space: ColorSpace::Greyscale,
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data: decoded.luma.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(y)),
                scale_x: Some(width / native_width_mm),
                scale_y: Some(height / native_height_mm),
                dpi: Some(PLACEMENT_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}
