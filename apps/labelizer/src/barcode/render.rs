//! Barcode rasterization: bars plus a human-readable caption.
//!
//! All options are physical (millimetres, points) and converted to pixels at
//! `dpi`. The layout from top to bottom is: margin, bars, caption distance,
//! caption lines, margin. Quiet zones pad the bars left and right.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

use crate::barcode::symbology::EncodedSymbol;
use crate::errors::LabelError;
use crate::records::CaptionLayout;

/// Line height as a multiple of the caption font size.
const LINE_SPACING: f32 = 1.15;

/// Fonts tried, in order, when no caption font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

/// Rendering options for one barcode image.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    pub format: ImageFormat,
    pub module_width_mm: f32,
    /// Height of the bars.
    pub bar_height_mm: f32,
    pub quiet_zone_mm: f32,
    pub margin_mm: f32,
    pub font_size_pt: f32,
    pub center_text: bool,
    /// Gap between the bottom of the bars and the top of the caption.
    pub text_distance_mm: f32,
    pub dpi: f32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            format: ImageFormat::Png,
            module_width_mm: 0.2,
            bar_height_mm: 10.0,
            quiet_zone_mm: 6.5,
            margin_mm: 1.0,
            font_size_pt: 10.0,
            center_text: true,
            text_distance_mm: 5.0,
            dpi: 300.0,
        }
    }
}

impl WriterOptions {
    /// Copies the caption's typography into the options.
    pub fn for_caption(&self, caption: &CaptionLayout) -> Self {
        WriterOptions {
            font_size_pt: caption.font_size_pt,
            text_distance_mm: caption.text_distance_mm,
            ..self.clone()
        }
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("png")
    }

    pub fn mm_to_px(&self, mm: f32) -> u32 {
        (mm * self.dpi / 25.4).round().max(0.0) as u32
    }

    /// Full image width in millimetres for a symbol of `modules` modules.
    pub fn image_width_mm(&self, modules: usize) -> f32 {
        2.0 * self.quiet_zone_mm + modules as f32 * self.module_width_mm
    }

    fn font_px(&self) -> f32 {
        self.font_size_pt * self.dpi / 72.0
    }

    fn line_height_px(&self) -> u32 {
        (self.font_px() * LINE_SPACING).ceil() as u32
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Caption font
// ────────────────────────────────────────────────────────────────────────────

/// Loads the caption font: the configured path if given, otherwise the
/// first system font found. `None` means captions are left blank.
pub fn load_caption_font(configured: Option<&Path>) -> Option<Font<'static>> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    };

    for path in &candidates {
        match read_font(path) {
            Ok(font) => {
                debug!(font = %path.display(), "Loaded caption font");
                return Some(font);
            }
            Err(LabelError::Io(_)) if configured.is_none() => {}
            Err(e) => warn!(font = %path.display(), error = %e, "Cannot use caption font"),
        }
    }

    warn!("No caption font available; barcode captions will be blank");
    None
}

fn read_font(path: &Path) -> Result<Font<'static>, LabelError> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| LabelError::Font(format!("{} is not a usable TrueType font", path.display())))
}

// ────────────────────────────────────────────────────────────────────────────
// Rasterization
// ────────────────────────────────────────────────────────────────────────────

/// Renders an encoded symbol and its caption to a greyscale image.
pub fn rasterize(
    symbol: &EncodedSymbol,
    caption: &CaptionLayout,
    options: &WriterOptions,
    font: Option<&Font<'static>>,
) -> GrayImage {
    let module_px = options.mm_to_px(options.module_width_mm).max(1);
    let quiet_px = options.mm_to_px(options.quiet_zone_mm);
    let margin_px = options.mm_to_px(options.margin_mm);
    let bar_px = options.mm_to_px(options.bar_height_mm).max(1);

    let lines: Vec<&str> = caption.lines().filter(|l| !l.is_empty()).collect();
    let text_px = if lines.is_empty() {
        0
    } else {
        options.mm_to_px(options.text_distance_mm) + lines.len() as u32 * options.line_height_px()
    };

    let width = 2 * quiet_px + symbol.modules.len() as u32 * module_px;
    let height = 2 * margin_px + bar_px + text_px;
    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));

    for (i, &dark) in symbol.modules.iter().enumerate() {
        if !dark {
            continue;
        }
        let x0 = quiet_px + i as u32 * module_px;
        for x in x0..x0 + module_px {
            for y in margin_px..margin_px + bar_px {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    if let Some(font) = font {
        let top = margin_px + bar_px + options.mm_to_px(options.text_distance_mm);
        draw_caption(&mut img, font, &lines, top, quiet_px, options);
    }

    img
}

fn draw_caption(
    img: &mut GrayImage,
    font: &Font<'static>,
    lines: &[&str],
    top_px: u32,
    left_px: u32,
    options: &WriterOptions,
) {
    let scale = Scale::uniform(options.font_px());
    let ascent = font.v_metrics(scale).ascent;
    let (width, height) = img.dimensions();

    for (i, line) in lines.iter().enumerate() {
        let baseline = top_px as f32 + ascent + (i as u32 * options.line_height_px()) as f32;
        let line_width = measure_line(font, line, scale);
        let x = if options.center_text {
            ((width as f32 - line_width) / 2.0).max(0.0)
        } else {
            left_px as f32
        };

        for glyph in font.layout(line, scale, point(x, baseline)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let px = bb.min.x + gx as i32;
                    let py = bb.min.y + gy as i32;
                    if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                        return;
                    }
                    let ink = 255 - (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                    let pixel = img.get_pixel_mut(px as u32, py as u32);
                    pixel.0[0] = pixel.0[0].min(ink);
                });
            }
        }
    }
}

fn measure_line(font: &Font<'static>, line: &str, scale: Scale) -> f32 {
    font.layout(line, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Writes a rendered image in the configured format.
pub fn write_image(img: &GrayImage, path: &Path, options: &WriterOptions) -> Result<(), LabelError> {
    img.save_with_format(path, options.format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::symbology::{SymbolEncoder, UpcA};

    fn widget() -> (EncodedSymbol, CaptionLayout) {
        (
            UpcA.encode("012345678905").unwrap(),
            CaptionLayout::for_name("Widget").unwrap(),
        )
    }

    #[test]
    fn test_mm_to_px_at_300_dpi() {
        let options = WriterOptions::default();
        assert_eq!(options.mm_to_px(25.4), 300);
        assert_eq!(options.mm_to_px(0.2), 2);
        assert_eq!(options.mm_to_px(0.0), 0);
    }

    #[test]
    fn test_for_caption_copies_typography() {
        let caption = CaptionLayout::for_name("Stainless Steel Water Bottle 750ml").unwrap();
        let options = WriterOptions::default().for_caption(&caption);
        assert_eq!(options.font_size_pt, 8.0);
        assert_eq!(options.text_distance_mm, 3.0);
        assert_eq!(options.bar_height_mm, 10.0);
        assert_eq!(options.extension(), "png");
    }

    #[test]
    fn test_image_width_covers_quiet_zones_and_modules() {
        let (symbol, caption) = widget();
        let options = WriterOptions::default().for_caption(&caption);
        let img = rasterize(&symbol, &caption, &options, None);
        let quiet = options.mm_to_px(6.5);
        assert_eq!(img.width(), 2 * quiet + 95 * 2);
    }

    #[test]
    fn test_bars_follow_module_pattern() {
        let (symbol, caption) = widget();
        let options = WriterOptions::default().for_caption(&caption);
        let img = rasterize(&symbol, &caption, &options, None);
        let quiet = options.mm_to_px(6.5);
        let y = options.mm_to_px(1.0) + 5;

        for (i, &dark) in symbol.modules.iter().enumerate() {
            let x = quiet + i as u32 * 2;
            let expected = if dark { 0 } else { 255 };
            assert_eq!(img.get_pixel(x, y).0[0], expected, "module {i}");
        }
        assert_eq!(img.get_pixel(0, y).0[0], 255, "quiet zone stays white");
    }

    #[test]
    fn test_wrapped_caption_makes_taller_image() {
        let symbol = UpcA.encode("012345678905").unwrap();
        let one = CaptionLayout::for_name("Widget").unwrap();
        let two = CaptionLayout::for_name("Stainless Steel Water Bottle 750ml").unwrap();
        let base = WriterOptions::default();
        let a = rasterize(&symbol, &one, &base.for_caption(&one), None);
        let b = rasterize(&symbol, &two, &base.for_caption(&two), None);
        assert_eq!(a.width(), b.width());
        assert!(b.height() > a.height(), "two caption lines need more height");
    }

    #[test]
    fn test_empty_caption_has_no_text_band() {
        let symbol = UpcA.encode("012345678905").unwrap();
        let caption = CaptionLayout::for_name("").unwrap();
        let options = WriterOptions::default();
        let img = rasterize(&symbol, &caption, &options, None);
        assert_eq!(img.height(), 2 * options.mm_to_px(1.0) + options.mm_to_px(10.0));
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let (symbol, caption) = widget();
        let options = WriterOptions::default().for_caption(&caption);
        let a = rasterize(&symbol, &caption, &options, None);
        let b = rasterize(&symbol, &caption, &options, None);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_missing_configured_font_yields_none() {
        let font = load_caption_font(Some(Path::new("/nonexistent/caption.ttf")));
        assert!(font.is_none());
    }

    #[test]
    fn test_non_font_file_is_font_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.ttf");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(read_font(&path), Err(LabelError::Font(_))));
        assert!(load_caption_font(Some(&path)).is_none());
    }
}
