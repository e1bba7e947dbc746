//! Caption wrapping for product names printed under a barcode.
//!
//! # Wrapping rules
//! - Under 26 characters: one line; 10pt with 4mm caption distance up to 20
//!   characters, 9pt with 5mm above that.
//! - 26 characters or more: 8pt, 3mm distance. Each "/" becomes "/ " so a
//!   line can break after a slash, then the first space at or after 33% of
//!   the expanded length becomes the line break.

use serde::Serialize;

use crate::errors::LabelError;

/// Names at or above this length are wrapped onto two lines.
pub const WRAP_THRESHOLD: usize = 26;
/// Names up to this length use the large caption font.
pub const LARGE_FONT_MAX: usize = 20;
/// Fraction of the expanded name before which no break is taken.
pub const BREAK_FRACTION: f64 = 0.33;

/// A rendered caption: text (possibly with one `\n`) and its typography.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionLayout {
    pub text: String,
    pub font_size_pt: f32,
    pub text_distance_mm: f32,
}

impl CaptionLayout {
    /// Applies the wrapping rules to a product name.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn for_name(name: &str) -> Result<Self, LabelError> {
        let len = name.chars().count();

        if len < WRAP_THRESHOLD {
            let large = len <= LARGE_FONT_MAX;
            return Ok(CaptionLayout {
                text: name.to_string(),
                font_size_pt: if large { 10.0 } else { 9.0 },
                text_distance_mm: if large { 4.0 } else { 5.0 },
            });
        }

        let expanded = name.replace('/', "/ ");
        let chars: Vec<char> = expanded.chars().collect();
        let start = (chars.len() as f64 * BREAK_FRACTION) as usize;

        let break_at = chars
            .iter()
            .skip(start)
            .position(|&c| c == ' ')
            .map(|offset| start + offset)
            .ok_or_else(|| LabelError::NoBreakPoint(name.to_string()))?;

        let text: String = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| if i == break_at { '\n' } else { c })
            .collect();

        Ok(CaptionLayout {
            text,
            font_size_pt: 8.0,
            text_distance_mm: 3.0,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// The caption with its line break turned back into a space.
    pub fn single_line(&self) -> String {
        self.text.replace('\n', " ")
    }
}
