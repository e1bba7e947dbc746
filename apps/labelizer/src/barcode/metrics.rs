//! Static caption metrics used to check that a caption fits its barcode.
//!
//! Character widths are in em units (relative to font size) and approximate
//! DejaVu Sans, the usual caption face. The table covers ASCII 0x20..=0x7E;
//! index = (char as usize) - 32. Anything else falls back to the average width.

use serde::Serialize;

use crate::records::CaptionLayout;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Static character-width table.
pub struct CaptionMetrics {
    widths: [f32; 95],
    pub average_char_width: f32,
}

impl CaptionMetrics {
    /// Width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Width of a string in millimetres at the given point size.
    pub fn measure_mm(&self, s: &str, font_size_pt: f32) -> f32 {
        self.measure_str(s) * font_size_pt * MM_PER_PT
    }
}

#[rustfmt::skip]
static DEJAVU_SANS: CaptionMetrics = CaptionMetrics {
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.318, 0.401, 0.460, 0.838, 0.636, 0.950, 0.780, 0.275, 0.390, 0.390, 0.500, 0.838, 0.318, 0.361, 0.318, 0.337,
        // 0     1      2      3      4      5      6      7      8      9
        0.636, 0.636, 0.636, 0.636, 0.636, 0.636, 0.636, 0.636, 0.636, 0.636,
        // :     ;      <      =      >      ?      @
        0.337, 0.337, 0.838, 0.838, 0.838, 0.531, 1.000,
        // A     B      C      D      E      F      G      H      I      J      K      L      M
        0.684, 0.686, 0.698, 0.770, 0.632, 0.575, 0.775, 0.752, 0.295, 0.295, 0.656, 0.557, 0.863,
        // N     O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.748, 0.787, 0.603, 0.787, 0.695, 0.635, 0.611, 0.732, 0.684, 0.989, 0.685, 0.611, 0.685,
        // [     \      ]      ^      _      `
        0.390, 0.337, 0.390, 0.838, 0.500, 0.500,
        // a     b      c      d      e      f      g      h      i      j      k      l      m
        0.613, 0.635, 0.550, 0.635, 0.615, 0.352, 0.635, 0.634, 0.278, 0.278, 0.579, 0.278, 0.974,
        // n     o      p      q      r      s      t      u      v      w      x      y      z
        0.634, 0.612, 0.635, 0.635, 0.411, 0.521, 0.392, 0.634, 0.592, 0.818, 0.592, 0.592, 0.525,
        // {     |      }      ~
        0.636, 0.337, 0.636, 0.838,
    ],
    average_char_width: 0.60,
};

pub fn caption_metrics() -> &'static CaptionMetrics {
    &DEJAVU_SANS
}

// ────────────────────────────────────────────────────────────────────────────
// Fit check
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CaptionFitVerdict {
    Fits,
    /// The widest line is wider than the image; `fraction` > 1.0.
    Overflows { fraction: f32 },
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptionFit {
    pub widest_line_mm: f32,
    pub available_mm: f32,
    pub verdict: CaptionFitVerdict,
}

/// Compares each caption line against the image width.
pub fn check_caption_fit(caption: &CaptionLayout, available_mm: f32) -> CaptionFit {
    let metrics = caption_metrics();
    let widest_line_mm = caption
        .lines()
        .map(|line| metrics.measure_mm(line, caption.font_size_pt))
        .fold(0.0_f32, f32::max);

    let fraction = if available_mm > 0.0 {
        widest_line_mm / available_mm
    } else {
        f32::INFINITY
    };

    CaptionFit {
        widest_line_mm,
        available_mm,
        verdict: if fraction > 1.0 {
            CaptionFitVerdict::Overflows { fraction }
        } else {
            CaptionFitVerdict::Fits
        },
    }
}
