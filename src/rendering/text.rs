//! Glyph measurement and line rasterization on the bundled Noto Sans face.
//!
//! The rasterizer needs pixel-accurate text widths for way-name placement
//! and label collision boxes, and alpha masks for drawing. Glyphs are
//! rasterized with fontdue and colorized into a tiny-skia pixmap.

use fontdue::{Font, FontSettings};
use once_cell::sync::Lazy;
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::rendering::paint::Color;

static FONT: Lazy<Font> = Lazy::new(|| {
    Font::from_bytes(notosans::REGULAR_TTF, FontSettings::default())
        .expect("bundled Noto Sans face must parse")
});

/// Rendered width of `text` in pixels at the given glyph size.
pub fn measure(text: &str, size: f32) -> f64 {
    text.chars()
        .map(|ch| FONT.metrics(ch, size).advance_width as f64)
        .sum()
}

/// Ascent and descent of the face at the given glyph size. Descent is
/// negative (below the baseline).
pub fn line_metrics(size: f32) -> (f32, f32) {
    match FONT.horizontal_line_metrics(size) {
        Some(metrics) => (metrics.ascent, metrics.descent),
        None => (size, 0.0),
    }
}

/// Total line height in pixels at the given glyph size.
pub fn line_height(size: f32) -> f64 {
    let (ascent, descent) = line_metrics(size);
    (ascent - descent) as f64
}

/// Rasterizes one line of text into a pixmap colorized with `color`.
///
/// Returns the pixmap together with the baseline offset from its top edge,
/// so callers can align the baseline to an anchor point. Returns `None` for
/// text that rasterizes to nothing (empty or whitespace-only).
pub fn rasterize_line(text: &str, size: f32, color: Color) -> Option<(Pixmap, f32)> {
    let width = measure(text, size).ceil() as u32;
    let (ascent, descent) = line_metrics(size);
    let height = (ascent - descent).ceil() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let mut pixmap = Pixmap::new(width, height)?;
    let stride = pixmap.width() as i32;
    let pixels = pixmap.pixels_mut();

    let baseline = ascent;
    let mut cursor = 0.0f32;
    for ch in text.chars() {
        let (metrics, coverage) = FONT.rasterize(ch, size);
        let left = (cursor + metrics.xmin as f32).round() as i32;
        let top = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;

        for row in 0..metrics.height as i32 {
            let y = top + row;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for col in 0..metrics.width as i32 {
                let x = left + col;
                if x < 0 || x >= stride {
                    continue;
                }
                let mask = coverage[(row * metrics.width as i32 + col) as usize] as u32;
                if mask == 0 {
                    continue;
                }
                let alpha = (mask * color.a as u32) / 255;
                let premul = |channel: u8| ((channel as u32 * alpha) / 255) as u8;
                if let Some(pixel) = PremultipliedColorU8::from_rgba(
                    premul(color.r),
                    premul(color.g),
                    premul(color.b),
                    alpha as u8,
                ) {
                    let index = (y * stride + x) as usize;
                    // keep the stronger coverage where glyphs overlap
                    if pixels[index].alpha() < pixel.alpha() {
                        pixels[index] = pixel;
                    }
                }
            }
        }

        cursor += metrics.advance_width;
    }

    Some((pixmap, baseline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_grows_with_text() {
        let short = measure("Elm", 14.0);
        let long = measure("Elm Street", 14.0);
        assert!(short > 0.0);
        assert!(long > short);
    }

    #[test]
    fn test_measure_scales_with_size() {
        let small = measure("Main", 10.0);
        let large = measure("Main", 20.0);
        assert!((large / small - 2.0).abs() < 0.2);
    }

    #[test]
    fn test_rasterize_line_produces_ink() {
        let (pixmap, baseline) =
            rasterize_line("Aa", 16.0, Color::BLACK).expect("text should rasterize");
        assert!(baseline > 0.0);
        assert!(pixmap.pixels().iter().any(|pixel| pixel.alpha() > 0));
    }

    #[test]
    fn test_rasterize_empty_is_none() {
        assert!(rasterize_line("", 16.0, Color::BLACK).is_none());
    }
}
