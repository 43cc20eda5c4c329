//! Paint and symbol resources resolved by the render theme.
//!
//! A [`Paint`] is immutable once resolved for a zoom level and is shared
//! between primitives via `Arc`. Stroke-width and text-size scaling produce
//! new paints instead of mutating shared ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Whether a shape is filled or its outline stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintStyle {
    #[default]
    Fill,
    Stroke,
}

/// Stroke end-cap shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// A drawing style resolved by the theme for one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    pub stroke_width: f32,
    pub cap: LineCap,
    /// Dash pattern in pixels, alternating on/off lengths.
    pub dash: Option<Vec<f32>>,
    /// Glyph size in pixels for text paints.
    pub text_size: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            stroke_width: 1.0,
            cap: LineCap::default(),
            dash: None,
            text_size: 12.0,
        }
    }
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn stroke(color: Color, width: f32) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke,
            stroke_width: width,
            ..Default::default()
        }
    }

    /// A copy with the stroke width (and dash lengths) multiplied by
    /// `factor`. Used for the zoom-dependent stroke scale.
    pub fn with_stroke_scale(&self, factor: f32) -> Paint {
        Paint {
            stroke_width: self.stroke_width * factor,
            dash: self
                .dash
                .as_ref()
                .map(|pattern| pattern.iter().map(|len| len * factor).collect()),
            ..self.clone()
        }
    }

    /// A copy with the text size multiplied by `factor`.
    pub fn with_text_scale(&self, factor: f32) -> Paint {
        Paint {
            text_size: self.text_size * factor,
            ..self.clone()
        }
    }
}

/// A decoded RGBA bitmap used for point and way symbols.
#[derive(Clone)]
pub struct Symbol {
    pixmap: Arc<tiny_skia::Pixmap>,
}

impl Symbol {
    pub fn new(pixmap: tiny_skia::Pixmap) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
        }
    }

    /// A single-color square symbol, mostly useful in tests and fixtures.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let mut pixmap =
            tiny_skia::Pixmap::new(width.max(1), height.max(1)).expect("non-zero symbol size");
        pixmap.fill(color.to_skia());
        Self::new(pixmap)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbol")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_scale_copies() {
        let base = Paint {
            dash: Some(vec![4.0, 2.0]),
            ..Paint::stroke(Color::BLACK, 2.0)
        };
        let scaled = base.with_stroke_scale(1.5);
        assert_eq!(scaled.stroke_width, 3.0);
        assert_eq!(scaled.dash, Some(vec![6.0, 3.0]));
        // the original paint is untouched
        assert_eq!(base.stroke_width, 2.0);
    }
}
