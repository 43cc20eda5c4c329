//! Executes the draw calls the renderer prepared, into a tile pixmap.
//!
//! The canvas owns the output bitmap; everything else in the pipeline only
//! collects primitives. Draw order is decided by the caller.

use tiny_skia::{
    FillRule, Paint as SkiaPaint, PathBuilder, Pixmap, PixmapPaint, Shader, Stroke, StrokeDash,
    Transform,
};

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{Point, Tile};
use crate::rendering::paint::{Color, LineCap, Paint, PaintStyle};
use crate::rendering::primitives::{LayerBuckets, PointLabel, Shape, SymbolPlacement, WayLabel};
use crate::rendering::text;

const TILE_FRAME_COLOR: Color = Color::rgb(0, 0, 0);
const TILE_COORDINATES_SIZE: f32 = 20.0;

/// A canvas the size of one tile.
pub struct TileCanvas {
    pixmap: Pixmap,
}

impl TileCanvas {
    pub fn new() -> Self {
        let pixmap = Pixmap::new(TILE_SIZE, TILE_SIZE).expect("tile size is non-zero");
        Self { pixmap }
    }

    /// Fills the whole tile with the theme's background color.
    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Consumes the canvas, handing out the finished tile bitmap.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Draws all bucketed shape primitives in paint order: layer-major,
    /// level-minor, insertion order within a bucket.
    pub fn draw_ways(&mut self, buckets: &LayerBuckets) {
        for bucket in buckets.iter_paint_order() {
            for shape_paint in bucket {
                let Some(path) = build_path(&shape_paint.shape) else {
                    continue;
                };
                self.draw_path(&path, &shape_paint.paint);
            }
        }
    }

    fn draw_path(&mut self, path: &tiny_skia::Path, paint: &Paint) {
        let skia_paint = solid_paint(paint.color);
        match paint.style {
            PaintStyle::Fill => {
                self.pixmap.fill_path(
                    path,
                    &skia_paint,
                    FillRule::EvenOdd,
                    Transform::identity(),
                    None,
                );
            }
            PaintStyle::Stroke => {
                let stroke = Stroke {
                    width: paint.stroke_width,
                    line_cap: line_cap(paint.cap),
                    dash: paint
                        .dash
                        .clone()
                        .and_then(|pattern| StrokeDash::new(pattern, 0.0)),
                    ..Stroke::default()
                };
                self.pixmap
                    .stroke_path(path, &skia_paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Blits symbol bitmaps, rotated about the symbol center when the
    /// placement asks for center alignment.
    pub fn draw_symbols(&mut self, placements: &[SymbolPlacement]) {
        for placement in placements {
            let degrees = placement.rotation.to_degrees();
            let transform = if placement.align_center {
                let pivot_x = placement.symbol.width() as f32 / 2.0;
                let pivot_y = placement.symbol.height() as f32 / 2.0;
                Transform::from_rotate_at(degrees, pivot_x, pivot_y).post_translate(
                    placement.position.x as f32 - pivot_x,
                    placement.position.y as f32 - pivot_y,
                )
            } else {
                Transform::from_rotate(degrees)
                    .post_translate(placement.position.x as f32, placement.position.y as f32)
            };

            self.pixmap.draw_pixmap(
                0,
                0,
                placement.symbol.pixmap().as_ref(),
                &PixmapPaint::default(),
                transform,
                None,
            );
        }
    }

    /// Draws way-aligned text rotated along its anchor segment, centered
    /// between the two anchors.
    pub fn draw_way_labels(&mut self, labels: &[WayLabel]) {
        for label in labels {
            let Some((rendered, baseline)) =
                text::rasterize_line(&label.text, label.paint.text_size, label.paint.color)
            else {
                continue;
            };

            let dx = label.end.x - label.start.x;
            let dy = label.end.y - label.start.y;
            let segment_length = (dx * dx + dy * dy).sqrt();
            if segment_length == 0.0 {
                continue;
            }

            // slide the text to the middle of the segment
            let lead = ((segment_length - rendered.width() as f64) / 2.0).max(0.0);
            let anchor = Point::new(
                label.start.x + dx / segment_length * lead,
                label.start.y + dy / segment_length * lead,
            );
            let degrees = dy.atan2(dx).to_degrees() as f32;

            let transform = Transform::from_translate(0.0, -baseline)
                .post_concat(Transform::from_rotate(degrees))
                .post_concat(Transform::from_translate(anchor.x as f32, anchor.y as f32));

            self.pixmap.draw_pixmap(
                0,
                0,
                rendered.as_ref(),
                &PixmapPaint::default(),
                transform,
                None,
            );
        }
    }

    /// Draws point captions: halo pass first, then the foreground text,
    /// horizontally centered with the baseline on the anchor.
    pub fn draw_point_labels(&mut self, labels: &[PointLabel]) {
        for label in labels {
            if let Some(halo) = &label.halo {
                self.draw_caption(label, halo.color, halo.stroke_width.max(1.0));
            }
            self.draw_caption(label, label.paint.color, 0.0);
        }
    }

    fn draw_caption(&mut self, label: &PointLabel, color: Color, spread: f32) {
        let Some((rendered, baseline)) =
            text::rasterize_line(&label.text, label.paint.text_size, color)
        else {
            return;
        };
        let left = label.position.x as f32 - rendered.width() as f32 / 2.0;
        let top = label.position.y as f32 - baseline;

        if spread > 0.0 {
            // approximate a stroked halo by blitting the mask in a ring
            let radius = (spread / 2.0).ceil();
            for (ox, oy) in [
                (-radius, 0.0),
                (radius, 0.0),
                (0.0, -radius),
                (0.0, radius),
                (-radius, -radius),
                (radius, -radius),
                (-radius, radius),
                (radius, radius),
            ] {
                self.blit(&rendered, left + ox, top + oy);
            }
        } else {
            self.blit(&rendered, left, top);
        }
    }

    fn blit(&mut self, source: &Pixmap, x: f32, y: f32) {
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::from_translate(x, y),
            None,
        );
    }

    /// Debug overlay: strokes the west, south and east tile edges.
    pub fn draw_tile_frame(&mut self) {
        let size = TILE_SIZE as f32;
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(0.0, size);
        builder.line_to(size, size);
        builder.line_to(size, 0.0);
        if let Some(path) = builder.finish() {
            self.pixmap.stroke_path(
                &path,
                &solid_paint(TILE_FRAME_COLOR),
                &Stroke::default(),
                Transform::identity(),
                None,
            );
        }
    }

    /// Debug overlay: prints the tile coordinates in the top-left corner.
    pub fn draw_tile_coordinates(&mut self, tile: &Tile) {
        for (index, line) in [
            format!("X: {}", tile.x),
            format!("Y: {}", tile.y),
            format!("Z: {}", tile.zoom),
        ]
        .iter()
        .enumerate()
        {
            let label = PointLabel {
                text: line.clone(),
                position: Point::new(50.0, 30.0 + index as f64 * 30.0),
                paint: std::sync::Arc::new(Paint {
                    text_size: TILE_COORDINATES_SIZE,
                    ..Paint::fill(Color::BLACK)
                }),
                halo: Some(std::sync::Arc::new(Paint {
                    text_size: TILE_COORDINATES_SIZE,
                    ..Paint::stroke(Color::WHITE, 5.0)
                })),
            };
            self.draw_point_labels(&[label]);
        }
    }
}

impl Default for TileCanvas {
    fn default() -> Self {
        Self::new()
    }
}

fn solid_paint(color: Color) -> SkiaPaint<'static> {
    SkiaPaint {
        shader: Shader::SolidColor(color.to_skia()),
        anti_alias: true,
        ..SkiaPaint::default()
    }
}

fn line_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

/// Builds one path from a shape, skipping rings too short to draw.
fn build_path(shape: &Shape) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    match shape {
        Shape::Way(rings) => {
            for ring in rings.iter() {
                if ring.len() < 2 {
                    continue;
                }
                builder.move_to(ring[0].x as f32, ring[0].y as f32);
                for point in &ring[1..] {
                    builder.line_to(point.x as f32, point.y as f32);
                }
            }
        }
        Shape::Circle { center, radius } => {
            builder.push_circle(center.x as f32, center.y as f32, *radius);
        }
    }
    builder.finish()
}
