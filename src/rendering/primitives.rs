//! Transient drawing primitives collected during one tile render.
//!
//! Primitives are bucketed by (layer, level), both supplied by theme
//! matching; that two-level ordering is the sole determinant of paint order.
//! All containers here are rebuilt every tile render and discarded after
//! rasterization.

use std::sync::Arc;

use crate::core::constants::LAYER_COUNT;
use crate::core::geo::Point;
use crate::rendering::paint::{Paint, Symbol};

/// Geometry of one drawing primitive in tile-pixel space.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// One or more coordinate rings; shared so that several levels can
    /// reference the same projected geometry without copying it.
    Way(Arc<Vec<Vec<Point>>>),
    Circle { center: Point, radius: f32 },
}

/// A shape paired with the paint the theme resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePaint {
    pub shape: Shape,
    pub paint: Arc<Paint>,
}

/// A placed bitmap symbol, possibly rotated along a way.
#[derive(Debug, Clone)]
pub struct SymbolPlacement {
    pub symbol: Symbol,
    pub position: Point,
    /// Rotation in radians, applied about the symbol center when
    /// `align_center` is set and about `position` otherwise.
    pub rotation: f32,
    pub align_center: bool,
}

/// A caption anchored to a single point, with an optional halo paint drawn
/// behind the foreground.
#[derive(Debug, Clone)]
pub struct PointLabel {
    pub text: String,
    pub position: Point,
    pub paint: Arc<Paint>,
    pub halo: Option<Arc<Paint>>,
}

/// Way-aligned caption text anchored between two points. The decorator
/// guarantees `start.x <= end.x` so the text never renders mirrored.
#[derive(Debug, Clone)]
pub struct WayLabel {
    pub text: String,
    pub start: Point,
    pub end: Point,
    pub paint: Arc<Paint>,
}

/// Per-layer, per-level buckets of shape primitives.
///
/// Sized `LAYER_COUNT` layers times the theme's `levels` count. The bucket
/// structure survives across renders of the same renderer instance; only the
/// contents are cleared between tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBuckets {
    buckets: Vec<Vec<Vec<ShapePaint>>>,
}

impl LayerBuckets {
    pub fn new(levels: usize) -> Self {
        let buckets = (0..LAYER_COUNT)
            .map(|_| (0..levels).map(|_| Vec::new()).collect())
            .collect();
        Self { buckets }
    }

    pub fn levels(&self) -> usize {
        self.buckets.first().map(Vec::len).unwrap_or(0)
    }

    /// Adds a primitive to the given (layer, level) bucket. The layer must
    /// already be clamped to `[0, LAYER_COUNT)`; an out-of-range level is a
    /// theme bug and the primitive is dropped.
    pub fn push(&mut self, layer: usize, level: usize, shape_paint: ShapePaint) {
        if let Some(bucket) = self
            .buckets
            .get_mut(layer)
            .and_then(|levels| levels.get_mut(level))
        {
            bucket.push(shape_paint);
        } else {
            log::warn!("dropping primitive for out-of-range bucket ({layer}, {level})");
        }
    }

    /// Empties every bucket while keeping the allocated structure.
    pub fn clear(&mut self) {
        for layer in &mut self.buckets {
            for level in layer {
                level.clear();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets
            .iter()
            .all(|layer| layer.iter().all(Vec::is_empty))
    }

    /// Iterates buckets in paint order: layer-major, level-minor.
    pub fn iter_paint_order(&self) -> impl Iterator<Item = &[ShapePaint]> {
        self.buckets
            .iter()
            .flat_map(|layer| layer.iter().map(Vec::as_slice))
    }
}
