//! Collision pruning for point labels and area captions.
//!
//! Candidates are accepted greedily in input order; a candidate whose pixel
//! bounding box overlaps an already-accepted box, or any placed point
//! symbol, is dropped. The result is a non-colliding subset for the current
//! tile, rebuilt from scratch every render.

use crate::core::geo::Point;
use crate::rendering::primitives::{PointLabel, SymbolPlacement};
use crate::rendering::text;

/// Axis-aligned pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Box2 {
    min: Point,
    max: Point,
}

impl Box2 {
    fn overlaps(&self, other: &Box2) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Bounding box of a caption. The anchor is the baseline center of the text.
fn label_box(label: &PointLabel) -> Box2 {
    let width = text::measure(&label.text, label.paint.text_size);
    let height = text::line_height(label.paint.text_size);
    Box2 {
        min: Point::new(label.position.x - width / 2.0, label.position.y - height),
        max: Point::new(label.position.x + width / 2.0, label.position.y),
    }
}

fn symbol_box(placement: &SymbolPlacement) -> Box2 {
    let width = placement.symbol.width() as f64;
    let height = placement.symbol.height() as f64;
    let min = if placement.align_center {
        Point::new(
            placement.position.x - width / 2.0,
            placement.position.y - height / 2.0,
        )
    } else {
        placement.position
    };
    Box2 {
        min,
        max: Point::new(min.x + width, min.y + height),
    }
}

/// Prunes overlapping labels, treating point symbols as fixed obstacles.
///
/// Area captions are resolved first (they anchor large features), then node
/// captions against everything already accepted.
pub fn place_labels(
    nodes: Vec<PointLabel>,
    symbols: &[SymbolPlacement],
    area_labels: Vec<PointLabel>,
) -> (Vec<PointLabel>, Vec<PointLabel>) {
    let mut accepted: Vec<Box2> = symbols.iter().map(symbol_box).collect();

    let keep = |label: PointLabel, accepted: &mut Vec<Box2>| -> Option<PointLabel> {
        let candidate = label_box(&label);
        if accepted.iter().any(|placed| placed.overlaps(&candidate)) {
            return None;
        }
        accepted.push(candidate);
        Some(label)
    };

    let area_labels = area_labels
        .into_iter()
        .filter_map(|label| keep(label, &mut accepted))
        .collect();

    let nodes = nodes
        .into_iter()
        .filter_map(|label| keep(label, &mut accepted))
        .collect();

    (nodes, area_labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::paint::{Color, Paint, Symbol};
    use std::sync::Arc;

    fn label(text: &str, x: f64, y: f64) -> PointLabel {
        PointLabel {
            text: text.to_owned(),
            position: Point::new(x, y),
            paint: Arc::new(Paint::default()),
            halo: None,
        }
    }

    #[test]
    fn test_disjoint_labels_all_kept() {
        let nodes = vec![label("Alpha", 40.0, 40.0), label("Beta", 40.0, 120.0)];
        let (kept, _) = place_labels(nodes, &[], Vec::new());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_overlapping_labels_pruned_in_order() {
        let nodes = vec![
            label("Alpha", 40.0, 40.0),
            label("Beta", 44.0, 42.0),
            label("Gamma", 40.0, 160.0),
        ];
        let (kept, _) = place_labels(nodes, &[], Vec::new());
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].text, "Alpha");
        assert_eq!(kept[1].text, "Gamma");
    }

    #[test]
    fn test_area_labels_win_over_nodes() {
        let nodes = vec![label("Node", 40.0, 40.0)];
        let areas = vec![label("Area", 42.0, 42.0)];
        let (kept_nodes, kept_areas) = place_labels(nodes, &[], areas);
        assert_eq!(kept_areas.len(), 1);
        assert!(kept_nodes.is_empty());
    }

    #[test]
    fn test_symbols_are_obstacles() {
        let symbol = SymbolPlacement {
            symbol: Symbol::solid(24, 24, Color::BLACK),
            position: Point::new(40.0, 36.0),
            rotation: 0.0,
            align_center: true,
        };
        let nodes = vec![label("Blocked", 40.0, 40.0), label("Free", 160.0, 160.0)];
        let (kept, _) = place_labels(nodes, &[symbol], Vec::new());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Free");
    }
}
