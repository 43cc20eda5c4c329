//! Symbol and name placement along way geometries.
//!
//! Both algorithms walk a way's first ring in tile-pixel space and are
//! stateless given their inputs. A way too short for any placement simply
//! yields zero placements; rings with fewer than two points are skipped.

use std::sync::Arc;

use crate::core::constants::{
    DISTANCE_BETWEEN_SYMBOLS, DISTANCE_BETWEEN_WAY_NAMES, SEGMENT_SAFETY_DISTANCE,
    WAY_NAME_SAFETY_MARGIN,
};
use crate::core::geo::Point;
use crate::rendering::paint::{Paint, Symbol};
use crate::rendering::primitives::{SymbolPlacement, WayLabel};
use crate::rendering::text;

/// Places a symbol repeatedly (or once) along a way.
///
/// A running skip counter starts at the segment safety margin so symbols
/// keep clear of the way's endpoints; after each placement it resets to the
/// inter-symbol distance, floored at the safety margin.
pub fn render_symbol(
    symbol: &Symbol,
    align_center: bool,
    repeat: bool,
    rings: &[Vec<Point>],
    out: &mut Vec<SymbolPlacement>,
) {
    let Some(ring) = rings.first() else {
        return;
    };
    if ring.len() < 2 {
        return;
    }

    let mut skip = SEGMENT_SAFETY_DISTANCE;
    let mut previous = ring[0];

    for &current in &ring[1..] {
        let mut diff_x = current.x - previous.x;
        let mut diff_y = current.y - previous.y;
        let mut remaining = (diff_x * diff_x + diff_y * diff_y).sqrt();

        while remaining - skip > SEGMENT_SAFETY_DISTANCE {
            // advance the cursor along the segment by the skip fraction
            let fraction = skip / remaining;
            previous = Point::new(previous.x + diff_x * fraction, previous.y + diff_y * fraction);
            let angle = (current.y - previous.y).atan2(current.x - previous.x) as f32;

            out.push(SymbolPlacement {
                symbol: symbol.clone(),
                position: previous,
                rotation: angle,
                align_center,
            });

            if !repeat {
                return;
            }

            diff_x = current.x - previous.x;
            diff_y = current.y - previous.y;
            remaining -= skip;
            skip = DISTANCE_BETWEEN_SYMBOLS;
        }

        skip -= remaining;
        if skip < SEGMENT_SAFETY_DISTANCE {
            skip = SEGMENT_SAFETY_DISTANCE;
        }

        previous = current;
    }
}

/// Places way-name text on segments long enough to carry it.
///
/// The anchors are oriented left-to-right so the text never renders
/// mirrored. When a halo paint is configured the placement is duplicated
/// with it, pushed before the foreground so it paints underneath.
pub fn render_text(
    name: &str,
    paint: Arc<Paint>,
    halo: Option<Arc<Paint>>,
    rings: &[Vec<Point>],
    out: &mut Vec<WayLabel>,
) {
    let Some(ring) = rings.first() else {
        return;
    };
    if ring.len() < 2 {
        return;
    }

    let name_width = text::measure(name, paint.text_size) + WAY_NAME_SAFETY_MARGIN;

    let mut skip = 0.0f64;
    let mut previous = ring[0];

    for &current in &ring[1..] {
        let segment_length = previous.distance_to(&current);

        if skip > 0.0 {
            skip -= segment_length;
        } else if segment_length > name_width {
            let (start, end) = if previous.x <= current.x {
                (previous, current)
            } else {
                (current, previous)
            };

            if let Some(halo) = &halo {
                out.push(WayLabel {
                    text: name.to_owned(),
                    start,
                    end,
                    paint: Arc::clone(halo),
                });
            }
            out.push(WayLabel {
                text: name.to_owned(),
                start,
                end,
                paint: Arc::clone(&paint),
            });

            skip = DISTANCE_BETWEEN_WAY_NAMES;
        }

        previous = current;
    }
}
