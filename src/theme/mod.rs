//! The cartographic render-theme boundary.
//!
//! A theme classifies feature tags into drawing instructions per zoom level.
//! During matching the theme calls back into the renderer through
//! [`RenderCallback`]; the theme engine itself holds no renderer state.
//!
//! Theme XML parsing lives outside this crate. [`rules::RuleTheme`] provides
//! a programmatic rule-table implementation for embedders and tests.

pub mod rules;

use std::sync::Arc;

use crate::rendering::paint::{Color, Paint, Symbol};
use crate::tiles::source::Tag;

/// The callback surface a theme drives while matching one feature.
///
/// `level` is the ordering index inside the feature's layer; together the
/// (layer, level) pair determines paint order.
pub trait RenderCallback {
    /// Renders a way with a stroke paint at the given level.
    fn render_way(&mut self, paint: Arc<Paint>, level: usize);

    /// Renders a closed way as a filled (or outlined) area.
    fn render_area(&mut self, paint: Arc<Paint>, level: usize);

    /// Renders a circle centered on the current point of interest.
    fn render_point_of_interest_circle(&mut self, radius: f32, paint: Arc<Paint>, level: usize);

    /// Places caption text at the current point of interest.
    fn render_point_of_interest_caption(
        &mut self,
        caption: &str,
        vertical_offset: f64,
        paint: Arc<Paint>,
        halo: Option<Arc<Paint>>,
    );

    /// Places a bitmap symbol at the current point of interest.
    fn render_point_of_interest_symbol(&mut self, symbol: Symbol);

    /// Places caption text at the center of the current area.
    fn render_area_caption(
        &mut self,
        caption: &str,
        vertical_offset: f64,
        paint: Arc<Paint>,
        halo: Option<Arc<Paint>>,
    );

    /// Places a bitmap symbol at the center of the current area.
    fn render_area_symbol(&mut self, symbol: Symbol);

    /// Requests repeated (or single) symbol decoration along the current way.
    fn render_way_symbol(&mut self, symbol: Symbol, align_center: bool, repeat: bool);

    /// Requests name text decoration along the current way.
    fn render_way_text(&mut self, text: &str, paint: Arc<Paint>, halo: Option<Arc<Paint>>);
}

/// A rule table mapping feature tags to drawing instructions.
///
/// A theme is immutable for a given (theme identity, zoom level, text scale)
/// triple; the renderer re-applies the scale factors only when one of those
/// changes, never per tile.
pub trait RenderTheme: Send + Sync {
    /// Number of distinct drawing levels required by this theme. Sizes the
    /// per-layer primitive buckets.
    fn levels(&self) -> usize;

    /// Background fill color for tiles.
    fn map_background(&self) -> Color;

    /// Matches a point of interest against the node rule set.
    fn match_node(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8);

    /// Matches a way whose first ring is closed against the closed-way rules.
    fn match_closed_way(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8);

    /// Matches an open way against the linear-way rules.
    fn match_linear_way(&self, callback: &mut dyn RenderCallback, tags: &[Tag], zoom: u8);

    /// Scales the stroke width of all paints by the given factor, relative
    /// to the theme's base widths.
    fn scale_stroke_width(&self, factor: f32);

    /// Scales the text size of all paints by the given factor, relative to
    /// the theme's base sizes.
    fn scale_text_size(&self, factor: f32);
}
