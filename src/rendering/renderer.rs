//! The tile rendering orchestrator.
//!
//! For one tile the renderer reads features from the dataset, drives theme
//! matching for each feature (receiving the theme's re-entrant callbacks),
//! runs way decoration and label placement, and hands the collected
//! primitives to the rasterizer in a fixed order.
//!
//! A renderer instance is reusable but not thread-safe: tile worker pools
//! must give each concurrent tile job its own instance. All buckets and
//! placement lists are per-instance scratch space cleared every render.

use std::sync::Arc;

use crate::core::constants::{
    DEFAULT_START_ZOOM, LAYER_COUNT, STROKE_INCREASE, STROKE_MIN_ZOOM, TILE_SIZE, ZOOM_MAX,
};
use crate::core::geo::{project_to_tile, LatLng, Point, Tile};
use crate::rendering::decorator;
use crate::rendering::labels;
use crate::rendering::paint::{Paint, Symbol};
use crate::rendering::primitives::{
    LayerBuckets, PointLabel, Shape, ShapePaint, SymbolPlacement, WayLabel,
};
use crate::rendering::rasterizer::TileCanvas;
use crate::theme::{RenderCallback, RenderTheme};
use crate::tiles::source::{PointFeature, SourceMetadata, Tag, TileData, TileSource, WayFeature};
use crate::{MapError, Result};

/// Debug overlays drawn on top of the finished tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugSettings {
    pub draw_tile_frame: bool,
    pub draw_tile_coordinates: bool,
}

/// Parameters of one tile render request.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob {
    pub tile: Tile,
    pub text_scale: f32,
    pub debug: DebugSettings,
}

impl RenderJob {
    pub fn new(tile: Tile) -> Self {
        Self {
            tile,
            text_scale: 1.0,
            debug: DebugSettings::default(),
        }
    }
}

/// Stroke-width scale factor for a zoom level: widths grow by a fixed
/// multiplicative step for every level above the scaling threshold, keeping
/// stroke weight visually constant in meters rather than pixels.
pub fn stroke_scale_factor(zoom: u8) -> f64 {
    let diff = zoom.saturating_sub(STROKE_MIN_ZOOM) as i32;
    STROKE_INCREASE.powi(diff)
}

fn valid_layer(layer: i8) -> usize {
    layer.clamp(0, LAYER_COUNT as i8 - 1) as usize
}

/// Renders map tiles by reading from a [`TileSource`] and matching features
/// against a [`RenderTheme`].
pub struct TileRenderer {
    source: Arc<dyn TileSource>,
    theme: Option<Arc<dyn RenderTheme>>,

    buckets: LayerBuckets,
    way_labels: Vec<WayLabel>,
    nodes: Vec<PointLabel>,
    area_labels: Vec<PointLabel>,
    way_symbols: Vec<SymbolPlacement>,
    point_symbols: Vec<SymbolPlacement>,

    // matching scratch, valid only while a feature is being matched
    current_tile: Tile,
    current_layer: usize,
    current_rings: Arc<Vec<Vec<Point>>>,
    poi_position: Point,

    previous_zoom: Option<u8>,
    previous_text_scale: Option<f32>,
}

impl TileRenderer {
    pub fn new(source: Arc<dyn TileSource>) -> Self {
        Self {
            source,
            theme: None,
            buckets: LayerBuckets::new(0),
            way_labels: Vec::new(),
            nodes: Vec::new(),
            area_labels: Vec::new(),
            way_symbols: Vec::new(),
            point_symbols: Vec::new(),
            current_tile: Tile::new(0, 0, 0),
            current_layer: 0,
            current_rings: Arc::new(Vec::new()),
            poi_position: Point::default(),
            previous_zoom: None,
            previous_text_scale: None,
        }
    }

    /// Supplies a new render theme, rebuilding the per-layer/per-level
    /// bucket structure and invalidating the cached scale factors.
    pub fn set_theme(&mut self, theme: Arc<dyn RenderTheme>) {
        self.buckets = LayerBuckets::new(theme.levels());
        self.theme = Some(theme);
        self.previous_zoom = None;
        self.previous_text_scale = None;
    }

    /// Drops the current theme, e.g. after an external theme reload failed.
    /// Every tile request short-circuits to failure until a valid theme is
    /// supplied again.
    pub fn clear_theme(&mut self) {
        self.theme = None;
    }

    /// Renders one tile into a bitmap.
    pub fn render_tile(&mut self, job: &RenderJob) -> Result<tiny_skia::Pixmap> {
        let theme = self.prepare(job)?;

        let mut canvas = TileCanvas::new();
        canvas.fill(theme.map_background());
        canvas.draw_ways(&self.buckets);
        canvas.draw_symbols(&self.way_symbols);
        canvas.draw_symbols(&self.point_symbols);
        canvas.draw_way_labels(&self.way_labels);
        canvas.draw_point_labels(&self.nodes);
        canvas.draw_point_labels(&self.area_labels);

        if job.debug.draw_tile_frame {
            canvas.draw_tile_frame();
        }
        if job.debug.draw_tile_coordinates {
            canvas.draw_tile_coordinates(&job.tile);
        }

        self.clear_transient();
        Ok(canvas.into_pixmap())
    }

    /// Start position for a view over this renderer's dataset.
    pub fn start_position(&self) -> Option<LatLng> {
        let SourceMetadata {
            start_position,
            map_center,
            ..
        } = self.source.metadata();
        start_position.or(map_center)
    }

    /// Start zoom level, falling back to the engine default.
    pub fn start_zoom(&self) -> u8 {
        self.source
            .metadata()
            .start_zoom
            .unwrap_or(DEFAULT_START_ZOOM)
    }

    pub fn max_zoom(&self) -> u8 {
        ZOOM_MAX
    }

    /// Reads and matches all of the tile's features, then resolves
    /// decoration and label collisions. Populates the buckets and placement
    /// lists without rasterizing or clearing them.
    fn prepare(&mut self, job: &RenderJob) -> Result<Arc<dyn RenderTheme>> {
        let theme = self
            .theme
            .clone()
            .ok_or_else(|| MapError::Theme("no render theme supplied".into()))?;

        self.current_tile = job.tile;

        if self.previous_text_scale != Some(job.text_scale) {
            theme.scale_text_size(job.text_scale);
            self.previous_text_scale = Some(job.text_scale);
        }

        if self.previous_zoom != Some(job.tile.zoom) {
            theme.scale_stroke_width(stroke_scale_factor(job.tile.zoom) as f32);
            self.previous_zoom = Some(job.tile.zoom);
        }

        if let Some(data) = self.source.read_tile(&job.tile) {
            self.process_tile_data(&theme, &data);
        }

        let nodes = std::mem::take(&mut self.nodes);
        let area_labels = std::mem::take(&mut self.area_labels);
        let (nodes, area_labels) = labels::place_labels(nodes, &self.point_symbols, area_labels);
        self.nodes = nodes;
        self.area_labels = area_labels;

        Ok(theme)
    }

    fn process_tile_data(&mut self, theme: &Arc<dyn RenderTheme>, data: &TileData) {
        for point in &data.points {
            self.process_point_of_interest(theme, point);
        }
        for way in &data.ways {
            self.process_way(theme, way);
        }
        if data.is_water {
            self.render_water_background(theme);
        }
    }

    fn process_point_of_interest(&mut self, theme: &Arc<dyn RenderTheme>, point: &PointFeature) {
        self.current_layer = valid_layer(point.layer);
        self.poi_position = project_to_tile(&point.position, &self.current_tile);
        let zoom = self.current_tile.zoom;
        theme.match_node(self, &point.tags, zoom);
    }

    fn process_way(&mut self, theme: &Arc<dyn RenderTheme>, way: &WayFeature) {
        self.current_layer = valid_layer(way.layer);

        let rings: Vec<Vec<Point>> = way
            .rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .map(|position| project_to_tile(position, &self.current_tile))
                    .collect()
            })
            .collect();
        self.current_rings = Arc::new(rings);

        let zoom = self.current_tile.zoom;
        if is_closed_way(&self.current_rings) {
            theme.match_closed_way(self, &way.tags, zoom);
        } else {
            theme.match_linear_way(self, &way.tags, zoom);
        }
    }

    /// Synthesizes one closed way covering the full tile extent, tagged
    /// `natural=water`, so water-only tiles receive the theme-correct fill
    /// even with no explicit geometry.
    fn render_water_background(&mut self, theme: &Arc<dyn RenderTheme>) {
        let size = TILE_SIZE as f64;
        self.current_layer = 0;
        self.current_rings = Arc::new(vec![vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
            Point::new(0.0, 0.0),
        ]]);
        let tags = [Tag::new("natural", "water")];
        let zoom = self.current_tile.zoom;
        theme.match_closed_way(self, &tags, zoom);
    }

    /// Clears all primitive buckets and transient placement lists so the
    /// same renderer instance is safe to reuse for the next tile.
    fn clear_transient(&mut self) {
        self.buckets.clear();
        self.way_labels.clear();
        self.nodes.clear();
        self.area_labels.clear();
        self.way_symbols.clear();
        self.point_symbols.clear();
    }
}

fn is_closed_way(rings: &[Vec<Point>]) -> bool {
    rings
        .first()
        .and_then(|ring| Some((ring.first()?, ring.last()?)))
        .map(|(first, last)| first == last)
        .unwrap_or(false)
}

fn bounding_box_center(ring: &[Point]) -> Point {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for point in ring {
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
    }
    Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0)
}

impl RenderCallback for TileRenderer {
    fn render_way(&mut self, paint: Arc<Paint>, level: usize) {
        self.buckets.push(
            self.current_layer,
            level,
            ShapePaint {
                shape: Shape::Way(Arc::clone(&self.current_rings)),
                paint,
            },
        );
    }

    fn render_area(&mut self, paint: Arc<Paint>, level: usize) {
        self.buckets.push(
            self.current_layer,
            level,
            ShapePaint {
                shape: Shape::Way(Arc::clone(&self.current_rings)),
                paint,
            },
        );
    }

    fn render_point_of_interest_circle(&mut self, radius: f32, paint: Arc<Paint>, level: usize) {
        self.buckets.push(
            self.current_layer,
            level,
            ShapePaint {
                shape: Shape::Circle {
                    center: self.poi_position,
                    radius,
                },
                paint,
            },
        );
    }

    fn render_point_of_interest_caption(
        &mut self,
        caption: &str,
        vertical_offset: f64,
        paint: Arc<Paint>,
        halo: Option<Arc<Paint>>,
    ) {
        self.nodes.push(PointLabel {
            text: caption.to_owned(),
            position: Point::new(self.poi_position.x, self.poi_position.y + vertical_offset),
            paint,
            halo,
        });
    }

    fn render_point_of_interest_symbol(&mut self, symbol: Symbol) {
        self.point_symbols.push(SymbolPlacement {
            symbol,
            position: self.poi_position,
            rotation: 0.0,
            align_center: true,
        });
    }

    fn render_area_caption(
        &mut self,
        caption: &str,
        vertical_offset: f64,
        paint: Arc<Paint>,
        halo: Option<Arc<Paint>>,
    ) {
        let Some(ring) = self.current_rings.first() else {
            return;
        };
        let center = bounding_box_center(ring);
        self.area_labels.push(PointLabel {
            text: caption.to_owned(),
            position: Point::new(center.x, center.y + vertical_offset),
            paint,
            halo,
        });
    }

    fn render_area_symbol(&mut self, symbol: Symbol) {
        let Some(ring) = self.current_rings.first() else {
            return;
        };
        self.point_symbols.push(SymbolPlacement {
            symbol,
            position: bounding_box_center(ring),
            rotation: 0.0,
            align_center: true,
        });
    }

    fn render_way_symbol(&mut self, symbol: Symbol, align_center: bool, repeat: bool) {
        decorator::render_symbol(
            &symbol,
            align_center,
            repeat,
            &self.current_rings,
            &mut self.way_symbols,
        );
    }

    fn render_way_text(&mut self, text: &str, paint: Arc<Paint>, halo: Option<Arc<Paint>>) {
        decorator::render_text(text, paint, halo, &self.current_rings, &mut self.way_labels);
    }
}
