//! Engine-wide constants inherited from common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Number of coarse paint-ordering layers a feature can declare.
/// Declared layers outside `[0, LAYER_COUNT)` are clamped, never rejected.
pub const LAYER_COUNT: usize = 11;

/// Multiplicative stroke-width growth per zoom level above
/// [`STROKE_MIN_ZOOM`]. Keeps stroke weight visually constant in meters
/// rather than in pixels as the map zooms in.
pub const STROKE_INCREASE: f64 = 1.5;

/// Zoom level at and below which stroke widths are not scaled.
pub const STROKE_MIN_ZOOM: u8 = 12;

/// Minimum distance in pixels between a way symbol and the way's endpoints.
pub const SEGMENT_SAFETY_DISTANCE: f64 = 30.0;

/// Spacing in pixels between repeated symbols along a way.
pub const DISTANCE_BETWEEN_SYMBOLS: f64 = 200.0;

/// Spacing in pixels between repeated name labels along a way.
pub const DISTANCE_BETWEEN_WAY_NAMES: f64 = 500.0;

/// Extra width in pixels added to way-name text when checking segment fit.
pub const WAY_NAME_SAFETY_MARGIN: f64 = 10.0;

/// Start zoom used when the dataset metadata does not supply one.
pub const DEFAULT_START_ZOOM: u8 = 12;

/// Highest zoom level the renderer will produce tiles for.
pub const ZOOM_MAX: u8 = 22;
