use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::constants::TILE_SIZE;

/// Latitude bound of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Clamps latitude to the Mercator-valid range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or tile-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A tile in the slippy map tile system, identified by (x, y, zoom).
///
/// A `Tile` is a coordinate-space key, not a cache entry; it owns no state
/// beyond its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl Tile {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Pixel position of this tile's northwest corner on the map plane.
    pub fn pixel_origin(&self) -> Point {
        Point::new(
            self.x as f64 * TILE_SIZE as f64,
            self.y as f64 * TILE_SIZE as f64,
        )
    }

    /// Checks if the tile coordinates are valid for the tile's zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = 1_u32 << self.zoom.min(31);
        self.x < max_coord && self.y < max_coord
    }
}

/// Size in pixels of the whole map plane at the given zoom level.
fn map_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2_f64.powi(zoom as i32)
}

/// Converts a longitude to an absolute pixel X coordinate at a zoom level.
pub fn longitude_to_pixel_x(lng: f64, zoom: u8) -> f64 {
    (lng + 180.0) / 360.0 * map_size(zoom)
}

/// Converts a latitude to an absolute pixel Y coordinate at a zoom level.
///
/// The latitude is expected to be pre-clamped to the Mercator-valid range
/// by the caller; see [`LatLng::clamp_lat`].
pub fn latitude_to_pixel_y(lat: f64, zoom: u8) -> f64 {
    let sin_lat = lat.to_radians().sin();
    (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * map_size(zoom)
}

/// Converts an absolute pixel X coordinate back to a longitude.
pub fn pixel_x_to_longitude(pixel_x: f64, zoom: u8) -> f64 {
    360.0 * (pixel_x / map_size(zoom) - 0.5)
}

/// Converts an absolute pixel Y coordinate back to a latitude.
pub fn pixel_y_to_latitude(pixel_y: f64, zoom: u8) -> f64 {
    let y = 0.5 - pixel_y / map_size(zoom);
    90.0 - 360.0 * ((-y * 2.0 * PI).exp().atan()) / PI
}

/// Projects a geographical coordinate into the pixel space of one tile.
pub fn project_to_tile(position: &LatLng, tile: &Tile) -> Point {
    let origin = tile.pixel_origin();
    Point::new(
        longitude_to_pixel_x(position.lng, tile.zoom) - origin.x,
        latitude_to_pixel_y(position.lat, tile.zoom) - origin.y,
    )
}
