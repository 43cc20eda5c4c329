//! The boundary to the binary map dataset reader.
//!
//! The actual file decoder lives outside this crate; the renderer only needs
//! one tile's worth of features at a time plus the dataset metadata consumed
//! at view initialization.

use serde::{Deserialize, Serialize};

use crate::core::geo::{LatLng, Tile};

/// An unordered key/value tag attached to a map feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A point of interest read from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    pub position: LatLng,
    /// Declared paint-ordering layer. May lie outside the valid range; the
    /// renderer clamps it.
    pub layer: i8,
    pub tags: Vec<Tag>,
}

/// A line or polygon feature read from the dataset.
///
/// A way with more than one ring represents a multi-part geometry, e.g. a
/// polygon with holes. A ring may be open or closed; the renderer decides
/// closed-ness from the first ring's endpoints after projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayFeature {
    pub rings: Vec<Vec<LatLng>>,
    pub layer: i8,
    pub tags: Vec<Tag>,
}

/// Everything the dataset knows about one tile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub points: Vec<PointFeature>,
    pub ways: Vec<WayFeature>,
    /// True when the tile is fully covered by water and carries no explicit
    /// water geometry. The renderer synthesizes the fill.
    pub is_water: bool,
}

/// Dataset-level metadata consumed once at renderer/view initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub start_position: Option<LatLng>,
    pub start_zoom: Option<u8>,
    pub map_center: Option<LatLng>,
}

/// A source of per-tile map features.
pub trait TileSource: Send + Sync {
    /// Reads all features intersecting the tile. `None` means the dataset
    /// has nothing for this tile, which is not an error; the tile renders
    /// with only the theme's background fill.
    fn read_tile(&self, tile: &Tile) -> Option<TileData>;

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata::default()
    }
}
