//! # vectile
//!
//! An offline vector-map tile rendering engine with a touch-gesture
//! recognition state machine.
//!
//! The crate turns a compact binary map dataset (exposed through the
//! [`tiles::source::TileSource`] trait) into styled raster tiles, and turns a
//! stream of raw pointer events into pan/zoom/tap semantics. Rendering is
//! driven by a declarative [`theme::RenderTheme`]; input is consumed by an
//! [`input::gestures::TouchHandler`] backed by two cooperative background
//! threads (long-press detection and zoom animation).

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod rendering;
pub mod theme;
pub mod tiles;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{GestureConfig, ZoomAnimationConfig},
    geo::{LatLng, Point, Tile},
    viewport::{MapViewState, Transform},
};

pub use crate::input::{events::TouchEvent, gestures::TouchHandler};

pub use crate::layers::overlay::{Overlay, OverlayStack};

pub use crate::rendering::renderer::{DebugSettings, RenderJob, TileRenderer};

pub use crate::theme::{RenderCallback, RenderTheme};

pub use crate::tiles::source::{TileData, TileSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("render theme unavailable: {0}")]
    Theme(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("font error: {0}")]
    Font(String),
}
