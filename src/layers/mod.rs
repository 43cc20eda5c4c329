//! Interactive overlays stacked on top of the base map.

pub mod overlay;
