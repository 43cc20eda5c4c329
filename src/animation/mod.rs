//! Background animation of view transitions.

pub mod zoom;

pub use zoom::ZoomAnimator;
