//! Configuration for gesture recognition and zoom animation timing.
//!
//! The default values are empirically tuned UI constants carried over from
//! the classic mobile map stacks. They are defaults, not invariants; an
//! embedder may retune them for different pixel densities.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the touch gesture state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Movement in pixels on either axis before a press turns into a pan.
    /// Derived from the platform touch-slop on mobile devices.
    pub move_delta: f64,
    /// Maximum distance in pixels between two taps of a double tap.
    pub double_tap_delta: f64,
    /// Maximum time between two taps of a double tap. Also bounds the
    /// first-pointer lift of a multi-touch tap.
    pub double_tap_timeout: Duration,
    /// How long a stationary press must be held before a long-press fires.
    pub long_press_timeout: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            move_delta: 8.0,
            double_tap_delta: 64.0,
            double_tap_timeout: Duration::from_millis(300),
            long_press_timeout: Duration::from_millis(500),
        }
    }
}

/// Tuning knobs for the zoom transition animator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomAnimationConfig {
    /// Total wall-clock duration of one zoom transition.
    pub duration: Duration,
    /// Sleep period between animation frames.
    pub frame_length: Duration,
}

impl Default for ZoomAnimationConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            frame_length: Duration::from_millis(15),
        }
    }
}
