//! Touch input: raw event types, the gesture state machine and the
//! background long-press detector.

pub mod events;
pub mod gestures;
pub mod long_press;
