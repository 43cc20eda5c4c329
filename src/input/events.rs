//! Raw touch events as delivered by the embedding platform.

use instant::Instant;

use crate::core::geo::Point;

/// The kind of pointer transition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First pointer went down, starting a gesture.
    Down,
    /// One or more pointers moved.
    Move,
    /// Last pointer went up, ending the gesture.
    Up,
    /// An additional pointer went down during an active gesture.
    PointerDown,
    /// A non-final pointer went up during an active gesture.
    PointerUp,
    /// The platform aborted the gesture, e.g. the view lost focus.
    Cancel,
}

/// One pointer's identity and position within an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPointer {
    /// Stable id for the lifetime of the pointer's contact.
    pub id: u64,
    /// Position in screen pixels.
    pub position: Point,
}

/// A raw multi-pointer touch event.
///
/// `pointers` lists every pointer still in contact; for [`TouchAction::Up`]
/// and [`TouchAction::PointerUp`] the lifting pointer is listed first.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<TouchPointer>,
    pub timestamp: Instant,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<TouchPointer>) -> Self {
        Self {
            action,
            pointers,
            timestamp: Instant::now(),
        }
    }

    /// Single-pointer event constructor.
    pub fn single(action: TouchAction, position: Point) -> Self {
        Self::new(action, vec![TouchPointer { id: 0, position }])
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn primary(&self) -> Option<&TouchPointer> {
        self.pointers.first()
    }

    pub fn pointer(&self, id: u64) -> Option<&TouchPointer> {
        self.pointers.iter().find(|pointer| pointer.id == id)
    }
}
