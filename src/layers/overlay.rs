//! The overlay stack: interactive layers drawn above the base map that get
//! first refusal on tap and long-press gestures.

use std::sync::{Arc, Mutex};

use crate::core::geo::Point;

/// An interactive layer above the base map.
///
/// Gesture callbacks receive the position in screen pixels and return true
/// to consume the gesture, stopping propagation to overlays beneath.
pub trait Overlay: Send + Sync {
    fn on_tap(&self, _position: Point) -> bool {
        false
    }

    fn on_long_press(&self, _position: Point) -> bool {
        false
    }

    /// Called when the base map has changed underneath the overlay, e.g.
    /// after a zoom animation finished.
    fn request_redraw(&self) {}
}

/// An ordered stack of overlays. The last added overlay is topmost and is
/// asked first during gesture dispatch.
///
/// The internal lock is held only while copying the overlay list, never
/// across the overlay callbacks, so an overlay may add or remove overlays
/// from within its own callback.
#[derive(Default)]
pub struct OverlayStack {
    overlays: Mutex<Vec<Arc<dyn Overlay>>>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, overlay: Arc<dyn Overlay>) {
        self.overlays
            .lock()
            .expect("overlay stack poisoned")
            .push(overlay);
    }

    /// Removes an overlay by identity. Unknown overlays are ignored.
    pub fn remove(&self, overlay: &Arc<dyn Overlay>) {
        self.overlays
            .lock()
            .expect("overlay stack poisoned")
            .retain(|candidate| !Arc::ptr_eq(candidate, overlay));
    }

    pub fn len(&self) -> usize {
        self.overlays.lock().expect("overlay stack poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offers a tap to the overlays, topmost first. Returns true as soon as
    /// one overlay consumes it.
    pub fn dispatch_tap(&self, position: Point) -> bool {
        self.snapshot()
            .iter()
            .rev()
            .any(|overlay| overlay.on_tap(position))
    }

    /// Offers a long press to the overlays, topmost first.
    pub fn dispatch_long_press(&self, position: Point) -> bool {
        self.snapshot()
            .iter()
            .rev()
            .any(|overlay| overlay.on_long_press(position))
    }

    /// Tells every overlay to redraw itself.
    pub fn notify_redraw_all(&self) {
        for overlay in self.snapshot() {
            overlay.request_redraw();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn Overlay>> {
        self.overlays
            .lock()
            .expect("overlay stack poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        taps: AtomicUsize,
        consume: bool,
    }

    impl Recorder {
        fn new(consume: bool) -> Arc<Self> {
            Arc::new(Self {
                taps: AtomicUsize::new(0),
                consume,
            })
        }
    }

    impl Overlay for Recorder {
        fn on_tap(&self, _position: Point) -> bool {
            self.taps.fetch_add(1, Ordering::SeqCst);
            self.consume
        }
    }

    #[test]
    fn test_topmost_consumes_first() {
        let stack = OverlayStack::new();
        let bottom = Recorder::new(true);
        let top = Recorder::new(true);
        stack.add(bottom.clone());
        stack.add(top.clone());

        assert!(stack.dispatch_tap(Point::new(1.0, 1.0)));
        assert_eq!(top.taps.load(Ordering::SeqCst), 1);
        assert_eq!(bottom.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unconsumed_tap_propagates() {
        let stack = OverlayStack::new();
        let bottom = Recorder::new(false);
        let top = Recorder::new(false);
        stack.add(bottom.clone());
        stack.add(top.clone());

        assert!(!stack.dispatch_tap(Point::new(1.0, 1.0)));
        assert_eq!(top.taps.load(Ordering::SeqCst), 1);
        assert_eq!(bottom.taps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_by_identity() {
        let stack = OverlayStack::new();
        let overlay = Recorder::new(true);
        let kept: Arc<dyn Overlay> = Recorder::new(true);
        stack.add(overlay.clone());
        stack.add(kept.clone());

        let as_dyn: Arc<dyn Overlay> = overlay;
        stack.remove(&as_dyn);
        assert_eq!(stack.len(), 1);
    }
}
