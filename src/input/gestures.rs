//! The touch gesture state machine.
//!
//! Consumes raw [`TouchEvent`]s and turns them into pans, pinches, taps,
//! double taps, multi-touch taps and long presses against a shared
//! [`MapViewState`]. One handler instance serves one map view and must be
//! driven from a single input thread; the long-press timer and the zoom
//! animation each run on their own background thread.

use std::sync::Arc;

use instant::Instant;

use crate::animation::ZoomAnimator;
use crate::core::config::GestureConfig;
use crate::core::geo::Point;
use crate::core::viewport::MapViewState;
use crate::input::events::{TouchAction, TouchEvent};
use crate::input::long_press::LongPressDetector;
use crate::layers::overlay::OverlayStack;

/// Incremental two-pointer pinch tracking.
///
/// Applies the span ratio between consecutive move events as a scale about
/// the pointer midpoint. While a pinch is in progress single-pointer panning
/// is suppressed.
#[derive(Default)]
struct PinchTracker {
    in_progress: bool,
    last_span: f64,
}

impl PinchTracker {
    fn update(&mut self, first: Point, second: Point, view: &MapViewState) {
        let span = first.distance_to(&second);
        if span <= 0.0 {
            return;
        }
        if !self.in_progress {
            self.in_progress = true;
            self.last_span = span;
            return;
        }

        let focus = Point::new((first.x + second.x) / 2.0, (first.y + second.y) / 2.0);
        view.scale_around(span / self.last_span, focus);
        view.request_redraw();
        self.last_span = span;
    }

    fn reset(&mut self) {
        self.in_progress = false;
        self.last_span = 0.0;
    }
}

/// Translates raw touch events into map gestures.
pub struct TouchHandler {
    view: Arc<MapViewState>,
    overlays: Arc<OverlayStack>,
    animator: Arc<ZoomAnimator>,
    long_press: LongPressDetector,
    config: GestureConfig,

    gesture_active: bool,
    active_pointer_id: u64,
    previous_position: Option<Point>,
    move_threshold_exceeded: bool,
    pending_tap: Option<(Point, Instant)>,
    multi_touch_down_time: Option<Instant>,
    /// Set once a second pointer joins; the gesture can no longer end in a
    /// single-pointer tap.
    was_multi_touch: bool,
    pinch: PinchTracker,
}

impl TouchHandler {
    pub fn new(
        view: Arc<MapViewState>,
        overlays: Arc<OverlayStack>,
        animator: Arc<ZoomAnimator>,
        config: GestureConfig,
    ) -> Self {
        let overlays_for_press = Arc::clone(&overlays);
        let long_press = LongPressDetector::new(config.long_press_timeout, move |position| {
            overlays_for_press.dispatch_long_press(position)
        });

        Self {
            view,
            overlays,
            animator,
            long_press,
            config,
            gesture_active: false,
            active_pointer_id: 0,
            previous_position: None,
            move_threshold_exceeded: false,
            pending_tap: None,
            multi_touch_down_time: None,
            was_multi_touch: false,
            pinch: PinchTracker::default(),
        }
    }

    /// Feeds one raw event through the state machine. Returns whether the
    /// event was consumed.
    pub fn on_touch_event(&mut self, event: &TouchEvent) -> bool {
        match event.action {
            TouchAction::Down => self.on_down(event),
            TouchAction::Move => self.on_move(event),
            TouchAction::Up => self.on_up(event),
            TouchAction::PointerDown => self.on_pointer_down(event),
            TouchAction::PointerUp => self.on_pointer_up(event),
            TouchAction::Cancel => self.on_cancel(),
        }
    }

    fn on_down(&mut self, event: &TouchEvent) -> bool {
        let Some(primary) = event.primary() else {
            return false;
        };
        self.gesture_active = true;
        self.active_pointer_id = primary.id;
        self.previous_position = Some(primary.position);
        self.move_threshold_exceeded = false;
        self.was_multi_touch = false;
        self.pinch.reset();
        self.long_press.arm(primary.position);
        true
    }

    fn on_move(&mut self, event: &TouchEvent) -> bool {
        if !self.gesture_active {
            return false;
        }

        if event.pointer_count() >= 2 {
            self.long_press.disarm();
            let first = event.pointers[0].position;
            let second = event.pointers[1].position;
            self.pinch.update(first, second, &self.view);
            return true;
        }

        let Some(pointer) = event
            .pointer(self.active_pointer_id)
            .or_else(|| event.primary())
        else {
            return false;
        };
        let position = pointer.position;
        let Some(previous) = self.previous_position else {
            return false;
        };

        if !self.move_threshold_exceeded {
            // measured from the down position; a jittering press stays a tap
            let within = (position.x - previous.x).abs() <= self.config.move_delta
                && (position.y - previous.y).abs() <= self.config.move_delta;
            if within {
                return true;
            }
            self.move_threshold_exceeded = true;
            self.long_press.disarm();
            self.pending_tap = None;
            // the slop distance itself is never panned; rebase so panning
            // starts from the crossing position on the next move
            self.previous_position = Some(position);
            return true;
        }

        if !self.pinch.in_progress {
            self.view
                .translate(position.x - previous.x, position.y - previous.y);
            self.view.request_redraw();
        }
        self.previous_position = Some(position);
        true
    }

    fn on_up(&mut self, event: &TouchEvent) -> bool {
        if !self.gesture_active {
            log::debug!("ignoring pointer up without a preceding down");
            return false;
        }
        self.gesture_active = false;
        self.long_press.disarm();
        self.pinch.reset();
        self.multi_touch_down_time = None;

        if self.move_threshold_exceeded || self.was_multi_touch || self.long_press.was_press_handled()
        {
            self.pending_tap = None;
            return true;
        }

        let Some(pointer) = event.primary() else {
            return false;
        };
        let position = pointer.position;

        if let Some((tap_position, tap_time)) = self.pending_tap {
            let in_distance = (position.x - tap_position.x).abs() <= self.config.double_tap_delta
                && (position.y - tap_position.y).abs() <= self.config.double_tap_delta;
            let in_time =
                event.timestamp.duration_since(tap_time) <= self.config.double_tap_timeout;
            if in_distance && in_time {
                self.pending_tap = None;
                self.zoom_about_point(1, position);
                return true;
            }
        }

        self.pending_tap = Some((position, event.timestamp));
        self.overlays.dispatch_tap(position);
        true
    }

    fn on_pointer_down(&mut self, event: &TouchEvent) -> bool {
        if !self.gesture_active {
            return false;
        }
        self.long_press.disarm();
        self.was_multi_touch = true;
        self.multi_touch_down_time = Some(event.timestamp);
        true
    }

    fn on_pointer_up(&mut self, event: &TouchEvent) -> bool {
        if !self.gesture_active {
            return false;
        }

        // rebase onto a surviving pointer so the next move does not jump
        if let Some(survivor) = event
            .pointers
            .iter()
            .skip(1)
            .find(|pointer| pointer.id != self.active_pointer_id)
            .or_else(|| event.pointers.get(1))
        {
            self.active_pointer_id = survivor.id;
            self.previous_position = Some(survivor.position);
        }
        self.pinch.reset();

        // a quick two-finger tap zooms out one level; only the lift timing
        // gates it, not any earlier panning
        if let Some(down_time) = self.multi_touch_down_time.take() {
            if event.timestamp.duration_since(down_time) <= self.config.double_tap_timeout {
                self.pending_tap = None;
                let pivot = self.screen_center();
                self.zoom_about_pivot(-1, pivot);
            }
        }
        true
    }

    fn on_cancel(&mut self) -> bool {
        self.long_press.disarm();
        self.gesture_active = false;
        self.previous_position = None;
        self.move_threshold_exceeded = false;
        self.pending_tap = None;
        self.multi_touch_down_time = None;
        self.was_multi_touch = false;
        self.pinch.reset();
        true
    }

    /// Double-tap zoom: recenters on the tapped position so the animation
    /// converges on it, then steps the zoom level.
    fn zoom_about_point(&mut self, step: i8, position: Point) {
        let center = self.view.from_screen_pixels(position);
        self.view.set_center(center);
        self.zoom_about_pivot(step, self.screen_center());
    }

    fn zoom_about_pivot(&mut self, step: i8, pivot: Point) {
        let from = self.view.zoom_level();
        if !self.view.zoom_by(step) {
            return;
        }
        let to = self.view.zoom_level();
        self.animator.start(from as f64, to as f64, pivot);
    }

    fn screen_center(&self) -> Point {
        let size = self.view.screen_size();
        Point::new(size.x / 2.0, size.y / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ZoomAnimationConfig;
    use crate::core::geo::LatLng;
    use crate::input::events::TouchPointer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct TapRecorder {
        taps: AtomicUsize,
    }

    impl crate::layers::overlay::Overlay for TapRecorder {
        fn on_tap(&self, _position: Point) -> bool {
            self.taps.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    struct Fixture {
        view: Arc<MapViewState>,
        taps: Arc<TapRecorder>,
        handler: TouchHandler,
    }

    fn fixture() -> Fixture {
        let view = Arc::new(MapViewState::new(LatLng::default(), 10));
        view.set_screen_size(512.0, 512.0);
        let overlays = Arc::new(OverlayStack::new());
        let taps = Arc::new(TapRecorder {
            taps: AtomicUsize::new(0),
        });
        overlays.add(taps.clone());
        let animator = Arc::new(ZoomAnimator::new(
            Arc::clone(&view),
            Arc::clone(&overlays),
            ZoomAnimationConfig {
                duration: Duration::from_millis(10),
                frame_length: Duration::from_millis(2),
            },
        ));
        let handler = TouchHandler::new(
            Arc::clone(&view),
            overlays,
            animator,
            GestureConfig::default(),
        );
        Fixture {
            view,
            taps,
            handler,
        }
    }

    fn event_at(action: TouchAction, position: Point, timestamp: Instant) -> TouchEvent {
        TouchEvent {
            action,
            pointers: vec![TouchPointer { id: 0, position }],
            timestamp,
        }
    }

    fn tap(fixture: &mut Fixture, position: Point, timestamp: Instant) {
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, position, timestamp));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Up, position, timestamp));
    }

    #[test]
    fn test_pan_moves_view() {
        let mut fixture = fixture();
        let now = Instant::now();
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, Point::new(100.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Move, Point::new(150.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Move, Point::new(170.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Up, Point::new(170.0, 100.0), now));

        // only movement after the crossing move pans
        assert_eq!(fixture.view.snapshot().translate, Point::new(20.0, 0.0));
        // a pan is not a tap
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_threshold_crossing_move_absorbs_the_slop() {
        let mut fixture = fixture();
        let now = Instant::now();
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, Point::new(100.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Move, Point::new(150.0, 100.0), now));

        assert!(fixture.view.snapshot().is_identity());
    }

    #[test]
    fn test_jitter_below_threshold_stays_a_tap() {
        let mut fixture = fixture();
        let now = Instant::now();
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, Point::new(100.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Move, Point::new(104.0, 103.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Up, Point::new(104.0, 103.0), now));

        assert!(fixture.view.snapshot().is_identity());
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_tap_zooms_in() {
        let mut fixture = fixture();
        let now = Instant::now();
        tap(&mut fixture, Point::new(200.0, 200.0), now);
        tap(
            &mut fixture,
            Point::new(205.0, 200.0),
            now + Duration::from_millis(100),
        );

        assert_eq!(fixture.view.zoom_level(), 11);
        // only the first tap reached the overlays
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slow_second_tap_is_two_taps() {
        let mut fixture = fixture();
        let now = Instant::now();
        tap(&mut fixture, Point::new(200.0, 200.0), now);
        tap(
            &mut fixture,
            Point::new(200.0, 200.0),
            now + Duration::from_millis(400),
        );

        assert_eq!(fixture.view.zoom_level(), 10);
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distant_second_tap_is_two_taps() {
        let mut fixture = fixture();
        let now = Instant::now();
        tap(&mut fixture, Point::new(100.0, 100.0), now);
        tap(
            &mut fixture,
            Point::new(300.0, 100.0),
            now + Duration::from_millis(50),
        );

        assert_eq!(fixture.view.zoom_level(), 10);
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_multi_touch_tap_zooms_out() {
        let mut fixture = fixture();
        let now = Instant::now();
        let first = TouchPointer {
            id: 0,
            position: Point::new(200.0, 200.0),
        };
        let second = TouchPointer {
            id: 1,
            position: Point::new(260.0, 200.0),
        };

        fixture
            .handler
            .on_touch_event(&TouchEvent {
                action: TouchAction::Down,
                pointers: vec![first],
                timestamp: now,
            });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::PointerDown,
            pointers: vec![first, second],
            timestamp: now,
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::PointerUp,
            pointers: vec![second, first],
            timestamp: now + Duration::from_millis(80),
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::Up,
            pointers: vec![first],
            timestamp: now + Duration::from_millis(90),
        });

        assert_eq!(fixture.view.zoom_level(), 9);
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_two_finger_tap_after_pan_still_zooms_out() {
        let mut fixture = fixture();
        let now = Instant::now();
        let first = TouchPointer {
            id: 0,
            position: Point::new(260.0, 200.0),
        };
        let second = TouchPointer {
            id: 1,
            position: Point::new(320.0, 200.0),
        };

        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, Point::new(200.0, 200.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Move, Point::new(260.0, 200.0), now));
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::PointerDown,
            pointers: vec![first, second],
            timestamp: now,
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::PointerUp,
            pointers: vec![second, first],
            timestamp: now + Duration::from_millis(50),
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::Up,
            pointers: vec![first],
            timestamp: now + Duration::from_millis(60),
        });

        assert_eq!(fixture.view.zoom_level(), 9);
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_up_without_down_is_ignored() {
        let mut fixture = fixture();
        let consumed = fixture.handler.on_touch_event(&event_at(
            TouchAction::Up,
            Point::new(10.0, 10.0),
            Instant::now(),
        ));

        assert!(!consumed);
        assert_eq!(fixture.view.zoom_level(), 10);
        assert!(fixture.view.snapshot().is_identity());
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_resets_gesture() {
        let mut fixture = fixture();
        let now = Instant::now();
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Down, Point::new(100.0, 100.0), now));
        fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Cancel, Point::new(100.0, 100.0), now));
        // the cancelled press never becomes a tap
        let consumed = fixture
            .handler
            .on_touch_event(&event_at(TouchAction::Up, Point::new(100.0, 100.0), now));

        assert!(!consumed);
        assert_eq!(fixture.taps.taps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pinch_scales_about_focus() {
        let mut fixture = fixture();
        let now = Instant::now();
        let first = TouchPointer {
            id: 0,
            position: Point::new(200.0, 256.0),
        };
        let second = TouchPointer {
            id: 1,
            position: Point::new(300.0, 256.0),
        };

        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::Down,
            pointers: vec![first],
            timestamp: now,
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::PointerDown,
            pointers: vec![first, second],
            timestamp: now,
        });
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::Move,
            pointers: vec![first, second],
            timestamp: now,
        });
        let spread = TouchPointer {
            id: 1,
            position: Point::new(400.0, 256.0),
        };
        fixture.handler.on_touch_event(&TouchEvent {
            action: TouchAction::Move,
            pointers: vec![first, spread],
            timestamp: now,
        });

        assert!((fixture.view.snapshot().scale - 2.0).abs() < 1e-9);
    }
}
