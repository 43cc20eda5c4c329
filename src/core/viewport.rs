//! Shared view state written by the input thread and read by render threads.
//!
//! The working transform is an immutable [`Transform`] value behind a mutex;
//! readers take a copy via [`MapViewState::snapshot`], so an in-flight tile
//! render always observes one consistent transform, never a torn read. A
//! slightly stale transform is acceptable because the next frame corrects it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::constants::ZOOM_MAX;
use crate::core::geo::{
    latitude_to_pixel_y, longitude_to_pixel_x, pixel_x_to_longitude, pixel_y_to_latitude, LatLng,
    Point,
};

/// A pixel-space view transform: translation plus scale about a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation in pixels
    pub translate: Point,
    /// Scale factor (1.0 = no scaling)
    pub scale: f64,
    /// The screen point the scale is anchored to
    pub pivot: Point,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Point::new(0.0, 0.0),
            scale: 1.0,
            pivot: Point::new(0.0, 0.0),
        }
    }
}

impl Transform {
    /// Identity transform (no change)
    pub fn identity() -> Self {
        Self::default()
    }

    /// Check if this is effectively an identity transform
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < 0.001
            && self.translate.x.abs() < 0.1
            && self.translate.y.abs() < 0.1
    }

    /// Returns this transform shifted by the given pixel delta.
    pub fn translated(&self, dx: f64, dy: f64) -> Transform {
        Transform {
            translate: Point::new(self.translate.x + dx, self.translate.y + dy),
            ..*self
        }
    }

    /// Returns this transform composed with a scale about `pivot`.
    pub fn scaled_around(&self, factor: f64, pivot: Point) -> Transform {
        // For t(x) = s*x + d, scaling about p yields s' = f*s and
        // d' = p + f*(d - p).
        Transform {
            translate: Point::new(
                pivot.x + factor * (self.translate.x - pivot.x),
                pivot.y + factor * (self.translate.y - pivot.y),
            ),
            scale: self.scale * factor,
            pivot,
        }
    }
}

struct ViewInner {
    transform: Transform,
    center: LatLng,
    zoom: u8,
}

/// The live view of the map: geographic center, zoom level, screen size and
/// the working pixel transform applied on top of the last rendered tile set.
///
/// All mutators are O(1) bookkeeping; none of them block on anything other
/// than the internal mutex, which is held only for the duration of a field
/// update.
pub struct MapViewState {
    inner: Mutex<ViewInner>,
    screen_size: Mutex<Point>,
    redraw_generation: AtomicU64,
    min_zoom: u8,
    max_zoom: u8,
}

impl MapViewState {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            inner: Mutex::new(ViewInner {
                transform: Transform::identity(),
                center,
                zoom,
            }),
            screen_size: Mutex::new(Point::new(0.0, 0.0)),
            redraw_generation: AtomicU64::new(0),
            min_zoom: 0,
            max_zoom: ZOOM_MAX,
        }
    }

    /// Restricts the zoom range accepted by [`MapViewState::zoom_by`].
    pub fn with_zoom_bounds(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// A consistent copy of the current working transform.
    pub fn snapshot(&self) -> Transform {
        self.inner.lock().expect("view state poisoned").transform
    }

    pub fn center(&self) -> LatLng {
        self.inner.lock().expect("view state poisoned").center
    }

    pub fn zoom_level(&self) -> u8 {
        self.inner.lock().expect("view state poisoned").zoom
    }

    pub fn set_screen_size(&self, width: f64, height: f64) {
        *self.screen_size.lock().expect("view state poisoned") = Point::new(width, height);
    }

    pub fn screen_size(&self) -> Point {
        *self.screen_size.lock().expect("view state poisoned")
    }

    /// Pans the view by a pixel delta: shifts the working transform and the
    /// geographic center together.
    pub fn translate(&self, dx: f64, dy: f64) {
        let mut inner = self.inner.lock().expect("view state poisoned");
        inner.transform = inner.transform.translated(dx, dy);

        let zoom = inner.zoom;
        let px = longitude_to_pixel_x(inner.center.lng, zoom) - dx;
        let py = latitude_to_pixel_y(inner.center.lat, zoom) - dy;
        inner.center = LatLng::new(
            LatLng::clamp_lat(pixel_y_to_latitude(py, zoom)),
            LatLng::wrap_lng(pixel_x_to_longitude(px, zoom)),
        );
    }

    /// Applies an incremental scale about a screen pivot to the working
    /// transform. Used by the zoom animator and the pinch tracker.
    pub fn scale_around(&self, factor: f64, pivot: Point) {
        let mut inner = self.inner.lock().expect("view state poisoned");
        inner.transform = inner.transform.scaled_around(factor, pivot);
    }

    pub fn set_center(&self, center: LatLng) {
        self.inner.lock().expect("view state poisoned").center = center;
    }

    /// Changes the zoom level by `step`, clamped to the configured bounds.
    /// Returns false (and changes nothing) when the step would leave them.
    pub fn zoom_by(&self, step: i8) -> bool {
        let mut inner = self.inner.lock().expect("view state poisoned");
        let target = inner.zoom as i16 + step as i16;
        if target < self.min_zoom as i16 || target > self.max_zoom as i16 {
            return false;
        }
        inner.zoom = target as u8;
        true
    }

    /// Resets the working transform once tiles have been re-rendered at the
    /// current zoom level.
    pub fn reset_transform(&self) {
        self.inner.lock().expect("view state poisoned").transform = Transform::identity();
    }

    /// Converts a screen pixel position to a geographic coordinate, assuming
    /// the geographic center sits at the screen center.
    pub fn from_screen_pixels(&self, position: Point) -> LatLng {
        let size = self.screen_size();
        let inner = self.inner.lock().expect("view state poisoned");
        let zoom = inner.zoom;
        let px = longitude_to_pixel_x(inner.center.lng, zoom) + position.x - size.x / 2.0;
        let py = latitude_to_pixel_y(inner.center.lat, zoom) + position.y - size.y / 2.0;
        LatLng::new(
            LatLng::clamp_lat(pixel_y_to_latitude(py, zoom)),
            LatLng::wrap_lng(pixel_x_to_longitude(px, zoom)),
        )
    }

    /// Requests a tile redraw by bumping the redraw generation. The render
    /// side polls [`MapViewState::redraw_generation`] to pick up the change.
    pub fn request_redraw(&self) {
        self.redraw_generation.fetch_add(1, Ordering::Release);
    }

    pub fn redraw_generation(&self) -> u64 {
        self.redraw_generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_compose_scale() {
        let t = Transform::identity().scaled_around(2.0, Point::new(128.0, 128.0));
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.translate, Point::new(-128.0, -128.0));

        // Scaling back about the same pivot restores identity.
        let back = t.scaled_around(0.5, Point::new(128.0, 128.0));
        assert!(back.is_identity());
    }

    #[test]
    fn test_translate_moves_center_opposite() {
        let view = MapViewState::new(LatLng::new(0.0, 0.0), 8);
        // Dragging the map east (positive dx) moves the center west.
        view.translate(100.0, 0.0);
        assert!(view.center().lng < 0.0);
        assert_eq!(view.snapshot().translate, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_zoom_bounds() {
        let view = MapViewState::new(LatLng::default(), 8).with_zoom_bounds(2, 10);
        assert!(view.zoom_by(2));
        assert_eq!(view.zoom_level(), 10);
        assert!(!view.zoom_by(1));
        assert_eq!(view.zoom_level(), 10);
        assert!(view.zoom_by(-8));
        assert!(!view.zoom_by(-1));
    }

    #[test]
    fn test_redraw_generation_monotonic() {
        let view = MapViewState::new(LatLng::default(), 8);
        let before = view.redraw_generation();
        view.request_redraw();
        view.request_redraw();
        assert_eq!(view.redraw_generation(), before + 2);
    }
}
