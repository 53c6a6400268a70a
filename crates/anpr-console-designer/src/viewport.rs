//! Viewport transform for the zone canvas.
//!
//! Maps between screen pixels (pointer events) and world coordinates (zone
//! vertices). Rendering applies `translate(translation)` then `scale(scale)`:
//!
//! ```text
//! screen = world * scale + translation
//! world  = (screen - translation) / scale
//! ```
//!
//! The state only changes through [`ViewportTransform::pan_by`] and
//! [`ViewportTransform::zoom_at_point`] (plus seeding/reset), which keeps the
//! two directions exact inverses of each other.

use std::fmt;

use anpr_console_core::constants::{MAX_SCALE, MIN_SCALE, ZOOM_SENSITIVITY};

use crate::model::Point;

/// Zoom factor and pan offset of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    scale: f64,
    translation: Point,
}

impl ViewportTransform {
    /// Identity transform: scale 1, no pan.
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            translation: Point::ORIGIN,
        }
    }

    /// Seeds a transform from stored values. The scale is clamped into the
    /// zoom range and a non-finite value falls back to 1.
    pub fn from_parts(scale: f64, translation: Point) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        let translation = if translation.x.is_finite() && translation.y.is_finite() {
            translation
        } else {
            Point::ORIGIN
        };
        Self { scale, translation }
    }

    /// Current zoom factor, always within `[MIN_SCALE, MAX_SCALE]`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current pan offset in screen pixels.
    pub fn translation(&self) -> Point {
        self.translation
    }

    /// Converts a screen position to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        (screen - self.translation) / self.scale
    }

    /// Converts a world position to screen coordinates (the render transform).
    pub fn world_to_screen(&self, world: Point) -> Point {
        world * self.scale + self.translation
    }

    /// Zooms by a wheel delta while keeping the world point under `origin` fixed.
    ///
    /// Positive deltas (scrolling down) zoom out. Non-finite deltas are ignored.
    pub fn zoom_at_point(&mut self, wheel_delta: f64, origin: Point) {
        if !wheel_delta.is_finite() || !origin.x.is_finite() || !origin.y.is_finite() {
            return;
        }

        let scale_factor = 1.0 - wheel_delta * ZOOM_SENSITIVITY;
        let new_scale = (self.scale * scale_factor).clamp(MIN_SCALE, MAX_SCALE);

        // anchor computed with the pre-update scale
        let anchor = self.screen_to_world(origin);
        self.translation = origin - anchor * new_scale;
        self.scale = new_scale;
    }

    /// Pans by a raw screen-space delta. Unclamped.
    pub fn pan_by(&mut self, screen_delta: Point) {
        if screen_delta.x.is_finite() && screen_delta.y.is_finite() {
            self.translation = self.translation + screen_delta;
        }
    }

    /// Resets to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewportTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {:.2}x | Pan: ({:.1}, {:.1})",
            self.scale, self.translation.x, self.translation.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let vp = ViewportTransform::new();
        let p = Point::new(12.5, -3.0);
        assert_eq!(vp.screen_to_world(p), p);
        assert_eq!(vp.world_to_screen(p), p);
    }

    #[test]
    fn test_from_parts_clamps() {
        assert_eq!(ViewportTransform::from_parts(50.0, Point::ORIGIN).scale(), MAX_SCALE);
        assert_eq!(ViewportTransform::from_parts(0.01, Point::ORIGIN).scale(), MIN_SCALE);
        assert_eq!(ViewportTransform::from_parts(f64::NAN, Point::ORIGIN).scale(), 1.0);
    }

    #[test]
    fn test_zoom_in_with_negative_delta() {
        let mut vp = ViewportTransform::new();
        vp.zoom_at_point(-100.0, Point::new(50.0, 50.0));
        assert!((vp.scale() - 1.1).abs() < 1e-12);
        // the origin pixel still shows world (50, 50)
        let w = vp.screen_to_world(Point::new(50.0, 50.0));
        assert!((w.x - 50.0).abs() < 1e-9 && (w.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_delta_clamps_to_min() {
        let mut vp = ViewportTransform::new();
        vp.zoom_at_point(5000.0, Point::new(10.0, 10.0));
        assert_eq!(vp.scale(), MIN_SCALE);
    }

    #[test]
    fn test_nan_delta_ignored() {
        let mut vp = ViewportTransform::from_parts(2.0, Point::new(3.0, 4.0));
        let before = vp;
        vp.zoom_at_point(f64::NAN, Point::new(1.0, 1.0));
        assert_eq!(vp, before);
    }

    #[test]
    fn test_pan_is_screen_space() {
        let mut vp = ViewportTransform::from_parts(4.0, Point::ORIGIN);
        vp.pan_by(Point::new(8.0, -2.0));
        assert_eq!(vp.translation(), Point::new(8.0, -2.0));
    }

    #[test]
    fn test_display() {
        let vp = ViewportTransform::from_parts(1.5, Point::new(10.0, 20.0));
        assert_eq!(vp.to_string(), "Zoom: 1.50x | Pan: (10.0, 20.0)");
    }
}
