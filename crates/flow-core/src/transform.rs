//! Screen ↔ logical canvas coordinate transform.
//!
//! The canvas layer is translated by `(pan_x, pan_y)` in logical space and
//! then scaled by `scale` around the container origin:
//!
//! ```text
//! screen = (logical + pan) * scale + origin
//! logical = (screen - origin) / scale - pan
//! ```
//!
//! The inverse undoes the scale first and the translate second.

use crate::model::Point;
use serde::{Deserialize, Serialize};

/// Zoom range and button/wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.1,
        }
    }
}

impl ZoomLimits {
    /// Check that every field is finite and positive and `min <= max`.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.min) && positive(self.max) && positive(self.step)) {
            return Err(format!(
                "zoom limits must be finite and positive (min {}, max {}, step {})",
                self.min, self.max, self.step
            ));
        }
        if self.min > self.max {
            return Err(format!("zoom min {} is above max {}", self.min, self.max));
        }
        Ok(())
    }

    /// Clamp `scale` into the range. Inverted bounds are swapped and a NaN
    /// scale maps to 100%.
    pub fn clamp(&self, scale: f64) -> f64 {
        let (lo, hi) = if self.min > self.max {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        };
        let scale = if scale.is_nan() { 1.0 } else { scale };
        scale.max(lo).min(hi)
    }
}

/// Pan offset + zoom scale of the canvas layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: -2000.0,
            pan_y: -2000.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(pan_x: f64, pan_y: f64, scale: f64) -> Self {
        Self {
            pan_x,
            pan_y,
            scale,
        }
    }

    /// Convert a screen point into logical canvas space.
    ///
    /// `origin` is the on-screen top-left of the canvas container.
    pub fn to_logical(&self, origin: Point, screen: Point) -> Point {
        let x = (screen.x - origin.x) / self.scale;
        let y = (screen.y - origin.y) / self.scale;
        Point::new(x - self.pan_x, y - self.pan_y)
    }

    /// Convert a logical canvas point into screen space.
    pub fn to_screen(&self, origin: Point, logical: Point) -> Point {
        Point::new(
            (logical.x + self.pan_x) * self.scale + origin.x,
            (logical.y + self.pan_y) * self.scale + origin.y,
        )
    }

    /// Convert a screen-space delta into a logical-space delta.
    pub fn screen_delta_to_logical(&self, dx: f64, dy: f64) -> (f64, f64) {
        (dx / self.scale, dy / self.scale)
    }

    /// Pan by a screen-space delta (drag on empty canvas).
    pub fn pan_by_screen(&mut self, dx: f64, dy: f64) {
        let (lx, ly) = self.screen_delta_to_logical(dx, dy);
        self.pan_x += lx;
        self.pan_y += ly;
    }

    /// Add `delta` to the scale, clamped to `limits`. Returns `true` if it changed.
    pub fn zoom_by(&mut self, delta: f64, limits: &ZoomLimits) -> bool {
        self.set_scale(self.scale + delta, limits)
    }

    /// Set the scale, clamped to `limits`. Returns `true` if it changed.
    pub fn set_scale(&mut self, scale: f64, limits: &ZoomLimits) -> bool {
        let next = limits.clamp(scale);
        let changed = (next - self.scale).abs() > f64::EPSILON;
        self.scale = next;
        changed
    }

    /// Zoom percentage shown in the toolbar (`"120%"`).
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round() as i64)
    }
}
