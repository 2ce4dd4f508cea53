#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or displacement) in screen, device, or stage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length when the point is read as a displacement.
    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Rotate around the origin by `angle` radians (clockwise on a y-down stage).
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { x: self.x * cos - self.y * sin, y: self.x * sin + self.y * cos }
    }

    /// Keep only the dominant axis. Ties keep x.
    #[must_use]
    pub fn constrain_to_axis(self) -> Self {
        if self.x.abs() >= self.y.abs() {
            Self { x: self.x, y: 0.0 }
        } else {
            Self { x: 0.0, y: self.y }
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point { x: self.x * rhs, y: self.y * rhs }
    }
}

/// Viewport transform from screen (CSS pixel) coordinates to the stage.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
/// `dpr` is the device pixel ratio between CSS pixels and raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub dpr: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0, dpr: 1.0 }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to stage coordinates.
    #[must_use]
    pub fn adjusted_position(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a screen-space displacement (CSS pixels) to a stage displacement.
    #[must_use]
    pub fn adjusted_scale(&self, delta: Point) -> Point {
        delta * (1.0 / self.zoom)
    }

    /// Convert a stage point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn stage_to_screen(&self, stage: Point) -> Point {
        Point {
            x: stage.x * self.zoom + self.pan_x,
            y: stage.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a stage point straight to raster (device pixel) coordinates.
    #[must_use]
    pub fn stage_to_device(&self, stage: Point) -> Point {
        self.stage_to_screen(stage) * self.dpr
    }

    /// Convert a screen-space point to raster (device pixel) coordinates.
    #[must_use]
    pub fn screen_to_device(&self, screen: Point) -> Point {
        screen * self.dpr
    }

    /// Convert a screen-space distance (pixels) to a stage distance.
    #[must_use]
    pub fn screen_dist_to_stage(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }
}
