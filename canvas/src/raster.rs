//! Identity raster: an off-screen id buffer used for O(1) hit-testing.
//!
//! Every shape, then every gizmo handle, is filled with a flat color that
//! encodes its 24-bit id (`r << 16 | g << 8 | b`). There is no anti-aliasing,
//! stroke, or blending: a pixel is covered when its center lies inside the
//! outline (even-odd rule), and later fills overwrite earlier ones. Decoding a
//! pointer position is a single buffer read.
//!
//! The buffer is sized in device pixels (CSS size × device pixel ratio). It is
//! only redrawn when marked dirty; the engine marks it dirty on scene,
//! selection, and viewport changes and redraws before the next decode.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use crate::consts::BACKGROUND_ID;
use crate::doc::Scene;
use crate::geom::{Bounds, polygon_contains};
use crate::gizmo::GizmoSet;
use crate::viewport::{Point, Viewport};

/// Color an id is drawn with. Alpha is always opaque.
#[must_use]
pub fn encode_id(id: u32) -> [u8; 4] {
    let [_, r, g, b] = id.to_be_bytes();
    [r, g, b, 0xFF]
}

/// Id encoded by a pixel; transparent background decodes to 0.
#[must_use]
pub fn decode_pixel(pixel: [u8; 4]) -> u32 {
    let [r, g, b, _] = pixel;
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Off-screen RGBA buffer holding one id per device pixel.
#[derive(Debug, Clone)]
pub struct IdentityRaster {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
    dirty: bool,
}

impl Default for IdentityRaster {
    fn default() -> Self {
        Self { width: 0, height: 0, pixels: Vec::new(), dirty: true }
    }
}

impl IdentityRaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the buffer to a viewport of `width_css` × `height_css` at `dpr`.
    ///
    /// Marks the raster dirty when the device size changes.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resize(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        let width = (width_css * dpr).ceil().max(0.0) as usize;
        let height = (height_css * dpr).ceil().max(0.0) as usize;
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0; 4]; width * height];
        self.dirty = true;
    }

    /// Buffer width in device pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in device pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Redraw only if something changed since the last redraw. Returns whether it redrew.
    pub fn redraw_if_dirty(&mut self, scene: &Scene, gizmos: &GizmoSet, viewport: &Viewport) -> bool {
        if !self.dirty {
            return false;
        }
        self.redraw(scene, gizmos, viewport);
        true
    }

    /// Clear and fill every shape in draw order, then every gizmo handle on top.
    pub fn redraw(&mut self, scene: &Scene, gizmos: &GizmoSet, viewport: &Viewport) {
        self.pixels.fill([0; 4]);

        for shape in scene.shapes() {
            let device: Vec<Point> = shape
                .stage_points()
                .into_iter()
                .map(|p| viewport.stage_to_device(p))
                .collect();
            self.fill_polygon(&device, shape.id.0);
        }

        for handle in gizmos.handles() {
            let Some(outline) = gizmos.handle_outline(handle, viewport) else {
                continue;
            };
            let device = outline.map(|p| viewport.stage_to_device(p));
            self.fill_polygon(&device, handle.id.0);
        }

        self.dirty = false;
        tracing::trace!(
            width = self.width,
            height = self.height,
            shapes = scene.len(),
            handles = gizmos.handles().len(),
            "identity raster redrawn"
        );
    }

    /// Fill a device-space polygon with the color of `id`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn fill_polygon(&mut self, device: &[Point], id: u32) {
        let Some(bounds) = Bounds::from_points(device.iter().copied()) else {
            return;
        };
        let x0 = bounds.min.x.floor().max(0.0) as usize;
        let y0 = bounds.min.y.floor().max(0.0) as usize;
        let x1 = (bounds.max.x.ceil().max(0.0) as usize).min(self.width);
        let y1 = (bounds.max.y.ceil().max(0.0) as usize).min(self.height);
        let color = encode_id(id);

        for y in y0..y1 {
            let row = y * self.width;
            for x in x0..x1 {
                let sample = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if polygon_contains(device, sample) {
                    self.pixels[row + x] = color;
                }
            }
        }
    }

    /// Pixel at device coordinates, or `None` outside the buffer.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Id under a screen-space (CSS pixel) point, or 0 for background.
    ///
    /// The point is scaled by the device pixel ratio before indexing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn decode(&self, screen: Point, viewport: &Viewport) -> u32 {
        let device = viewport.screen_to_device(screen);
        if !(device.x >= 0.0 && device.y >= 0.0) {
            return BACKGROUND_ID;
        }
        self.pixel(device.x.floor() as usize, device.y.floor() as usize)
            .map_or(BACKGROUND_ID, decode_pixel)
    }
}
