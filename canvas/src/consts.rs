//! Shared numeric constants for the canvas crate.

// ── Identity raster ─────────────────────────────────────────────

/// Identifier decoded from background pixels. Never allocated.
pub const BACKGROUND_ID: u32 = 0;

/// Largest identifier that fits in the 24 RGB bits of a raster pixel.
pub const MAX_ID: u32 = 0x00FF_FFFF;

// ── Gizmo ───────────────────────────────────────────────────────

/// Side length of a square gizmo handle, in screen pixels.
pub const HANDLE_SIZE_PX: f64 = 10.0;

/// Distance from the top of the gizmo bounds to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

/// Shapes are never resized below this width or height, in stage units.
pub const MIN_SHAPE_SIZE: f64 = 1.0;

/// Rotation snap step when shift is held during a rotate drag (15°).
pub const ROTATE_SNAP_RAD: f64 = std::f64::consts::PI / 12.0;

// ── Shapes ──────────────────────────────────────────────────────

/// Number of outline segments used to approximate an ellipse.
pub const ELLIPSE_SEGMENTS: usize = 32;
