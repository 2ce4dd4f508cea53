//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the selection engine. `Tool` and
//! `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying the snapshots needed to preview on pointer-move and
//! commit exactly once on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::ShapeId;
use crate::geom::Bounds;
use crate::gizmo::{DragSession, HandleId};
use crate::viewport::Point;

/// Which tool is currently active.
///
/// Only [`Tool::Select`] reacts to pointer input here; the drawing tools
/// are owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Draw a rectangle.
    Rect,
    /// Draw an ellipse.
    Ellipse,
    /// Create a text box.
    Text,
}

impl Tool {
    /// The single-key shortcut (no modifiers) that activates this tool.
    #[must_use]
    pub fn shortcut(self) -> &'static str {
        match self {
            Self::Select => "v",
            Self::Rect => "r",
            Self::Ellipse => "e",
            Self::Text => "t",
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Shift key is held.
    #[serde(default)]
    pub shift: bool,
    /// Ctrl key is held.
    #[serde(default)]
    pub ctrl: bool,
    /// Alt / Option key is held.
    #[serde(default)]
    pub alt: bool,
    /// Meta / Command key is held.
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    /// Whether the held keys extend the selection instead of replacing it.
    #[must_use]
    pub fn is_additive(self) -> bool {
        self.ctrl || self.shift
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"v"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// How a marquee rectangle decides which shapes it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarqueeMode {
    /// Select shapes whose bounds lie entirely inside the marquee.
    #[default]
    Containment,
    /// Select shapes whose bounds overlap the marquee.
    Intersection,
}

impl MarqueeMode {
    /// Whether a shape with `shape_bounds` is picked by a marquee spanning `marquee`.
    #[must_use]
    pub fn matches(self, marquee: &Bounds, shape_bounds: &Bounds) -> bool {
        match self {
            Self::Containment => marquee.contains(shape_bounds),
            Self::Intersection => marquee.intersects(shape_bounds),
        }
    }
}

impl std::str::FromStr for MarqueeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "containment" => Ok(Self::Containment),
            "intersection" => Ok(Self::Intersection),
            other => Err(format!("unknown marquee mode '{other}' (expected 'containment' or 'intersection')")),
        }
    }
}

/// Marquee rectangle tracked while dragging over the background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRectangle {
    /// Stage-space point where the drag started.
    pub start: Point,
    /// Stage-space pointer position; `None` until the first pointer-move.
    pub current: Option<Point>,
}

impl SelectionRectangle {
    #[must_use]
    pub fn new(start: Point) -> Self {
        Self { start, current: None }
    }

    /// The marquee box, or `None` if the pointer never moved.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.current.map(|current| Bounds::from_corners(self.start, current))
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Marquee overlay in stage space while a marquee drag is in progress.
    pub marquee: Option<Bounds>,
}

/// Internal state for the selection tool.
///
/// Each active variant carries gesture context needed to preview on
/// pointer-move and emit the final commit on pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A gizmo handle is being dragged; behavior lives in the session.
    HandleDrag {
        /// Handle grabbed at pointer-down.
        handle: HandleId,
        /// Role-specific drag session holding the pre-drag snapshot.
        session: DragSession,
    },
    /// Selected shapes are being moved together.
    ShapeDrag {
        /// Shape under the pointer at pointer-down.
        target: ShapeId,
        /// Whether `target` was already selected before pointer-down.
        was_selected: bool,
        /// Device-space pointer position at pointer-down.
        start_device: Point,
        /// Center of every selected shape at pointer-down.
        origins: Vec<(ShapeId, Point)>,
        /// Stage-space offset currently previewed; `None` until the first move.
        delta: Option<Point>,
    },
    /// A marquee rectangle is being dragged over the background.
    MarqueeSelect {
        rect: SelectionRectangle,
        /// Selection at pointer-down, before any clearing.
        before: Vec<ShapeId>,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::HandleDrag { .. } => "handle_drag",
            Self::ShapeDrag { .. } => "shape_drag",
            Self::MarqueeSelect { .. } => "marquee_select",
        }
    }
}
