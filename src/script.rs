//! Scene and gesture files for the replay CLI, and the replay loop itself.
//!
//! A scene file lists shapes in draw order plus an optional initial
//! selection. A gesture script is a JSON array of pointer, key, and tool
//! events fed to [`EngineCore`] in order.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use canvas::doc::{SceneError, Shape, ShapeId};
use canvas::engine::{Action, EngineCore};
use canvas::history::{HistorySink, forward_commits};
use canvas::hit::HitTarget;
use canvas::input::{Button, Key, Modifiers, Tool};
use canvas::selection_metrics::PropertySummary;
use canvas::viewport::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rect,
    Ellipse,
    Text,
}

/// One shape as written in a scene file. Rotation is in degrees.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeSpec {
    pub id: ShapeId,
    #[serde(default)]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default)]
    pub text: Option<String>,
}

impl ShapeSpec {
    #[must_use]
    pub fn to_shape(&self) -> Shape {
        let center = Point::new(self.x, self.y);
        let shape = match self.kind {
            ShapeKind::Rect => Shape::rect(self.id, center, self.width, self.height),
            ShapeKind::Ellipse => Shape::ellipse(self.id, center, self.width, self.height),
            ShapeKind::Text => Shape::text(self.id, center, self.width, self.height, self.text.clone().unwrap_or_default()),
        };
        shape.with_rotation(self.rotation_deg.to_radians())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneFile {
    pub shapes: Vec<ShapeSpec>,
    /// Initially selected ids; the last one listed becomes the most recent.
    #[serde(default)]
    pub selection: Vec<ShapeId>,
}

impl SceneFile {
    /// Load this scene into `core`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Fails on invalid or duplicate shape ids.
    pub fn load_into(&self, core: &mut EngineCore) -> Result<(), SceneError> {
        core.load_snapshot(self.shapes.iter().map(ShapeSpec::to_shape).collect())?;
        core.set_selection(&self.selection);
        Ok(())
    }
}

/// One scripted input event, in screen (CSS pixel) coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Gesture {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Tool {
        tool: Tool,
    },
}

/// Final state of a shape after a replay. Rotation is in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeReport {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
    pub selected: bool,
}

impl From<&Shape> for ShapeReport {
    fn from(shape: &Shape) -> Self {
        Self {
            id: shape.id,
            x: shape.center.x,
            y: shape.center.y,
            width: shape.width,
            height: shape.height,
            rotation_deg: shape.rotation.to_degrees(),
            selected: shape.selected(),
        }
    }
}

/// Outcome of a replay, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub commits: usize,
    pub edit_requests: Vec<ShapeId>,
    pub selection: Vec<ShapeId>,
    pub summary: PropertySummary,
    pub shapes: Vec<ShapeReport>,
}

/// Feed `gestures` to `core` in order, forwarding every commit to `sink`.
pub fn replay<S>(core: &mut EngineCore, gestures: &[Gesture], sink: &mut S) -> ReplayReport
where
    S: HistorySink + ?Sized,
{
    let mut commits = 0;
    let mut edit_requests = Vec::new();
    for gesture in gestures {
        let actions = apply(core, gesture);
        commits += forward_commits(&actions, sink);
        edit_requests.extend(actions.iter().filter_map(|a| match a {
            Action::EditTextRequested { id, .. } => Some(*id),
            _ => None,
        }));
    }
    tracing::info!(events = gestures.len(), commits, "replay finished");

    ReplayReport {
        commits,
        edit_requests,
        selection: core.selection().to_vec(),
        summary: core.summary(),
        shapes: core.scene.shapes().iter().map(ShapeReport::from).collect(),
    }
}

fn apply(core: &mut EngineCore, gesture: &Gesture) -> Vec<Action> {
    match gesture {
        Gesture::Down { x, y, button, modifiers } => core.on_pointer_down(Point::new(*x, *y), *button, *modifiers),
        Gesture::Move { x, y, modifiers } => core.on_pointer_move(Point::new(*x, *y), *modifiers),
        Gesture::Up { x, y, button, modifiers } => core.on_pointer_up(Point::new(*x, *y), *button, *modifiers),
        Gesture::Key { key, modifiers } => core.on_key_down(&Key(key.clone()), *modifiers),
        Gesture::Tool { tool } => {
            core.set_tool(*tool);
            Vec::new()
        }
    }
}

/// What lies under a screen point, as printed by `pick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "id", rename_all = "lowercase")]
pub enum PickReport {
    Handle(u32),
    Shape(u32),
    Background,
}

impl From<HitTarget> for PickReport {
    fn from(target: HitTarget) -> Self {
        match target {
            HitTarget::Handle(id) => Self::Handle(id.0),
            HitTarget::Shape(id) => Self::Shape(id.0),
            HitTarget::Background => Self::Background,
        }
    }
}
