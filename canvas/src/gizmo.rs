//! Gizmos: manipulation handles attached to the current selection.
//!
//! A [`GizmoSet`] is the table of active gizmos and their handles. It is
//! rebuilt from scratch whenever the selection changes, so handle ids are
//! never cached across selection changes. Handles refer back to their gizmo
//! by index into the table, never by ownership; gizmos refer to their
//! target shapes by id.
//!
//! Each handle role has its own drag session type implementing
//! [`HandleDrag`]. A session snapshots its targets at pointer-down and
//! recomputes their geometry from that snapshot on every pointer-move, so a
//! drag that returns to its start leaves the targets unchanged.

#[cfg(test)]
#[path = "gizmo_test.rs"]
mod gizmo_test;

use serde::{Deserialize, Serialize};

use crate::consts::{HANDLE_SIZE_PX, MIN_SHAPE_SIZE, ROTATE_HANDLE_OFFSET_PX, ROTATE_SNAP_RAD};
use crate::doc::{Scene, SceneError, Shape, ShapeId};
use crate::geom::Bounds;
use crate::input::Modifiers;
use crate::viewport::{Point, Viewport};

/// Geometry differences below this are treated as no change.
const GEOMETRY_EPSILON: f64 = 1e-9;

/// Unique identifier for a gizmo handle. Shares the shape id space, never collides with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleId(pub u32);

/// Corner of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomRight, Corner::BottomLeft];

    #[must_use]
    pub fn opposite(self) -> Corner {
        match self {
            Self::TopLeft => Self::BottomRight,
            Self::TopRight => Self::BottomLeft,
            Self::BottomRight => Self::TopLeft,
            Self::BottomLeft => Self::TopRight,
        }
    }

    /// Position of this corner on `bounds`.
    #[must_use]
    pub fn of(self, bounds: &Bounds) -> Point {
        match self {
            Self::TopLeft => bounds.min,
            Self::TopRight => Point::new(bounds.max.x, bounds.min.y),
            Self::BottomRight => bounds.max,
            Self::BottomLeft => Point::new(bounds.min.x, bounds.max.y),
        }
    }
}

/// What dragging a handle does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRole {
    /// Resize the targets, keeping the opposite corner fixed.
    Corner(Corner),
    /// Rotate the targets around the gizmo center.
    Rotate,
}

/// A hit-testable handle. `gizmo` indexes into [`GizmoSet::gizmos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GizmoHandle {
    pub id: HandleId,
    pub gizmo: usize,
    pub role: HandleRole,
}

/// Handle dimensions in screen pixels; converted to stage units per zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleMetrics {
    pub size_px: f64,
    pub rotate_offset_px: f64,
}

impl Default for HandleMetrics {
    fn default() -> Self {
        Self { size_px: HANDLE_SIZE_PX, rotate_offset_px: ROTATE_HANDLE_OFFSET_PX }
    }
}

/// Transform gizmo around a set of selected shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Gizmo {
    /// Shapes this gizmo acts on. Not owned.
    pub targets: Vec<ShapeId>,
    /// Union of the targets' stage-space bounds.
    pub bounds: Bounds,
    pub handles: Vec<HandleId>,
}

impl Gizmo {
    /// Stage-space center of the handle with `role`.
    #[must_use]
    pub fn handle_anchor(&self, role: HandleRole, viewport: &Viewport, metrics: &HandleMetrics) -> Point {
        match role {
            HandleRole::Corner(corner) => corner.of(&self.bounds),
            HandleRole::Rotate => Point::new(
                self.bounds.center().x,
                self.bounds.min.y - viewport.screen_dist_to_stage(metrics.rotate_offset_px),
            ),
        }
    }
}

/// Table of active gizmos and handles.
#[derive(Debug, Clone, Default)]
pub struct GizmoSet {
    gizmos: Vec<Gizmo>,
    handles: Vec<GizmoHandle>,
    metrics: HandleMetrics,
}

impl GizmoSet {
    #[must_use]
    pub fn new(metrics: HandleMetrics) -> Self {
        Self { gizmos: Vec::new(), handles: Vec::new(), metrics }
    }

    /// Discard every gizmo and build new ones for the current selection.
    ///
    /// Handles get fresh ids from the scene allocator.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IdSpaceExhausted`] if no ids remain; the set is left empty.
    pub fn rebuild(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        self.gizmos.clear();
        self.handles.clear();

        let targets = scene.selected_ids().to_vec();
        let Some(bounds) = union_bounds(scene, &targets) else {
            return Ok(());
        };

        let index = self.gizmos.len();
        let roles = Corner::ALL
            .iter()
            .map(|c| HandleRole::Corner(*c))
            .chain(std::iter::once(HandleRole::Rotate));
        let mut handles = Vec::new();
        for role in roles {
            let id = HandleId(scene.allocate_id()?);
            handles.push(GizmoHandle { id, gizmo: index, role });
        }

        self.gizmos.push(Gizmo { targets, bounds, handles: handles.iter().map(|h| h.id).collect() });
        self.handles.extend(handles);
        tracing::trace!(handles = self.handles.len(), "gizmos rebuilt");
        Ok(())
    }

    /// Recompute gizmo bounds after the targets' geometry changed. Handle ids are kept.
    pub fn refresh_bounds(&mut self, scene: &Scene) {
        for gizmo in &mut self.gizmos {
            if let Some(bounds) = union_bounds(scene, &gizmo.targets) {
                gizmo.bounds = bounds;
            }
        }
    }

    /// Look up a handle by a raw raster id.
    #[must_use]
    pub fn find_handle(&self, raw: u32) -> Option<&GizmoHandle> {
        self.handles.iter().find(|h| h.id.0 == raw)
    }

    #[must_use]
    pub fn gizmo(&self, index: usize) -> Option<&Gizmo> {
        self.gizmos.get(index)
    }

    #[must_use]
    pub fn gizmos(&self) -> &[Gizmo] {
        &self.gizmos
    }

    #[must_use]
    pub fn handles(&self) -> &[GizmoHandle] {
        &self.handles
    }

    #[must_use]
    pub fn metrics(&self) -> &HandleMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gizmos.is_empty()
    }

    /// Stage-space square covering `handle`, or `None` if its gizmo is gone.
    #[must_use]
    pub fn handle_outline(&self, handle: &GizmoHandle, viewport: &Viewport) -> Option<[Point; 4]> {
        let gizmo = self.gizmos.get(handle.gizmo)?;
        let c = gizmo.handle_anchor(handle.role, viewport, &self.metrics);
        let h = viewport.screen_dist_to_stage(self.metrics.size_px) * 0.5;
        Some([
            Point::new(c.x - h, c.y - h),
            Point::new(c.x + h, c.y - h),
            Point::new(c.x + h, c.y + h),
            Point::new(c.x - h, c.y + h),
        ])
    }

    /// Start a drag session for `handle`, snapshotting its gizmo's targets.
    #[must_use]
    pub fn begin_drag(&self, handle: HandleId, scene: &Scene, pointer: Point) -> Option<DragSession> {
        let handle = self.handles.iter().find(|h| h.id == handle)?;
        let gizmo = self.gizmos.get(handle.gizmo)?;
        let targets: Vec<TargetSnapshot> = gizmo
            .targets
            .iter()
            .filter_map(|id| scene.get(*id))
            .map(TargetSnapshot::of)
            .collect();
        if targets.is_empty() {
            return None;
        }
        let session = match handle.role {
            HandleRole::Corner(corner) => DragSession::Resize(ResizeDrag::new(corner, &gizmo.bounds, pointer, targets)),
            HandleRole::Rotate => DragSession::Rotate(RotateDrag::new(gizmo.bounds.center(), pointer, targets)),
        };
        Some(session)
    }
}

fn union_bounds(scene: &Scene, ids: &[ShapeId]) -> Option<Bounds> {
    ids.iter()
        .filter_map(|id| scene.get(*id))
        .map(Shape::bounds)
        .reduce(|a, b| a.union(&b))
}

// =============================================================
// Drag sessions
// =============================================================

/// Role-specific drag behavior for a grabbed handle.
pub trait HandleDrag {
    /// Preview the drag with the pointer at `pointer` (stage space).
    fn update(&mut self, scene: &mut Scene, pointer: Point, modifiers: Modifiers);

    /// Whether any target currently differs from its pre-drag snapshot.
    fn changed(&self, scene: &Scene) -> bool;
}

/// Pre-drag geometry of one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub id: ShapeId,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl TargetSnapshot {
    fn of(shape: &Shape) -> Self {
        Self { id: shape.id, center: shape.center, width: shape.width, height: shape.height, rotation: shape.rotation }
    }

    fn differs(&self, shape: &Shape) -> bool {
        (shape.center - self.center).magnitude() > GEOMETRY_EPSILON
            || (shape.width - self.width).abs() > GEOMETRY_EPSILON
            || (shape.height - self.height).abs() > GEOMETRY_EPSILON
            || (shape.rotation - self.rotation).abs() > GEOMETRY_EPSILON
    }
}

fn any_changed(targets: &[TargetSnapshot], scene: &Scene) -> bool {
    targets
        .iter()
        .any(|t| scene.get(t.id).is_some_and(|shape| t.differs(shape)))
}

/// Corner drag: scales the targets about the opposite corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeDrag {
    /// Opposite corner; stays in place.
    fixed: Point,
    /// Dragged corner at pointer-down.
    corner: Point,
    /// Pointer at pointer-down.
    grab: Point,
    /// Smallest scale factors that keep every target at least `MIN_SHAPE_SIZE`.
    min_scale: Point,
    targets: Vec<TargetSnapshot>,
}

impl ResizeDrag {
    fn new(corner: Corner, bounds: &Bounds, grab: Point, targets: Vec<TargetSnapshot>) -> Self {
        let mut min_scale = Point::new(f64::EPSILON, f64::EPSILON);
        for t in &targets {
            if t.width > 0.0 {
                min_scale.x = min_scale.x.max(MIN_SHAPE_SIZE / t.width);
            }
            if t.height > 0.0 {
                min_scale.y = min_scale.y.max(MIN_SHAPE_SIZE / t.height);
            }
        }
        Self { fixed: corner.opposite().of(bounds), corner: corner.of(bounds), grab, min_scale, targets }
    }
}

impl HandleDrag for ResizeDrag {
    fn update(&mut self, scene: &mut Scene, pointer: Point, modifiers: Modifiers) {
        let span = self.corner - self.fixed;
        let reach = self.corner + (pointer - self.grab) - self.fixed;
        let mut sx = if span.x.abs() > GEOMETRY_EPSILON { reach.x / span.x } else { 1.0 };
        let mut sy = if span.y.abs() > GEOMETRY_EPSILON { reach.y / span.y } else { 1.0 };
        if modifiers.shift {
            let uniform = sx.max(sy);
            sx = uniform;
            sy = uniform;
        }
        sx = sx.max(self.min_scale.x);
        sy = sy.max(self.min_scale.y);

        for t in &self.targets {
            let Some(shape) = scene.get_mut(t.id) else {
                continue;
            };
            shape.center = Point::new(
                self.fixed.x + (t.center.x - self.fixed.x) * sx,
                self.fixed.y + (t.center.y - self.fixed.y) * sy,
            );
            shape.width = t.width * sx;
            shape.height = t.height * sy;
        }
    }

    fn changed(&self, scene: &Scene) -> bool {
        any_changed(&self.targets, scene)
    }
}

/// Rotate drag: turns the targets around the gizmo center.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateDrag {
    pivot: Point,
    /// Pointer angle around `pivot` at pointer-down.
    start_angle: f64,
    targets: Vec<TargetSnapshot>,
}

impl RotateDrag {
    fn new(pivot: Point, grab: Point, targets: Vec<TargetSnapshot>) -> Self {
        let v = grab - pivot;
        Self { pivot, start_angle: v.y.atan2(v.x), targets }
    }
}

impl HandleDrag for RotateDrag {
    fn update(&mut self, scene: &mut Scene, pointer: Point, modifiers: Modifiers) {
        let v = pointer - self.pivot;
        let mut delta = v.y.atan2(v.x) - self.start_angle;
        if modifiers.shift {
            delta = (delta / ROTATE_SNAP_RAD).round() * ROTATE_SNAP_RAD;
        }

        for t in &self.targets {
            let Some(shape) = scene.get_mut(t.id) else {
                continue;
            };
            shape.center = self.pivot + (t.center - self.pivot).rotate(delta);
            shape.rotation = t.rotation + delta;
        }
    }

    fn changed(&self, scene: &Scene) -> bool {
        any_changed(&self.targets, scene)
    }
}

/// The drag session of whichever handle is grabbed.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSession {
    Resize(ResizeDrag),
    Rotate(RotateDrag),
}

impl DragSession {
    fn as_drag(&self) -> &dyn HandleDrag {
        match self {
            Self::Resize(d) => d,
            Self::Rotate(d) => d,
        }
    }

    fn as_drag_mut(&mut self) -> &mut dyn HandleDrag {
        match self {
            Self::Resize(d) => d,
            Self::Rotate(d) => d,
        }
    }
}

impl HandleDrag for DragSession {
    fn update(&mut self, scene: &mut Scene, pointer: Point, modifiers: Modifiers) {
        self.as_drag_mut().update(scene, pointer, modifiers);
    }

    fn changed(&self, scene: &Scene) -> bool {
        self.as_drag().changed(scene)
    }
}
