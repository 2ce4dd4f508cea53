#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::BACKGROUND_ID;
use crate::doc::{Scene, ShapeId};
use crate::gizmo::{GizmoSet, HandleId};

/// What a decoded raster id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A handle of an active gizmo.
    Handle(HandleId),
    /// A shape in the scene.
    Shape(ShapeId),
    /// Empty stage, or an id nothing owns any more.
    Background,
}

/// Resolve a raw raster id: handles first, then shapes, then background.
///
/// Stale ids (from a shape deleted since the last redraw, or handles from a
/// previous selection) fall through to [`HitTarget::Background`].
#[must_use]
pub fn resolve(raw: u32, scene: &Scene, gizmos: &GizmoSet) -> HitTarget {
    if raw == BACKGROUND_ID {
        return HitTarget::Background;
    }
    if let Some(handle) = gizmos.find_handle(raw) {
        return HitTarget::Handle(handle.id);
    }
    if let Some(id) = scene.shape_for_raw(raw) {
        return HitTarget::Shape(id);
    }
    HitTarget::Background
}
