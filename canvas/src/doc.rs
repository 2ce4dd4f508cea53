//! Scene model: shapes, identifier allocation, and the selection set.
//!
//! `Scene` owns every shape on the stage in draw order, together with the
//! ordered selection. A shape's `selected` flag is private and only written by
//! the `Scene` selection methods, which update the flag and the selection list
//! in the same call so the two can never disagree.
//!
//! Identifiers for shapes and gizmo handles come from one monotonic
//! [`IdAllocator`], which keeps the two id spaces disjoint and guarantees that
//! no id is ever reused while the raster could still hold its color.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

use crate::consts::{BACKGROUND_ID, ELLIPSE_SEGMENTS, MAX_ID};
use crate::geom::Bounds;
use crate::viewport::Point;

/// Unique identifier for a shape. Never zero, never above [`MAX_ID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

/// Errors raised while allocating or registering identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("identifier space exhausted (max {MAX_ID:#x})")]
    IdSpaceExhausted,
    #[error("identifier {0} is reserved or out of the 24-bit range")]
    InvalidId(u32),
    #[error("identifier {0} is already in use")]
    DuplicateId(u32),
}

/// Monotonic identifier source shared by shapes and gizmo handles.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: BACKGROUND_ID + 1 }
    }
}

impl IdAllocator {
    /// Hand out the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IdSpaceExhausted`] once every 24-bit id has been used.
    pub fn allocate(&mut self) -> Result<u32, SceneError> {
        if self.next > MAX_ID {
            tracing::warn!(max = MAX_ID, "identifier space exhausted");
            return Err(SceneError::IdSpaceExhausted);
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    /// Make sure an externally supplied id is never handed out again.
    pub fn reserve(&mut self, id: u32) {
        if id >= self.next {
            self.next = id.saturating_add(1);
        }
    }
}

/// A shape on the stage.
///
/// `outline` holds the boundary in unit space (both axes in `[-0.5, 0.5]`);
/// [`Shape::points`] scales it by the size and rotates it into local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    /// Geometric center in stage coordinates.
    pub center: Point,
    /// Width of the oriented bounding box, in stage units.
    pub width: f64,
    /// Height of the oriented bounding box, in stage units.
    pub height: f64,
    /// Clockwise rotation in radians around `center`.
    pub rotation: f64,
    pub outline: Vec<Point>,
    /// Editable text, present only on text-capable shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    selected: bool,
    /// Position in the selection order, 0 for the most recent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selection_rank: Option<usize>,
}

impl Shape {
    /// Build a shape from a unit-space outline.
    #[must_use]
    pub fn polygon(id: ShapeId, center: Point, width: f64, height: f64, outline: Vec<Point>) -> Self {
        Self { id, center, width, height, rotation: 0.0, outline, text: None, selected: false, selection_rank: None }
    }

    #[must_use]
    pub fn rect(id: ShapeId, center: Point, width: f64, height: f64) -> Self {
        let outline = vec![
            Point::new(-0.5, -0.5),
            Point::new(0.5, -0.5),
            Point::new(0.5, 0.5),
            Point::new(-0.5, 0.5),
        ];
        Self::polygon(id, center, width, height, outline)
    }

    #[must_use]
    pub fn ellipse(id: ShapeId, center: Point, width: f64, height: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let outline = (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / ELLIPSE_SEGMENTS as f64;
                Point::new(0.5 * t.cos(), 0.5 * t.sin())
            })
            .collect();
        Self::polygon(id, center, width, height, outline)
    }

    /// A rectangle carrying editable text.
    #[must_use]
    pub fn text(id: ShapeId, center: Point, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::rect(id, center, width, height) }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn selected(&self) -> bool {
        self.selected
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// Boundary points relative to `center`, scaled and rotated.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        self.outline
            .iter()
            .map(|p| Point::new(p.x * self.width, p.y * self.height).rotate(self.rotation))
            .collect()
    }

    /// Boundary points in stage coordinates.
    #[must_use]
    pub fn stage_points(&self) -> Vec<Point> {
        self.points().into_iter().map(|p| p + self.center).collect()
    }

    /// Axis-aligned box around the stage-space boundary.
    ///
    /// A shape without an outline collapses to its center.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.stage_points()).unwrap_or(Bounds { min: self.center, max: self.center })
    }
}

/// Ordered shape collection plus the selection set.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    shapes: Vec<Shape>,
    /// Selected ids, most recently selected first.
    selection: Vec<ShapeId>,
    ids: IdAllocator,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a raw identifier from the shared shape/handle id space.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IdSpaceExhausted`] when no ids remain.
    pub fn allocate_id(&mut self) -> Result<u32, SceneError> {
        self.ids.allocate()
    }

    /// Allocate an id for a shape that is about to be inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::IdSpaceExhausted`] when no ids remain.
    pub fn next_shape_id(&mut self) -> Result<ShapeId, SceneError> {
        self.ids.allocate().map(ShapeId)
    }

    /// Append a shape on top of the draw order.
    ///
    /// A shape arriving already flagged as selected joins the selection.
    ///
    /// # Errors
    ///
    /// Rejects id 0, ids beyond 24 bits, and ids already present.
    pub fn insert(&mut self, mut shape: Shape) -> Result<ShapeId, SceneError> {
        let id = shape.id;
        if id.0 == BACKGROUND_ID || id.0 > MAX_ID {
            return Err(SceneError::InvalidId(id.0));
        }
        if self.contains(id) {
            return Err(SceneError::DuplicateId(id.0));
        }
        self.ids.reserve(id.0);
        let selected = shape.selected;
        shape.selected = false;
        shape.selection_rank = None;
        self.shapes.push(shape);
        if selected {
            self.select(id);
        }
        Ok(id)
    }

    /// Remove a shape, dropping it from the selection.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        self.selection.retain(|s| *s != id);
        let mut shape = self.shapes.remove(index);
        shape.selected = false;
        shape.selection_rank = None;
        self.sync_ranks();
        Some(shape)
    }

    /// Replace every shape with a snapshot. Selection is rebuilt from the
    /// snapshot's flags in the recorded selection order; flagged shapes
    /// without a rank follow the ranked ones. Ids stay reserved so they are
    /// never reissued.
    ///
    /// # Errors
    ///
    /// Fails on invalid or duplicate ids; the scene is left empty in that case.
    pub fn load_snapshot(&mut self, shapes: Vec<Shape>) -> Result<(), SceneError> {
        self.shapes.clear();
        self.selection.clear();
        let mut ranked = Vec::new();
        for shape in shapes {
            let rank = shape.selection_rank.filter(|_| shape.selected);
            match self.insert(shape) {
                Ok(id) => ranked.extend(rank.map(|r| (r, id))),
                Err(e) => {
                    self.shapes.clear();
                    self.selection.clear();
                    return Err(e);
                }
            }
        }
        // Selecting moves to the front, so walk from the oldest rank down.
        ranked.sort_by_key(|(rank, _)| std::cmp::Reverse(*rank));
        for (_, id) in ranked {
            self.select(id);
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Mutable access for geometry edits. Selection is not writable through it.
    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Resolve a raw raster id to a shape id, if a shape owns it.
    #[must_use]
    pub fn shape_for_raw(&self, raw: u32) -> Option<ShapeId> {
        let id = ShapeId(raw);
        self.contains(id).then_some(id)
    }

    /// All shapes in draw order (bottom first).
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Selected shapes, most recently selected first.
    #[must_use]
    pub fn selected_shapes(&self) -> Vec<&Shape> {
        self.selection.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Selected ids, most recently selected first.
    #[must_use]
    pub fn selected_ids(&self) -> &[ShapeId] {
        &self.selection
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Mark a shape selected and move it to the front of the selection order.
    ///
    /// Returns `true` if the selection set changed.
    pub fn select(&mut self, id: ShapeId) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let was_selected = shape.selected;
        shape.selected = true;
        self.selection.retain(|s| *s != id);
        self.selection.insert(0, id);
        self.sync_ranks();
        !was_selected
    }

    /// Returns `true` if the shape was selected.
    pub fn unselect(&mut self, id: ShapeId) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let was_selected = shape.selected;
        shape.selected = false;
        shape.selection_rank = None;
        self.selection.retain(|s| *s != id);
        self.sync_ranks();
        was_selected
    }

    /// Returns `true` if anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.selection.is_empty();
        for shape in &mut self.shapes {
            shape.selected = false;
            shape.selection_rank = None;
        }
        self.selection.clear();
        changed
    }

    /// Copy the selection order onto the shapes so snapshots carry it.
    fn sync_ranks(&mut self) {
        for (rank, id) in self.selection.iter().enumerate() {
            if let Some(shape) = self.shapes.iter_mut().find(|s| s.id == *id) {
                shape.selection_rank = Some(rank);
            }
        }
    }

    /// Number of shapes on the stage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
