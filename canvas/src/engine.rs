use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::doc::{Scene, SceneError, Shape, ShapeId};
use crate::gizmo::{GizmoSet, HandleDrag, HandleId, HandleMetrics};
use crate::hit::{self, HitTarget};
use crate::input::{Button, InputState, Key, MarqueeMode, Modifiers, SelectionRectangle, Tool, UiState};
use crate::raster::IdentityRaster;
use crate::render;
use crate::selection_metrics::PropertySummary;
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A mutation was committed; `shapes` is the full scene after it.
    /// Forward to the history sink.
    Commit { shapes: Vec<Shape> },
    /// Second click on an already-selected text shape without a drag.
    EditTextRequested { id: ShapeId, point: Point },
    /// Overlay state changed; the host should call `Engine::render`.
    RenderNeeded,
    /// The active tool changed from a keyboard shortcut.
    ToolChanged(Tool),
}

/// Engine settings the host may override.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How a marquee decides which shapes it picks.
    pub marquee_mode: MarqueeMode,
    /// Gizmo handle dimensions.
    pub handles: HandleMetrics,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub scene: Scene,
    pub gizmos: GizmoSet,
    pub raster: IdentityRaster,
    pub viewport: Viewport,
    pub ui: UiState,
    pub input: InputState,
    pub config: EngineConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            scene: Scene::new(),
            gizmos: GizmoSet::new(config.handles),
            raster: IdentityRaster::new(),
            viewport: Viewport::default(),
            ui: UiState::default(),
            input: InputState::default(),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    // --- Data inputs ---

    /// Replace the scene with a snapshot (initial load, undo, redo).
    ///
    /// Any gesture in progress is abandoned.
    ///
    /// # Errors
    ///
    /// Fails on invalid or duplicate ids; the scene is left empty.
    pub fn load_snapshot(&mut self, shapes: Vec<Shape>) -> Result<(), SceneError> {
        self.input = InputState::Idle;
        self.ui.marquee = None;
        let loaded = self.scene.load_snapshot(shapes);
        self.selection_changed();
        loaded
    }

    /// Add a shape created by the host (drawing tools, remote peers).
    ///
    /// # Errors
    ///
    /// Rejects reserved, out-of-range, and duplicate ids.
    pub fn apply_create(&mut self, shape: Shape) -> Result<ShapeId, SceneError> {
        let joins_selection = shape.selected();
        let id = self.scene.insert(shape)?;
        if joins_selection {
            self.selection_changed();
        } else {
            self.raster.mark_dirty();
        }
        Ok(id)
    }

    /// Remove a shape. Returns `false` if it did not exist.
    pub fn apply_delete(&mut self, id: ShapeId) -> bool {
        let selected_before = self.scene.selected_ids().len();
        if self.scene.remove(id).is_none() {
            return false;
        }
        if self.scene.selected_ids().len() != selected_before {
            self.selection_changed();
        } else {
            self.raster.mark_dirty();
        }
        true
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.viewport.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        self.raster.resize(width_css, height_css, self.viewport.dpr);
        self.raster.mark_dirty();
    }

    /// Update pan (CSS pixels) and zoom.
    pub fn set_camera(&mut self, pan_x: f64, pan_y: f64, zoom: f64) {
        self.viewport.pan_x = pan_x;
        self.viewport.pan_y = pan_y;
        if zoom > 0.0 {
            self.viewport.zoom = zoom;
        }
        self.raster.mark_dirty();
    }

    /// Set the active tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.ui.tool = tool;
    }

    /// Replace the selection from the host (layer panel, scripted setup).
    ///
    /// Ids are selected in order, so the last one ends up first. Unknown ids
    /// are skipped. Nothing is committed. Returns whether the selection changed.
    pub fn set_selection(&mut self, ids: &[ShapeId]) -> bool {
        let before = self.scene.selected_ids().to_vec();
        self.scene.clear_selection();
        for id in ids {
            self.scene.select(*id);
        }
        if self.scene.selected_ids() == before.as_slice() {
            return false;
        }
        self.selection_changed();
        true
    }

    // --- Queries ---

    /// Selected ids, most recently selected first.
    #[must_use]
    pub fn selection(&self) -> &[ShapeId] {
        self.scene.selected_ids()
    }

    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.scene.get(id)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Values for the properties panel.
    #[must_use]
    pub fn summary(&self) -> PropertySummary {
        PropertySummary::of_selection(&self.scene, self.viewport_width, self.viewport_height)
    }

    /// Resolve what lies under a screen point, redrawing the raster first if needed.
    pub fn pick(&mut self, screen: Point) -> HitTarget {
        self.raster.redraw_if_dirty(&self.scene, &self.gizmos, &self.viewport);
        let raw = self.raster.decode(screen, &self.viewport);
        hit::resolve(raw, &self.scene, &self.gizmos)
    }

    // --- Keyboard ---

    /// The select shortcut (no modifiers) reactivates the select tool.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let shortcut = Tool::Select.shortcut();
        if !modifiers.is_empty() || !key.0.eq_ignore_ascii_case(shortcut) || self.ui.tool == Tool::Select {
            return Vec::new();
        }
        self.ui.tool = Tool::Select;
        tracing::debug!(tool = ?Tool::Select, "tool changed from shortcut");
        vec![Action::ToolChanged(Tool::Select), Action::RenderNeeded]
    }

    // --- Pointer ---

    /// Start a gesture. Only the primary button with the select tool does anything.
    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || self.ui.tool != Tool::Select || !self.input.is_idle() {
            return Vec::new();
        }
        let stage = self.viewport.adjusted_position(screen);
        let actions = match self.pick(screen) {
            HitTarget::Handle(handle) => self.begin_handle_drag(handle, stage, modifiers),
            HitTarget::Shape(id) => self.begin_shape_drag(id, screen, modifiers),
            HitTarget::Background => self.begin_marquee(stage, modifiers),
        };
        tracing::debug!(state = self.input.name(), x = stage.x, y = stage.y, "pointer down");
        actions
    }

    /// Preview the active gesture. Nothing is committed here.
    pub fn on_pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> Vec<Action> {
        let stage = self.viewport.adjusted_position(screen);
        let mut input = std::mem::take(&mut self.input);
        let actions = match &mut input {
            InputState::Idle => Vec::new(),
            InputState::HandleDrag { session, .. } => {
                session.update(&mut self.scene, stage, modifiers);
                self.geometry_changed();
                vec![Action::RenderNeeded]
            }
            InputState::ShapeDrag { start_device, origins, delta, .. } => {
                let d = self.drag_delta(*start_device, screen, modifiers);
                self.offset_shapes(origins, d);
                *delta = Some(d);
                vec![Action::RenderNeeded]
            }
            InputState::MarqueeSelect { rect, .. } => {
                rect.current = Some(stage);
                self.ui.marquee = rect.bounds();
                vec![Action::RenderNeeded]
            }
        };
        self.input = input;
        actions
    }

    /// Finish the active gesture, committing at most once.
    pub fn on_pointer_up(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let stage = self.viewport.adjusted_position(screen);
        let input = std::mem::take(&mut self.input);
        let state = input.name();
        let actions = match input {
            InputState::Idle => Vec::new(),
            InputState::HandleDrag { handle, session } => {
                tracing::debug!(handle = handle.0, "handle drag released");
                if session.changed(&self.scene) {
                    self.geometry_changed();
                    vec![self.commit(), Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::ShapeDrag { target, was_selected, origins, delta, .. } => match delta {
                Some(d) if d != Point::default() => {
                    self.offset_shapes(&origins, d);
                    vec![self.commit(), Action::RenderNeeded]
                }
                // Moved, but came back to the start.
                Some(_) => Vec::new(),
                None if was_selected => self.click(target, stage, modifiers),
                None => Vec::new(),
            },
            InputState::MarqueeSelect { rect, before } => self.finish_marquee(&rect, &before),
        };
        tracing::debug!(from = state, commits = count_commits(&actions), "pointer up");
        actions
    }

    // --- Gesture starts ---

    /// A handle whose targets are gone behaves like the background.
    fn begin_handle_drag(&mut self, handle: HandleId, stage: Point, modifiers: Modifiers) -> Vec<Action> {
        if let Some(session) = self.gizmos.begin_drag(handle, &self.scene, stage) {
            self.input = InputState::HandleDrag { handle, session };
            return Vec::new();
        }
        tracing::debug!(handle = handle.0, "handle has no live targets");
        self.begin_marquee(stage, modifiers)
    }

    fn begin_shape_drag(&mut self, id: ShapeId, screen: Point, modifiers: Modifiers) -> Vec<Action> {
        let was_selected = self.scene.get(id).is_some_and(Shape::selected);
        let mut actions = Vec::new();
        if !was_selected {
            if !modifiers.is_additive() {
                self.scene.clear_selection();
            }
            self.scene.select(id);
            self.selection_changed();
            actions.push(self.commit());
            actions.push(Action::RenderNeeded);
        }

        let origins = self.scene.selected_shapes().iter().map(|s| (s.id, s.center)).collect();
        self.input = InputState::ShapeDrag {
            target: id,
            was_selected,
            start_device: self.viewport.screen_to_device(screen),
            origins,
            delta: None,
        };
        actions
    }

    fn begin_marquee(&mut self, stage: Point, modifiers: Modifiers) -> Vec<Action> {
        let before = self.scene.selected_ids().to_vec();
        let mut actions = Vec::new();
        if !modifiers.is_additive() && self.scene.clear_selection() {
            self.selection_changed();
            actions.push(Action::RenderNeeded);
        }
        self.input = InputState::MarqueeSelect { rect: SelectionRectangle::new(stage), before };
        actions
    }

    // --- Gesture ends ---

    /// Click on an already-selected shape without a drag.
    fn click(&mut self, target: ShapeId, stage: Point, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if modifiers.is_additive() {
            if self.scene.unselect(target) {
                self.selection_changed();
                actions.push(self.commit());
                actions.push(Action::RenderNeeded);
            }
            return actions;
        }

        if self.scene.selected_ids() != [target] {
            self.scene.clear_selection();
            self.scene.select(target);
            self.selection_changed();
            actions.push(self.commit());
            actions.push(Action::RenderNeeded);
        }
        if self.scene.get(target).is_some_and(Shape::is_text) {
            actions.push(Action::EditTextRequested { id: target, point: stage });
        }
        actions
    }

    /// Apply the marquee policy to every shape, then commit once if the selection changed.
    fn finish_marquee(&mut self, rect: &SelectionRectangle, before: &[ShapeId]) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.ui.marquee.take().is_some() {
            actions.push(Action::RenderNeeded);
        }

        if let Some(bounds) = rect.bounds() {
            let mode = self.config.marquee_mode;
            let picked: Vec<ShapeId> = self
                .scene
                .shapes()
                .iter()
                .filter(|s| !s.selected() && mode.matches(&bounds, &s.bounds()))
                .map(|s| s.id)
                .collect();
            tracing::debug!(?mode, picked = picked.len(), "marquee applied");
            for id in &picked {
                self.scene.select(*id);
            }
            if !picked.is_empty() {
                self.selection_changed();
            }
        }

        if !same_members(self.scene.selected_ids(), before) {
            actions.push(self.commit());
            if !actions.contains(&Action::RenderNeeded) {
                actions.push(Action::RenderNeeded);
            }
        }
        actions
    }

    // --- Helpers ---

    /// Stage-space drag offset from the pointer-down device position.
    fn drag_delta(&self, start_device: Point, screen: Point, modifiers: Modifiers) -> Point {
        let device_delta = self.viewport.screen_to_device(screen) - start_device;
        let delta = self.viewport.adjusted_scale(device_delta * (1.0 / self.viewport.dpr));
        if modifiers.shift { delta.constrain_to_axis() } else { delta }
    }

    fn offset_shapes(&mut self, origins: &[(ShapeId, Point)], delta: Point) {
        for (id, origin) in origins {
            if let Some(shape) = self.scene.get_mut(*id) {
                shape.center = *origin + delta;
            }
        }
        self.geometry_changed();
    }

    fn geometry_changed(&mut self) {
        self.gizmos.refresh_bounds(&self.scene);
        self.raster.mark_dirty();
    }

    /// Regenerate gizmos after any selection change. Handles get new ids.
    fn selection_changed(&mut self) {
        if let Err(e) = self.gizmos.rebuild(&mut self.scene) {
            tracing::warn!(error = %e, "gizmo rebuild failed; selection has no handles");
        }
        self.raster.mark_dirty();
    }

    fn commit(&self) -> Action {
        Action::Commit { shapes: self.scene.shapes().to_vec() }
    }
}

fn same_members(a: &[ShapeId], b: &[ShapeId]) -> bool {
    a.len() == b.len() && a.iter().all(|id| b.contains(id))
}

fn count_commits(actions: &[Action]) -> usize {
    actions.iter().filter(|a| matches!(a, Action::Commit { .. })).count()
}

/// The full canvas engine. Wraps `EngineCore` and owns the overlay canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given overlay canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    #[must_use]
    pub fn with_config(canvas: HtmlCanvasElement, config: EngineConfig) -> Self {
        Self { canvas, core: EngineCore::with_config(config) }
    }

    // --- Delegated data inputs ---

    /// # Errors
    ///
    /// See [`EngineCore::load_snapshot`].
    pub fn load_snapshot(&mut self, shapes: Vec<Shape>) -> Result<(), SceneError> {
        self.core.load_snapshot(shapes)
    }

    /// # Errors
    ///
    /// See [`EngineCore::apply_create`].
    pub fn apply_create(&mut self, shape: Shape) -> Result<ShapeId, SceneError> {
        self.core.apply_create(shape)
    }

    pub fn apply_delete(&mut self, id: ShapeId) -> bool {
        self.core.apply_delete(id)
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.core.set_tool(tool);
    }

    pub fn set_camera(&mut self, pan_x: f64, pan_y: f64, zoom: f64) {
        self.core.set_camera(pan_x, pan_y, zoom);
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the overlay backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        let dpr = self.core.viewport.dpr;
        self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the selection overlay to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        render::draw_overlay(
            &ctx,
            &self.core.scene,
            &self.core.gizmos,
            &self.core.ui,
            &self.core.viewport,
            self.core.viewport_width,
            self.core.viewport_height,
        )
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> &[ShapeId] {
        self.core.selection()
    }

    #[must_use]
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.core.shape(id)
    }

    #[must_use]
    pub fn summary(&self) -> PropertySummary {
        self.core.summary()
    }
}
