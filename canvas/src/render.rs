//! Rendering: draws the selection overlay to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of scene, gizmo, and UI state and produces
//! pixels. It never mutates application state. Shape fills belong to the
//! host's own stage renderer; only selection feedback is drawn here.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::doc::{Scene, Shape};
use crate::geom::Bounds;
use crate::gizmo::{GizmoSet, HandleRole};
use crate::input::UiState;
use crate::viewport::Viewport;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

const ACCENT: &str = "#1E90FF";
const MARQUEE_FILL: &str = "rgba(30, 144, 255, 0.12)";

/// Draw the overlay: selection outlines, gizmo handles, and the marquee.
///
/// `viewport_w` and `viewport_h` are in CSS pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw_overlay(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene,
    gizmos: &GizmoSet,
    ui: &UiState,
    viewport: &Viewport,
    viewport_w: f64,
    viewport_h: f64,
) -> Result<(), JsValue> {
    let dpr = viewport.dpr;

    // Layer 1: clear and set up the stage transform.
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport_w, viewport_h);
    ctx.translate(viewport.pan_x, viewport.pan_y)?;
    ctx.scale(viewport.zoom, viewport.zoom)?;

    // Layer 2: outlines of the selected shapes.
    for shape in scene.selected_shapes() {
        draw_selection_outline(ctx, shape, viewport.zoom)?;
    }

    // Layer 3: gizmo frames and handles.
    draw_gizmos(ctx, gizmos, viewport)?;

    // Layer 4: marquee.
    if let Some(m) = ui.marquee {
        draw_marquee(ctx, &m, viewport.zoom)?;
    }

    Ok(())
}

fn draw_selection_outline(ctx: &CanvasRenderingContext2d, shape: &Shape, zoom: f64) -> Result<(), JsValue> {
    let points = shape.stage_points();
    let Some((first, rest)) = points.split_first() else {
        return Ok(());
    };

    ctx.save();
    set_dash(ctx, SELECTION_DASH_PX / zoom)?;
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0 / zoom);
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
    ctx.stroke();
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

fn draw_gizmos(ctx: &CanvasRenderingContext2d, gizmos: &GizmoSet, viewport: &Viewport) -> Result<(), JsValue> {
    let zoom = viewport.zoom;
    ctx.save();
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0 / zoom);

    for gizmo in gizmos.gizmos() {
        let b = &gizmo.bounds;
        ctx.stroke_rect(b.min.x, b.min.y, b.width(), b.height());

        // Stem from the top edge to the rotate handle.
        let top = gizmo.handle_anchor(HandleRole::Rotate, viewport, gizmos.metrics());
        ctx.begin_path();
        ctx.move_to(b.center().x, b.min.y);
        ctx.line_to(top.x, top.y);
        ctx.stroke();
    }

    ctx.set_fill_style_str("#fff");
    for handle in gizmos.handles() {
        let Some([min, _, max, _]) = gizmos.handle_outline(handle, viewport) else {
            continue;
        };
        let (w, h) = (max.x - min.x, max.y - min.y);
        ctx.fill_rect(min.x, min.y, w, h);
        ctx.stroke_rect(min.x, min.y, w, h);
    }

    ctx.restore();
    Ok(())
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, marquee: &Bounds, zoom: f64) -> Result<(), JsValue> {
    ctx.save();
    set_dash(ctx, SELECTION_DASH_PX / zoom)?;
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_fill_style_str(MARQUEE_FILL);
    ctx.set_line_width(1.0 / zoom);
    ctx.fill_rect(marquee.min.x, marquee.min.y, marquee.width(), marquee.height());
    ctx.stroke_rect(marquee.min.x, marquee.min.y, marquee.width(), marquee.height());
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

fn set_dash(ctx: &CanvasRenderingContext2d, segment: f64) -> Result<(), JsValue> {
    let dash_array = js_sys::Array::new();
    dash_array.push(&segment.into());
    dash_array.push(&segment.into());
    ctx.set_line_dash(&dash_array)
}
