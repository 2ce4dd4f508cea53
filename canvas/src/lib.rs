//! Selection and manipulation engine for a 2D scene editor.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It turns raw
//! pointer events into selection, multi-select, marquee selection, and gizmo
//! handle drags. Hit-testing reads an off-screen identity raster in which
//! every shape and handle is filled with a color encoding its id. The host
//! JavaScript layer wires DOM events to the engine and forwards the resulting
//! [`engine::Action`]s (commits to its history, render requests, text editing).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] state machine |
//! | [`doc`] | Shapes, id allocation, and the selection set |
//! | [`viewport`] | Points and screen/stage/device coordinate conversions |
//! | [`geom`] | Axis-aligned bounds and point-in-polygon |
//! | [`raster`] | Identity raster: id color encoding and pixel decode |
//! | [`gizmo`] | Transform gizmos, handles, and resize/rotate drag sessions |
//! | [`hit`] | Tagged resolution of decoded ids |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`history`] | History sink trait and undo/redo log |
//! | [`selection_metrics`] | Property summary over the selection |
//! | [`render`] | Overlay rendering (selection outlines, handles, marquee) |
//! | [`consts`] | Shared numeric constants (id range, handle sizes, etc.) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod gizmo;
pub mod history;
pub mod hit;
pub mod input;
pub mod raster;
pub mod render;
pub mod selection_metrics;
pub mod viewport;
