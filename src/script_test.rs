#![allow(clippy::float_cmp)]

use canvas::engine::EngineConfig;
use canvas::history::HistoryLog;
use canvas::input::MarqueeMode;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn core_for(scene_json: &str, mode: MarqueeMode) -> EngineCore {
    let scene: SceneFile = serde_json::from_str(scene_json).unwrap();
    let mut core = EngineCore::with_config(EngineConfig { marquee_mode: mode, ..EngineConfig::default() });
    core.set_viewport(200.0, 200.0, 1.0);
    scene.load_into(&mut core).unwrap();
    core
}

fn run(core: &mut EngineCore, script_json: &str) -> ReplayReport {
    let gestures: Vec<Gesture> = serde_json::from_str(script_json).unwrap();
    let mut history = HistoryLog::default();
    replay(core, &gestures, &mut history)
}

fn shape(report: &ReplayReport, id: u32) -> &ShapeReport {
    report.shapes.iter().find(|s| s.id == ShapeId(id)).unwrap()
}

const TWO_SQUARES: &str = r#"{
    "shapes": [
        { "id": 5, "x": 10, "y": 10, "width": 40, "height": 40 },
        { "id": 6, "x": 100, "y": 100, "width": 40, "height": 40 }
    ],
    "selection": [5]
}"#;

// =============================================================
// Scene files
// =============================================================

#[test]
fn shape_spec_defaults_to_unrotated_rect() {
    let spec: ShapeSpec = serde_json::from_str(r#"{ "id": 3, "x": 1, "y": 2, "width": 4, "height": 6 }"#).unwrap();
    let shape = spec.to_shape();
    assert_eq!(spec.kind, ShapeKind::Rect);
    assert_eq!(shape.outline.len(), 4);
    assert_eq!(shape.rotation, 0.0);
    assert!(!shape.is_text());
}

#[test]
fn shape_spec_converts_degrees_and_text() {
    let spec: ShapeSpec = serde_json::from_str(
        r#"{ "id": 3, "kind": "text", "x": 0, "y": 0, "width": 4, "height": 6, "rotation_deg": 180, "text": "hi" }"#,
    )
    .unwrap();
    let shape = spec.to_shape();
    assert_eq!(shape.text.as_deref(), Some("hi"));
    assert!((shape.rotation - std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn scene_file_sets_initial_selection() {
    let core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    assert_eq!(core.selection(), [ShapeId(5)]);
    assert!(!core.gizmos.is_empty());
}

#[test]
fn duplicate_ids_are_rejected() {
    let scene: SceneFile = serde_json::from_str(
        r#"{ "shapes": [
            { "id": 1, "x": 0, "y": 0, "width": 1, "height": 1 },
            { "id": 1, "x": 5, "y": 5, "width": 1, "height": 1 }
        ] }"#,
    )
    .unwrap();
    let mut core = EngineCore::new();
    assert_eq!(scene.load_into(&mut core), Err(SceneError::DuplicateId(1)));
}

// =============================================================
// Replay
// =============================================================

#[test]
fn replay_drag_reports_moved_shape_and_one_commit() {
    let mut core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    let report = run(
        &mut core,
        r#"[
            { "event": "down", "x": 10, "y": 10 },
            { "event": "move", "x": 10, "y": 70 },
            { "event": "up", "x": 10, "y": 70 }
        ]"#,
    );
    assert_eq!(report.commits, 1);
    assert_eq!((shape(&report, 5).x, shape(&report, 5).y), (10.0, 70.0));
    assert_eq!((shape(&report, 6).x, shape(&report, 6).y), (100.0, 100.0));
    assert!(shape(&report, 5).selected);
}

#[test]
fn replay_marquee_in_intersection_mode() {
    let mut core = core_for(
        r#"{ "shapes": [
            { "id": 1, "x": 50, "y": 50, "width": 20, "height": 20 },
            { "id": 2, "x": 70, "y": 70, "width": 20, "height": 20 }
        ] }"#,
        MarqueeMode::Intersection,
    );
    let report = run(
        &mut core,
        r#"[
            { "event": "down", "x": 0, "y": 0 },
            { "event": "move", "x": 50, "y": 50 },
            { "event": "up", "x": 50, "y": 50 }
        ]"#,
    );
    assert_eq!(report.selection, vec![ShapeId(1)]);
    assert_eq!(report.commits, 1);
}

#[test]
fn replay_ignores_secondary_button_and_other_tools() {
    let mut core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    let report = run(
        &mut core,
        r#"[
            { "event": "down", "x": 100, "y": 100, "button": "secondary" },
            { "event": "up", "x": 100, "y": 100, "button": "secondary" },
            { "event": "tool", "tool": "rect" },
            { "event": "down", "x": 100, "y": 100 },
            { "event": "up", "x": 100, "y": 100 }
        ]"#,
    );
    assert_eq!(report.commits, 0);
    assert_eq!(report.selection, vec![ShapeId(5)]);
}

#[test]
fn replay_key_shortcut_restores_select_tool() {
    let mut core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    let report = run(
        &mut core,
        r#"[
            { "event": "tool", "tool": "ellipse" },
            { "event": "key", "key": "v" },
            { "event": "down", "x": 100, "y": 100, "modifiers": { "shift": true } },
            { "event": "up", "x": 100, "y": 100, "modifiers": { "shift": true } }
        ]"#,
    );
    assert_eq!(report.selection, vec![ShapeId(6), ShapeId(5)]);
    assert_eq!(report.commits, 1);
    assert_eq!(report.summary.count, 2);
}

#[test]
fn replay_collects_text_edit_requests() {
    let mut core = core_for(
        r#"{ "shapes": [ { "id": 9, "kind": "text", "x": 50, "y": 50, "width": 40, "height": 40, "text": "note" } ],
             "selection": [9] }"#,
        MarqueeMode::Containment,
    );
    let report = run(
        &mut core,
        r#"[
            { "event": "down", "x": 50, "y": 50 },
            { "event": "up", "x": 50, "y": 50 }
        ]"#,
    );
    assert_eq!(report.edit_requests, vec![ShapeId(9)]);
    assert_eq!(report.commits, 0);
}

// =============================================================
// Pick
// =============================================================

#[test]
fn pick_report_serializes_target_and_id() {
    let mut core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    let hit = PickReport::from(core.pick(Point::new(100.0, 100.0)));
    assert_eq!(hit, PickReport::Shape(6));
    assert_eq!(serde_json::to_value(hit).unwrap(), serde_json::json!({ "target": "shape", "id": 6 }));

    let miss = PickReport::from(core.pick(Point::new(190.0, 10.0)));
    assert_eq!(serde_json::to_value(miss).unwrap(), serde_json::json!({ "target": "background" }));
}

#[test]
fn pick_finds_gizmo_handles() {
    let mut core = core_for(TWO_SQUARES, MarqueeMode::Containment);
    // Bottom-right corner of A's gizmo.
    assert!(matches!(PickReport::from(core.pick(Point::new(30.0, 30.0))), PickReport::Handle(_)));
}
