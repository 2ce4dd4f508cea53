#![allow(clippy::float_cmp)]

use std::f64::consts::FRAC_PI_2;

use super::*;

const EPSILON: f64 = 1e-9;

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn approx(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

/// Scene with one 20x10 rect (id 1) centered at (50, 50), selected, gizmos built.
fn single_selection() -> (Scene, GizmoSet) {
    let mut scene = Scene::new();
    scene.insert(Shape::rect(ShapeId(1), pt(50.0, 50.0), 20.0, 10.0)).unwrap();
    scene.select(ShapeId(1));
    let mut gizmos = GizmoSet::default();
    gizmos.rebuild(&mut scene).unwrap();
    (scene, gizmos)
}

fn handle_for(gizmos: &GizmoSet, role: HandleRole) -> HandleId {
    gizmos.handles().iter().find(|h| h.role == role).unwrap().id
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

// =============================================================
// Corner
// =============================================================

#[test]
fn corner_opposites_pair_up() {
    for c in Corner::ALL {
        assert_eq!(c.opposite().opposite(), c);
        assert_ne!(c.opposite(), c);
    }
}

#[test]
fn corner_positions_on_bounds() {
    let b = Bounds::from_corners(pt(0.0, 0.0), pt(10.0, 20.0));
    assert_eq!(Corner::TopLeft.of(&b), pt(0.0, 0.0));
    assert_eq!(Corner::TopRight.of(&b), pt(10.0, 0.0));
    assert_eq!(Corner::BottomRight.of(&b), pt(10.0, 20.0));
    assert_eq!(Corner::BottomLeft.of(&b), pt(0.0, 20.0));
}

// =============================================================
// GizmoSet: rebuild
// =============================================================

#[test]
fn rebuild_without_selection_is_empty() {
    let mut scene = Scene::new();
    scene.insert(Shape::rect(ShapeId(1), pt(0.0, 0.0), 10.0, 10.0)).unwrap();
    let mut gizmos = GizmoSet::default();
    gizmos.rebuild(&mut scene).unwrap();
    assert!(gizmos.is_empty());
    assert!(gizmos.handles().is_empty());
}

#[test]
fn rebuild_creates_four_corners_and_rotate() {
    let (_, gizmos) = single_selection();
    assert_eq!(gizmos.gizmos().len(), 1);
    assert_eq!(gizmos.handles().len(), 5);
    assert_eq!(gizmos.handles().iter().filter(|h| h.role == HandleRole::Rotate).count(), 1);
}

#[test]
fn handle_ids_never_collide_with_shapes_or_each_other() {
    let (scene, gizmos) = single_selection();
    let mut ids: Vec<u32> = gizmos.handles().iter().map(|h| h.id.0).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    for id in ids {
        assert_ne!(id, 0);
        assert!(scene.shape_for_raw(id).is_none());
    }
}

#[test]
fn rebuild_issues_fresh_ids() {
    let (mut scene, mut gizmos) = single_selection();
    let before: Vec<HandleId> = gizmos.handles().iter().map(|h| h.id).collect();
    gizmos.rebuild(&mut scene).unwrap();
    let after: Vec<HandleId> = gizmos.handles().iter().map(|h| h.id).collect();
    assert!(after.iter().all(|id| !before.contains(id)));
}

#[test]
fn handles_point_back_to_their_gizmo() {
    let (_, gizmos) = single_selection();
    for handle in gizmos.handles() {
        let gizmo = gizmos.gizmo(handle.gizmo).unwrap();
        assert!(gizmo.handles.contains(&handle.id));
        assert_eq!(gizmo.targets, vec![ShapeId(1)]);
    }
}

#[test]
fn find_handle_by_raw_id() {
    let (_, gizmos) = single_selection();
    let first = gizmos.handles()[0];
    assert_eq!(gizmos.find_handle(first.id.0), Some(&first));
    assert!(gizmos.find_handle(1).is_none());
}

#[test]
fn gizmo_bounds_cover_all_targets() {
    let mut scene = Scene::new();
    scene.insert(Shape::rect(ShapeId(1), pt(0.0, 0.0), 10.0, 10.0)).unwrap();
    scene.insert(Shape::rect(ShapeId(2), pt(100.0, 50.0), 10.0, 10.0)).unwrap();
    scene.select(ShapeId(1));
    scene.select(ShapeId(2));
    let mut gizmos = GizmoSet::default();
    gizmos.rebuild(&mut scene).unwrap();
    let b = gizmos.gizmos()[0].bounds;
    assert_eq!(b.min, pt(-5.0, -5.0));
    assert_eq!(b.max, pt(105.0, 55.0));
}

#[test]
fn refresh_bounds_keeps_ids() {
    let (mut scene, mut gizmos) = single_selection();
    let ids: Vec<HandleId> = gizmos.handles().iter().map(|h| h.id).collect();
    scene.get_mut(ShapeId(1)).unwrap().center = pt(150.0, 50.0);
    gizmos.refresh_bounds(&scene);
    assert_eq!(gizmos.gizmos()[0].bounds.center(), pt(150.0, 50.0));
    let after: Vec<HandleId> = gizmos.handles().iter().map(|h| h.id).collect();
    assert_eq!(ids, after);
}

// =============================================================
// Handle geometry
// =============================================================

#[test]
fn rotate_anchor_sits_above_bounds() {
    let (_, gizmos) = single_selection();
    let gizmo = &gizmos.gizmos()[0];
    let vp = Viewport::default();
    let anchor = gizmo.handle_anchor(HandleRole::Rotate, &vp, gizmos.metrics());
    assert_eq!(anchor, pt(50.0, 45.0 - ROTATE_HANDLE_OFFSET_PX));
}

#[test]
fn rotate_anchor_offset_shrinks_with_zoom() {
    let (_, gizmos) = single_selection();
    let gizmo = &gizmos.gizmos()[0];
    let vp = Viewport { zoom: 2.0, ..Viewport::default() };
    let anchor = gizmo.handle_anchor(HandleRole::Rotate, &vp, gizmos.metrics());
    assert_eq!(anchor, pt(50.0, 45.0 - ROTATE_HANDLE_OFFSET_PX / 2.0));
}

#[test]
fn handle_outline_is_square_around_anchor() {
    let (_, gizmos) = single_selection();
    let handle = *gizmos.handles().iter().find(|h| h.role == HandleRole::Corner(Corner::TopLeft)).unwrap();
    let outline = gizmos.handle_outline(&handle, &Viewport::default()).unwrap();
    let half = HANDLE_SIZE_PX / 2.0;
    assert_eq!(outline[0], pt(40.0 - half, 45.0 - half));
    assert_eq!(outline[2], pt(40.0 + half, 45.0 + half));
}

// =============================================================
// Resize drag
// =============================================================

#[test]
fn resize_bottom_right_keeps_top_left_fixed() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Corner(Corner::BottomRight));
    let mut session = gizmos.begin_drag(handle, &scene, pt(60.0, 55.0)).unwrap();

    session.update(&mut scene, pt(80.0, 65.0), Modifiers::default());

    let shape = scene.get(ShapeId(1)).unwrap();
    assert!(approx(shape.center, pt(60.0, 55.0)));
    assert!((shape.width - 40.0).abs() < EPSILON);
    assert!((shape.height - 20.0).abs() < EPSILON);
    assert!(approx(shape.bounds().min, pt(40.0, 45.0)));
    assert!(session.changed(&scene));
}

#[test]
fn resize_uses_grab_offset() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Corner(Corner::BottomRight));
    // Grabbed 2px off the exact corner; moving by zero must not jump.
    let mut session = gizmos.begin_drag(handle, &scene, pt(62.0, 57.0)).unwrap();
    session.update(&mut scene, pt(62.0, 57.0), Modifiers::default());
    assert!(!session.changed(&scene));
}

#[test]
fn resize_back_to_start_is_unchanged() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Corner(Corner::TopLeft));
    let mut session = gizmos.begin_drag(handle, &scene, pt(40.0, 45.0)).unwrap();
    session.update(&mut scene, pt(10.0, 10.0), Modifiers::default());
    assert!(session.changed(&scene));
    session.update(&mut scene, pt(40.0, 45.0), Modifiers::default());
    assert!(!session.changed(&scene));
}

#[test]
fn resize_never_collapses_below_minimum() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Corner(Corner::BottomRight));
    let mut session = gizmos.begin_drag(handle, &scene, pt(60.0, 55.0)).unwrap();
    // Drag far past the fixed corner.
    session.update(&mut scene, pt(-100.0, -100.0), Modifiers::default());
    let shape = scene.get(ShapeId(1)).unwrap();
    assert!(shape.width >= MIN_SHAPE_SIZE - EPSILON);
    assert!(shape.height >= MIN_SHAPE_SIZE - EPSILON);
}

#[test]
fn resize_with_shift_keeps_aspect_ratio() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Corner(Corner::BottomRight));
    let mut session = gizmos.begin_drag(handle, &scene, pt(60.0, 55.0)).unwrap();
    // x scale 2, y scale 1.5 -> uniform 2
    session.update(&mut scene, pt(80.0, 60.0), shift());
    let shape = scene.get(ShapeId(1)).unwrap();
    assert!((shape.width / shape.height - 2.0).abs() < EPSILON);
    assert!((shape.width - 40.0).abs() < EPSILON);
}

// =============================================================
// Rotate drag
// =============================================================

#[test]
fn rotate_quarter_turn_around_center() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Rotate);
    let mut session = gizmos.begin_drag(handle, &scene, pt(50.0, 20.0)).unwrap();

    session.update(&mut scene, pt(80.0, 50.0), Modifiers::default());

    let shape = scene.get(ShapeId(1)).unwrap();
    assert!((shape.rotation - FRAC_PI_2).abs() < EPSILON);
    assert!(approx(shape.center, pt(50.0, 50.0)));
    assert!(session.changed(&scene));
}

#[test]
fn rotate_group_orbits_pivot() {
    let mut scene = Scene::new();
    scene.insert(Shape::rect(ShapeId(1), pt(0.0, 0.0), 10.0, 10.0)).unwrap();
    scene.insert(Shape::rect(ShapeId(2), pt(20.0, 0.0), 10.0, 10.0)).unwrap();
    scene.select(ShapeId(1));
    scene.select(ShapeId(2));
    let mut gizmos = GizmoSet::default();
    gizmos.rebuild(&mut scene).unwrap();
    let handle = handle_for(&gizmos, HandleRole::Rotate);

    // Pivot is (10, 0); grab straight above, then drag to the right.
    let mut session = gizmos.begin_drag(handle, &scene, pt(10.0, -30.0)).unwrap();
    session.update(&mut scene, pt(40.0, 0.0), Modifiers::default());

    assert!(approx(scene.get(ShapeId(1)).unwrap().center, pt(10.0, -10.0)));
    assert!(approx(scene.get(ShapeId(2)).unwrap().center, pt(10.0, 10.0)));
}

#[test]
fn rotate_with_shift_snaps_small_angles_to_zero() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Rotate);
    let mut session = gizmos.begin_drag(handle, &scene, pt(50.0, 20.0)).unwrap();
    session.update(&mut scene, pt(52.0, 20.0), shift());
    assert!(!session.changed(&scene));
}

// =============================================================
// begin_drag edge cases
// =============================================================

#[test]
fn begin_drag_unknown_handle_is_none() {
    let (scene, gizmos) = single_selection();
    assert!(gizmos.begin_drag(HandleId(999), &scene, pt(0.0, 0.0)).is_none());
}

#[test]
fn begin_drag_with_deleted_targets_is_none() {
    let (mut scene, gizmos) = single_selection();
    let handle = handle_for(&gizmos, HandleRole::Rotate);
    scene.remove(ShapeId(1));
    assert!(gizmos.begin_drag(handle, &scene, pt(0.0, 0.0)).is_none());
}
