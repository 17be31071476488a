#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::geom::Point;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn alt() -> Modifiers {
    Modifiers { alt: true, ..Modifiers::default() }
}

/// Engine preloaded with one 0.2×0.2 rect centered on (0.5, 0.5).
fn engine_with_square() -> (Engine, crate::shape::ShapeId) {
    let mut engine = Engine::new();
    let shape = Shape::rect(0.4, 0.4, 0.2, 0.2);
    let id = shape.id.clone();
    engine.store.write(shape);
    (engine, id)
}

fn created_id(actions: &[Action]) -> crate::shape::ShapeId {
    actions
        .iter()
        .find_map(|a| match a {
            Action::ShapeCreated(shape) => Some(shape.id.clone()),
            _ => None,
        })
        .expect("expected a ShapeCreated action")
}

// =============================================================
// Selection and hit testing
// =============================================================

#[test]
fn select_filters_unknown_ids() {
    let (mut engine, id) = engine_with_square();
    let action = engine.select(vec![id.clone(), "nope".to_string()]);
    assert_eq!(action, Action::SelectionChanged { selected: vec![id.clone()] });
    assert_eq!(engine.selection(), &[id]);
}

#[test]
fn clear_selection_empties() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id]);
    engine.clear_selection();
    assert!(engine.selection().is_empty());
    assert!(engine.selection_frame().is_none());
}

#[test]
fn hit_test_prefers_topmost() {
    let mut engine = Engine::new();
    let bottom = Shape::rect(0.3, 0.3, 0.4, 0.4);
    let top = Shape::rect(0.4, 0.4, 0.2, 0.2);
    let top_id = top.id.clone();
    engine.store.write(bottom);
    engine.store.write(top);
    let hit = engine.hit_test(pt(0.5, 0.5)).unwrap();
    assert_eq!(hit.id, top_id);
}

#[test]
fn hit_test_misses_empty_space() {
    let (engine, _) = engine_with_square();
    assert!(engine.hit_test(pt(0.05, 0.05)).is_none());
}

#[test]
fn selection_frame_tracks_selected_shapes() {
    let (mut engine, id) = engine_with_square();
    assert!(engine.selection_frame().is_none());
    engine.select(vec![id]);
    let frame = engine.selection_frame().unwrap();
    assert!(close(frame.center.x, 0.5));
    assert!(close(frame.width, 0.2));
}

#[test]
fn delete_selected_reports_each_shape() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id.clone()]);
    let actions = engine.delete_selected();
    assert!(actions.contains(&Action::ShapeDeleted { id }));
    assert!(actions.contains(&Action::SelectionChanged { selected: Vec::new() }));
    assert!(engine.store.is_empty());
}

// =============================================================
// Session exclusivity
// =============================================================

#[test]
fn second_session_is_rejected_busy() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.2, 0.2), no_mods()).unwrap();
    assert!(engine.session_active());
    let err = engine.on_pointer_down(2, pt(0.6, 0.6), no_mods()).unwrap_err();
    assert_eq!(err, SessionError::Busy);
}

#[test]
fn moves_from_other_pointers_are_ignored() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.2, 0.2), no_mods()).unwrap();
    assert!(engine.on_pointer_move(2, pt(0.9, 0.9)).is_empty());
    assert!(engine.on_pointer_up(2, pt(0.9, 0.9)).is_empty());
    // The session is still alive and owned by pointer 1.
    assert!(engine.session_active());
    let actions = engine.on_pointer_up(1, pt(0.4, 0.4));
    assert_eq!(actions.len(), 1);
    assert!(matches!(actions[0], Action::ShapeCreated(_)));
}

#[test]
fn begin_transform_with_empty_selection_is_noop() {
    let mut engine = Engine::new();
    engine.begin_move(1, pt(0.5, 0.5)).unwrap();
    assert!(!engine.session_active());
}

#[test]
fn begin_vertex_edit_unknown_shape_errors() {
    let mut engine = Engine::new();
    let err = engine.begin_vertex_edit(1, "nope", 0).unwrap_err();
    assert_eq!(err, SessionError::UnknownShape("nope".to_string()));
}

// =============================================================
// Drawing: rect / ellipse
// =============================================================

#[test]
fn draw_rect_commits_dragged_bounds() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.2, 0.3), no_mods()).unwrap();
    engine.on_pointer_move(1, pt(0.5, 0.5));
    let actions = engine.on_pointer_up(1, pt(0.6, 0.4));
    let id = created_id(&actions);
    match engine.store.read(&id).unwrap().kind {
        ShapeKind::Rect { x, y, width, height, .. } => {
            assert!(close(x, 0.2));
            assert!(close(y, 0.3));
            assert!(close(width, 0.4));
            assert!(close(height, 0.1));
        }
        _ => panic!("expected rect"),
    }
    assert!(!engine.session_active());
}

#[test]
fn draw_rect_upward_drag_normalizes_origin() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.6, 0.6), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.3, 0.2));
    let id = created_id(&actions);
    match engine.store.read(&id).unwrap().kind {
        ShapeKind::Rect { x, y, width, height, .. } => {
            assert!(close(x, 0.3));
            assert!(close(y, 0.2));
            assert!(close(width, 0.3));
            assert!(close(height, 0.4));
        }
        _ => panic!("expected rect"),
    }
}

#[test]
fn draw_rect_below_min_size_aborts() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.5, 0.5), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.5001, 0.5001));
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(engine.store.is_empty());
}

#[test]
fn draw_ellipse_creates_ellipse_kind() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Ellipse);
    engine.on_pointer_down(1, pt(0.2, 0.2), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.6, 0.5));
    let id = created_id(&actions);
    assert!(matches!(
        engine.store.read(&id).unwrap().kind,
        ShapeKind::Ellipse { .. }
    ));
}

// =============================================================
// Drawing: line / path
// =============================================================

#[test]
fn draw_line_keeps_both_endpoints() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Line);
    engine.on_pointer_down(1, pt(0.1, 0.1), no_mods()).unwrap();
    engine.on_pointer_move(1, pt(0.4, 0.4));
    let actions = engine.on_pointer_up(1, pt(0.8, 0.2));
    let id = created_id(&actions);
    match &engine.store.read(&id).unwrap().kind {
        ShapeKind::Line { points, .. } => {
            assert_eq!(points.len(), 2);
            assert!(close(points[0].x, 0.1) && close(points[0].y, 0.1));
            assert!(close(points[1].x, 0.8) && close(points[1].y, 0.2));
        }
        other => panic!("expected line, got {other:?}"),
    }
}

#[test]
fn draw_line_zero_length_aborts() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Line);
    engine.on_pointer_down(1, pt(0.5, 0.5), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.5, 0.5));
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(engine.store.is_empty());
}

#[test]
fn draw_path_simplifies_collinear_samples() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Path);
    engine.on_pointer_down(1, pt(0.1, 0.5), no_mods()).unwrap();
    for i in 1..=8 {
        engine.on_pointer_move(1, pt(0.1 + 0.05 * f64::from(i), 0.5));
    }
    let actions = engine.on_pointer_up(1, pt(0.5, 0.5));
    let id = created_id(&actions);
    match &engine.store.read(&id).unwrap().kind {
        ShapeKind::Path { points, .. } => {
            // A straight stroke collapses to its endpoints.
            assert_eq!(points.len(), 2);
            assert!(close(points[0].x, 0.1));
            assert!(close(points.last().unwrap().x, 0.5));
        }
        other => panic!("expected path, got {other:?}"),
    }
}

#[test]
fn draw_path_single_tap_aborts() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Path);
    engine.on_pointer_down(1, pt(0.5, 0.5), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.5, 0.5));
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert!(engine.store.is_empty());
}

// =============================================================
// Select tool: click, drag, marquee
// =============================================================

#[test]
fn click_on_shape_selects_and_starts_move() {
    let (mut engine, id) = engine_with_square();
    let actions = engine.on_pointer_down(1, pt(0.5, 0.5), no_mods()).unwrap();
    assert!(actions.contains(&Action::SelectionChanged { selected: vec![id.clone()] }));
    assert!(engine.session_active());
    engine.on_pointer_move(1, pt(0.6, 0.5));
    let up = engine.on_pointer_up(1, pt(0.6, 0.5));
    assert_eq!(up, vec![Action::ShapeUpdated { id: id.clone() }]);
    match engine.store.read(&id).unwrap().kind {
        ShapeKind::Rect { x, .. } => assert!(close(x, 0.5)),
        _ => panic!("expected rect"),
    }
}

#[test]
fn shift_click_toggles_membership_without_session() {
    let (mut engine, id) = engine_with_square();
    engine.on_pointer_down(1, pt(0.5, 0.5), shift()).unwrap();
    assert_eq!(engine.selection(), &[id.clone()]);
    assert!(!engine.session_active());
    engine.on_pointer_up(1, pt(0.5, 0.5));
    engine.on_pointer_down(1, pt(0.5, 0.5), shift()).unwrap();
    assert!(engine.selection().is_empty());
}

#[test]
fn marquee_replace_selects_enclosed() {
    let (mut engine, id) = engine_with_square();
    engine.on_pointer_down(1, pt(0.05, 0.05), no_mods()).unwrap();
    assert!(engine.session_active());
    engine.on_pointer_move(1, pt(0.5, 0.5));
    let actions = engine.on_pointer_up(1, pt(0.95, 0.95));
    assert_eq!(actions, vec![Action::SelectionChanged { selected: vec![id] }]);
}

#[test]
fn marquee_on_empty_space_clears_selection() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id]);
    engine.on_pointer_down(1, pt(0.02, 0.02), no_mods()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.08, 0.08));
    assert_eq!(actions, vec![Action::SelectionChanged { selected: Vec::new() }]);
}

#[test]
fn alt_marquee_subtracts_from_selection() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id]);
    engine.on_pointer_down(1, pt(0.05, 0.05), alt()).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.95, 0.95));
    assert_eq!(actions, vec![Action::SelectionChanged { selected: Vec::new() }]);
}

// =============================================================
// Explicit transforms
// =============================================================

#[test]
fn rotate_session_accumulates_frame_rotation() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id]);
    engine.begin_rotate(1, pt(0.7, 0.5), false).unwrap();
    engine.on_pointer_move(1, pt(0.5, 0.7));
    engine.on_pointer_up(1, pt(0.5, 0.7));
    let frame = engine.selection_frame().unwrap();
    assert!(close(frame.rotation, std::f64::consts::FRAC_PI_2));
}

#[test]
fn scale_session_updates_shape() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id.clone()]);
    engine.begin_scale(1, pt(0.6, 0.5), ScaleHandle::E, false).unwrap();
    let actions = engine.on_pointer_up(1, pt(0.8, 0.5));
    assert_eq!(actions, vec![Action::ShapeUpdated { id: id.clone() }]);
    match engine.store.read(&id).unwrap().kind {
        ShapeKind::Rect { width, .. } => assert!(close(width, 0.4)),
        _ => panic!("expected rect"),
    }
}

#[test]
fn live_frame_follows_gesture() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id]);
    engine.begin_move(1, pt(0.5, 0.5)).unwrap();
    engine.on_pointer_move(1, pt(0.7, 0.5));
    let frame = engine.selection_frame().unwrap();
    assert!(close(frame.center.x, 0.7));
    engine.on_pointer_up(1, pt(0.7, 0.5));
}

// =============================================================
// Vertex editing
// =============================================================

#[test]
fn vertex_edit_moves_one_point() {
    let mut engine = Engine::new();
    let line = Shape::line(vec![pt(0.2, 0.2), pt(0.8, 0.8)]);
    let id = line.id.clone();
    engine.store.write(line);
    engine.begin_vertex_edit(1, &id, 1).unwrap();
    engine.on_pointer_move(1, pt(0.8, 0.2));
    let actions = engine.on_pointer_up(1, pt(0.8, 0.2));
    assert_eq!(actions, vec![Action::ShapeUpdated { id: id.clone() }]);
    match &engine.store.read(&id).unwrap().kind {
        ShapeKind::Line { points, .. } => {
            assert!(close(points[0].x, 0.2) && close(points[0].y, 0.2));
            assert!(close(points[1].x, 0.8) && close(points[1].y, 0.2));
        }
        other => panic!("expected line, got {other:?}"),
    }
}

#[test]
fn vertex_edit_cancel_restores_shape() {
    let mut engine = Engine::new();
    let line = Shape::line(vec![pt(0.2, 0.2), pt(0.8, 0.8)]);
    let id = line.id.clone();
    let before = line.clone();
    engine.store.write(line);
    engine.begin_vertex_edit(1, &id, 0).unwrap();
    engine.on_pointer_move(1, pt(0.1, 0.9));
    engine.cancel_session();
    assert_eq!(engine.store.read(&id).unwrap(), &before);
    assert!(!engine.session_active());
}

// =============================================================
// Erase
// =============================================================

#[test]
fn erase_removes_hit_shapes_while_dragging() {
    let mut engine = Engine::new();
    let a = Shape::rect(0.1, 0.1, 0.1, 0.1);
    let b = Shape::rect(0.6, 0.6, 0.1, 0.1);
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    engine.store.write(a);
    engine.store.write(b);
    engine.select(vec![a_id.clone()]);
    engine.set_tool(Tool::Erase);
    let down = engine.on_pointer_down(1, pt(0.15, 0.15), no_mods()).unwrap();
    assert_eq!(down, vec![Action::ShapeDeleted { id: a_id.clone() }]);
    // The erased shape also leaves the selection.
    assert!(engine.selection().is_empty());
    let moved = engine.on_pointer_move(1, pt(0.65, 0.65));
    assert_eq!(moved, vec![Action::ShapeDeleted { id: b_id }]);
    engine.on_pointer_up(1, pt(0.65, 0.65));
    assert!(engine.store.is_empty());
}

#[test]
fn erase_over_empty_space_does_nothing() {
    let (mut engine, _) = engine_with_square();
    engine.set_tool(Tool::Erase);
    let actions = engine.on_pointer_down(1, pt(0.05, 0.05), no_mods()).unwrap();
    assert!(actions.is_empty());
    assert_eq!(engine.store.len(), 1);
}

// =============================================================
// Cancellation and keyboard
// =============================================================

#[test]
fn cancel_drawing_discards_provisional_shape() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Rect);
    engine.on_pointer_down(1, pt(0.2, 0.2), no_mods()).unwrap();
    engine.on_pointer_move(1, pt(0.6, 0.6));
    engine.cancel_session();
    assert!(engine.store.is_empty());
    assert!(!engine.session_active());
}

#[test]
fn cancel_transform_restores_snapshot() {
    let (mut engine, id) = engine_with_square();
    let before = engine.store.read(&id).unwrap().clone();
    engine.select(vec![id.clone()]);
    engine.begin_move(1, pt(0.5, 0.5)).unwrap();
    engine.on_pointer_move(1, pt(0.9, 0.9));
    engine.cancel_session();
    assert_eq!(engine.store.read(&id).unwrap(), &before);
}

#[test]
fn escape_cancels_active_session() {
    let mut engine = Engine::new();
    engine.set_tool(Tool::Line);
    engine.on_pointer_down(1, pt(0.2, 0.2), no_mods()).unwrap();
    engine.on_key_down("Escape");
    assert!(!engine.session_active());
    assert!(engine.store.is_empty());
}

#[test]
fn delete_key_removes_selection_when_idle() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id.clone()]);
    let actions = engine.on_key_down("Delete");
    assert!(actions.contains(&Action::ShapeDeleted { id }));
    assert!(engine.store.is_empty());
}

#[test]
fn delete_key_ignored_mid_session() {
    let (mut engine, id) = engine_with_square();
    engine.select(vec![id.clone()]);
    engine.begin_move(1, pt(0.5, 0.5)).unwrap();
    assert!(engine.on_key_down("Backspace").is_empty());
    assert_eq!(engine.store.len(), 1);
    engine.on_pointer_up(1, pt(0.5, 0.5));
}

#[test]
fn unknown_key_is_ignored() {
    let (mut engine, _) = engine_with_square();
    assert!(engine.on_key_down("a").is_empty());
}
