//! Editing engine: pointer/keyboard handlers and session lifecycle.
//!
//! `Engine` owns the shape store, the current selection, the active tool,
//! and the single editing-session slot. Raw input arrives already normalized
//! to unit-square coordinates (screen mapping is the host's concern); the
//! engine turns it into store mutations and returns [`Action`] values for
//! the host to persist, render, or relay.
//!
//! Exactly one session (draw, transform, marquee, vertex edit, erase) may be
//! active at a time, bound to the pointer that started it. Cancellation
//! restores the pre-session state through store transactions; the caller
//! only observes a state-unchanged outcome.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use crate::consts::{HIT_TOLERANCE, MIN_PATH_POINTS, MIN_SHAPE_DIMENSION, SIMPLIFY_TOLERANCE};
use crate::geom::{self, Bounds, Point};
use crate::input::{ActiveSession, Modifiers, PointerId, Session, SessionError, Tool};
use crate::selection::{
    self, MarqueeMode, ScaleHandle, SelectionFrame, TransformGesture, TransformKind,
};
use crate::shape::{Shape, ShapeId, ShapeKind};
use crate::store::ShapeStore;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new shape was committed to the store.
    ShapeCreated(Shape),
    /// An existing shape's geometry or fields changed.
    ShapeUpdated {
        /// Id of the updated shape.
        id: ShapeId,
    },
    /// A shape was removed from the store.
    ShapeDeleted {
        /// Id of the removed shape.
        id: ShapeId,
    },
    /// The selection set changed.
    SelectionChanged {
        /// The new selection, in store z-order.
        selected: Vec<ShapeId>,
    },
    /// Transient state changed; the host should redraw.
    RenderNeeded,
}

/// The editing engine. See the module docs for the ownership picture.
#[derive(Debug, Default)]
pub struct Engine {
    /// Canonical shape state. Read-only snapshots may be taken freely; all
    /// mutation goes through the engine or explicit store calls.
    pub store: ShapeStore,
    selected: Vec<ShapeId>,
    frame_rotation: f64,
    tool: Tool,
    session: Option<ActiveSession>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ─────────────────────────────────────────────────

    /// The active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Ids of the currently selected shapes, in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ShapeId] {
        &self.selected
    }

    /// Whether an editing session is currently active.
    #[must_use]
    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// The selection frame: the live gesture frame while transforming,
    /// otherwise recomputed from the selected shapes. `None` when nothing is
    /// selected.
    #[must_use]
    pub fn selection_frame(&self) -> Option<SelectionFrame> {
        if let Some(active) = &self.session {
            if let Session::Transforming(gesture) = &active.session {
                return Some(gesture.current_frame());
            }
        }
        let shapes: Vec<&Shape> =
            self.selected.iter().filter_map(|id| self.store.read(id)).collect();
        if shapes.is_empty() {
            return None;
        }
        selection::selection_frame(&shapes, selection::frame_rotation(&shapes, self.frame_rotation))
    }

    /// The topmost shape containing `point`, scanning back-to-front.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<&Shape> {
        self.store
            .list()
            .into_iter()
            .rev()
            .find(|s| geom::contains_point(s, point, HIT_TOLERANCE))
    }

    // ── Tool / selection ────────────────────────────────────────

    /// Set the active tool.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Replace the selection. Unknown ids are dropped; the accumulated
    /// multi-select frame rotation resets.
    pub fn select(&mut self, ids: Vec<ShapeId>) -> Action {
        self.selected = ids.into_iter().filter(|id| self.store.read(id).is_some()).collect();
        self.frame_rotation = 0.0;
        Action::SelectionChanged { selected: self.selected.clone() }
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) -> Action {
        self.selected.clear();
        self.frame_rotation = 0.0;
        Action::SelectionChanged { selected: Vec::new() }
    }

    /// Delete every selected shape.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let ids = std::mem::take(&mut self.selected);
        let mut actions = Vec::new();
        for id in ids {
            if self.store.remove(&id).is_some() {
                actions.push(Action::ShapeDeleted { id });
            }
        }
        self.frame_rotation = 0.0;
        actions.push(Action::SelectionChanged { selected: Vec::new() });
        actions
    }

    // ── Explicit transform sessions (host hit its own handle UI) ─

    /// Begin a move gesture over the current selection.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] when another session is active.
    pub fn begin_move(&mut self, pointer_id: PointerId, pointer: Point) -> Result<(), SessionError> {
        self.begin_transform(pointer_id, pointer, TransformKind::Move)
    }

    /// Begin a rotate gesture over the current selection.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] when another session is active.
    pub fn begin_rotate(
        &mut self,
        pointer_id: PointerId,
        pointer: Point,
        snap: bool,
    ) -> Result<(), SessionError> {
        self.begin_transform(pointer_id, pointer, TransformKind::Rotate { snap })
    }

    /// Begin a scale gesture over the current selection.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] when another session is active.
    pub fn begin_scale(
        &mut self,
        pointer_id: PointerId,
        pointer: Point,
        handle: ScaleHandle,
        aspect_locked: bool,
    ) -> Result<(), SessionError> {
        self.begin_transform(pointer_id, pointer, TransformKind::Scale { handle, aspect_locked })
    }

    /// Begin a vertex-edit gesture on one vertex of a line/path shape.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] when another session is active;
    /// [`SessionError::UnknownShape`] when the shape does not exist.
    pub fn begin_vertex_edit(
        &mut self,
        pointer_id: PointerId,
        shape_id: &str,
        index: usize,
    ) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let id = shape_id.to_string();
        if self.store.read(&id).is_none() {
            return Err(SessionError::UnknownShape(id));
        }
        let tx = self.store.begin(std::iter::once(&id));
        self.session = Some(ActiveSession {
            pointer_id,
            session: Session::VertexEdit { id, index, tx },
        });
        Ok(())
    }

    fn begin_transform(
        &mut self,
        pointer_id: PointerId,
        pointer: Point,
        kind: TransformKind,
    ) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let Some(gesture) =
            TransformGesture::begin(kind, pointer, &self.selected, self.frame_rotation, &self.store)
        else {
            // Degenerate selection: transforms are no-ops, not errors.
            return Ok(());
        };
        self.session = Some(ActiveSession { pointer_id, session: Session::Transforming(gesture) });
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.session.is_some() {
            tracing::debug!("session start rejected: slot busy");
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    // ── Pointer handlers ────────────────────────────────────────

    /// Handle a pointer-down in unit-square coordinates.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] when another session is already active.
    pub fn on_pointer_down(
        &mut self,
        pointer_id: PointerId,
        point: Point,
        modifiers: Modifiers,
    ) -> Result<Vec<Action>, SessionError> {
        self.ensure_idle()?;
        match self.tool {
            Tool::Select => Ok(self.select_pointer_down(pointer_id, point, modifiers)),
            Tool::Rect | Tool::Ellipse => {
                let shape = if self.tool == Tool::Rect {
                    Shape::rect(point.x, point.y, MIN_SHAPE_DIMENSION, MIN_SHAPE_DIMENSION)
                } else {
                    Shape::ellipse(point.x, point.y, MIN_SHAPE_DIMENSION, MIN_SHAPE_DIMENSION)
                };
                let id = shape.id.clone();
                self.store.write(shape);
                self.session = Some(ActiveSession {
                    pointer_id,
                    session: Session::DrawingBox { id, anchor: point },
                });
                Ok(vec![Action::RenderNeeded])
            }
            Tool::Line => {
                let shape = Shape::line(vec![point, point]);
                let id = shape.id.clone();
                self.store.write(shape);
                self.session = Some(ActiveSession {
                    pointer_id,
                    session: Session::DrawingLine { id, anchor: point },
                });
                Ok(vec![Action::RenderNeeded])
            }
            Tool::Path => {
                let shape = Shape::path(vec![point]);
                let id = shape.id.clone();
                self.store.write(shape);
                self.session = Some(ActiveSession {
                    pointer_id,
                    session: Session::DrawingPath { id, points: vec![point] },
                });
                Ok(vec![Action::RenderNeeded])
            }
            Tool::Erase => {
                self.session = Some(ActiveSession { pointer_id, session: Session::Erasing });
                Ok(self.erase_at(point))
            }
        }
    }

    fn select_pointer_down(
        &mut self,
        pointer_id: PointerId,
        point: Point,
        modifiers: Modifiers,
    ) -> Vec<Action> {
        let hit = self.hit_test(point).map(|s| s.id.clone());
        match hit {
            Some(id) => {
                let mut actions = Vec::new();
                if modifiers.shift {
                    // Toggle membership; no drag session on shift-click.
                    if let Some(pos) = self.selected.iter().position(|s| s == &id) {
                        self.selected.remove(pos);
                    } else {
                        self.selected.push(id);
                    }
                    self.frame_rotation = 0.0;
                    actions.push(Action::SelectionChanged { selected: self.selected.clone() });
                    return actions;
                }
                if !self.selected.contains(&id) {
                    actions.push(self.select(vec![id]));
                }
                // Dragging the body starts a move; ensure_idle already ran.
                if self.begin_transform(pointer_id, point, TransformKind::Move).is_err() {
                    tracing::debug!("move session rejected after selection");
                }
                actions
            }
            None => {
                let mode = if modifiers.shift {
                    MarqueeMode::Extend
                } else if modifiers.alt {
                    MarqueeMode::Subtract
                } else {
                    MarqueeMode::Replace
                };
                self.session = Some(ActiveSession {
                    pointer_id,
                    session: Session::Marquee { start: point, mode },
                });
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Handle a pointer-move. Events from pointers other than the session's
    /// owner are ignored.
    pub fn on_pointer_move(&mut self, pointer_id: PointerId, point: Point) -> Vec<Action> {
        let Some(active) = self.session.as_mut() else {
            return Vec::new();
        };
        if active.pointer_id != pointer_id {
            return Vec::new();
        }
        match &mut active.session {
            Session::DrawingBox { id, anchor } => {
                let id = id.clone();
                let anchor = *anchor;
                self.resize_box(&id, anchor, point);
                vec![Action::RenderNeeded]
            }
            Session::DrawingLine { id, anchor } => {
                let id = id.clone();
                let anchor = *anchor;
                if let Some(mut shape) = self.store.read(&id).cloned() {
                    if let ShapeKind::Line { points, .. } = &mut shape.kind {
                        *points = vec![anchor, point];
                    }
                    self.store.write(shape);
                }
                vec![Action::RenderNeeded]
            }
            Session::DrawingPath { id, points } => {
                points.push(point);
                let id = id.clone();
                let raw = points.clone();
                if let Some(mut shape) = self.store.read(&id).cloned() {
                    if let ShapeKind::Path { points, .. } = &mut shape.kind {
                        *points = raw;
                    }
                    self.store.write(shape);
                }
                vec![Action::RenderNeeded]
            }
            Session::Transforming(gesture) => {
                gesture.update(point, &mut self.store);
                vec![Action::RenderNeeded]
            }
            Session::Marquee { .. } => vec![Action::RenderNeeded],
            Session::VertexEdit { id, index, .. } => {
                let id = id.clone();
                let index = *index;
                if let Some(mut shape) = self.store.read(&id).cloned() {
                    if let ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } =
                        &mut shape.kind
                    {
                        if let Some(p) = points.get_mut(index) {
                            *p = point;
                        }
                    }
                    self.store.write(shape);
                }
                vec![Action::RenderNeeded]
            }
            Session::Erasing => self.erase_at(point),
        }
    }

    /// Handle a pointer-up: commit the session owned by this pointer.
    pub fn on_pointer_up(&mut self, pointer_id: PointerId, point: Point) -> Vec<Action> {
        if self.session.as_ref().is_none_or(|a| a.pointer_id != pointer_id) {
            return Vec::new();
        }
        let Some(active) = self.session.take() else {
            return Vec::new();
        };
        match active.session {
            Session::DrawingBox { id, anchor } => self.commit_box(&id, anchor, point),
            Session::DrawingLine { id, anchor } => self.commit_line(&id, anchor, point),
            Session::DrawingPath { id, points } => self.commit_path(&id, &points),
            Session::Transforming(mut gesture) => {
                gesture.update(point, &mut self.store);
                let ids = self.selected.clone();
                self.frame_rotation += gesture.commit();
                ids.into_iter().map(|id| Action::ShapeUpdated { id }).collect()
            }
            Session::Marquee { start, mode } => {
                let marquee = Bounds {
                    min_x: start.x.min(point.x),
                    min_y: start.y.min(point.y),
                    max_x: start.x.max(point.x),
                    max_y: start.y.max(point.y),
                };
                let next = selection::marquee_select(&self.store, marquee, mode, &self.selected);
                self.selected = next;
                self.frame_rotation = 0.0;
                vec![Action::SelectionChanged { selected: self.selected.clone() }]
            }
            Session::VertexEdit { id, tx, .. } => {
                tx.commit();
                vec![Action::ShapeUpdated { id }]
            }
            Session::Erasing => vec![Action::RenderNeeded],
        }
    }

    /// Cancel the active session, restoring the exact pre-session state.
    /// A no-op when no session is active.
    pub fn cancel_session(&mut self) -> Vec<Action> {
        let Some(active) = self.session.take() else {
            return Vec::new();
        };
        match active.session {
            Session::DrawingBox { id, .. }
            | Session::DrawingLine { id, .. }
            | Session::DrawingPath { id, .. } => {
                // A provisional shape that never committed simply disappears.
                self.store.remove(&id);
            }
            Session::Transforming(gesture) => gesture.cancel(&mut self.store),
            Session::VertexEdit { tx, .. } => tx.rollback(&mut self.store),
            Session::Marquee { .. } | Session::Erasing => {}
        }
        vec![Action::RenderNeeded]
    }

    // ── Keyboard ────────────────────────────────────────────────

    /// Handle a key-down. `Delete`/`Backspace` remove the selection;
    /// `Escape` cancels the active session.
    pub fn on_key_down(&mut self, key: &str) -> Vec<Action> {
        match key {
            "Delete" | "Backspace" => {
                if self.session.is_some() {
                    return Vec::new();
                }
                self.delete_selected()
            }
            "Escape" => self.cancel_session(),
            _ => Vec::new(),
        }
    }

    // ── Session helpers ─────────────────────────────────────────

    fn resize_box(&mut self, id: &str, anchor: Point, point: Point) {
        if let Some(mut shape) = self.store.read(id).cloned() {
            if let ShapeKind::Rect { x, y, width, height, .. }
            | ShapeKind::Ellipse { x, y, width, height, .. } = &mut shape.kind
            {
                *x = anchor.x.min(point.x);
                *y = anchor.y.min(point.y);
                *width = (anchor.x - point.x).abs();
                *height = (anchor.y - point.y).abs();
            }
            self.store.write(shape);
        }
    }

    fn commit_box(&mut self, id: &str, anchor: Point, point: Point) -> Vec<Action> {
        let dx = (anchor.x - point.x).abs();
        let dy = (anchor.y - point.y).abs();
        if dx.max(dy) < MIN_SHAPE_DIMENSION {
            self.store.remove(id);
            return vec![Action::RenderNeeded];
        }
        self.resize_box(id, anchor, point);
        self.created_action(id)
    }

    fn commit_line(&mut self, id: &str, anchor: Point, point: Point) -> Vec<Action> {
        if anchor.dist_sq(point).sqrt() < MIN_SHAPE_DIMENSION {
            self.store.remove(id);
            return vec![Action::RenderNeeded];
        }
        if let Some(mut shape) = self.store.read(id).cloned() {
            if let ShapeKind::Line { points, .. } = &mut shape.kind {
                *points = vec![anchor, point];
            }
            self.store.write(shape);
        }
        self.created_action(id)
    }

    fn commit_path(&mut self, id: &str, raw: &[Point]) -> Vec<Action> {
        let simplified = geom::simplify(raw, SIMPLIFY_TOLERANCE);
        let length: f64 = simplified
            .windows(2)
            .map(|pair| pair[0].dist_sq(pair[1]).sqrt())
            .sum();
        if simplified.len() < MIN_PATH_POINTS || length < MIN_SHAPE_DIMENSION {
            self.store.remove(id);
            return vec![Action::RenderNeeded];
        }
        if let Some(mut shape) = self.store.read(id).cloned() {
            if let ShapeKind::Path { points, .. } = &mut shape.kind {
                *points = simplified;
            }
            self.store.write(shape);
        }
        self.created_action(id)
    }

    fn created_action(&self, id: &str) -> Vec<Action> {
        match self.store.read(id) {
            Some(shape) => vec![Action::ShapeCreated(shape.clone())],
            None => vec![Action::RenderNeeded],
        }
    }

    fn erase_at(&mut self, point: Point) -> Vec<Action> {
        let hit = self.hit_test(point).map(|s| s.id.clone());
        let Some(id) = hit else {
            return Vec::new();
        };
        self.store.remove(&id);
        self.selected.retain(|s| s != &id);
        vec![Action::ShapeDeleted { id }]
    }
}
