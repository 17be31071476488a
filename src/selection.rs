//! Selection frame and snapshot-relative multi-shape transforms.
//!
//! The selection frame is a rotated bounding box over the world-space
//! vertices of every selected shape; it is the local coordinate system for
//! transform gestures. Move/rotate/scale are computed from a pre-gesture
//! snapshot on every update rather than accumulated incrementally, so a long
//! drag never drifts and cancellation restores the exact starting state via
//! a store [`Transaction`].

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::consts::{MIN_SHAPE_DIMENSION, ROTATION_SNAP};
use crate::geom::{self, Bounds, Point};
use crate::shape::{Shape, ShapeId, ShapeKind};
use crate::store::{ShapeStore, Transaction};

/// Rotated bounding box over the current selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionFrame {
    /// World-space center.
    pub center: Point,
    /// Extent along the frame's local x axis.
    pub width: f64,
    /// Extent along the frame's local y axis.
    pub height: f64,
    /// Frame rotation in radians.
    pub rotation: f64,
}

impl SelectionFrame {
    /// Map a world point into frame-local coordinates relative to the center.
    #[must_use]
    pub fn to_local(&self, p: Point) -> Point {
        let unrotated = p.rotate_about(self.center, -self.rotation);
        Point::new(unrotated.x - self.center.x, unrotated.y - self.center.y)
    }

    /// Map a frame-local (center-relative) point back into world space.
    #[must_use]
    pub fn from_local(&self, local: Point) -> Point {
        Point::new(self.center.x + local.x, self.center.y + local.y)
            .rotate_about(self.center, self.rotation)
    }
}

/// Compute the selection frame over `shapes` at the given frame rotation.
///
/// Every shape's world vertices are rotated by `-rotation`, the axis extents
/// taken in that rotated space, and the resulting center un-rotated back to
/// world space. Extents are floored at the minimum shape dimension. An empty
/// selection (or one with no vertices) yields `None`.
#[must_use]
pub fn selection_frame(shapes: &[&Shape], rotation: f64) -> Option<SelectionFrame> {
    let origin = Point::new(0.0, 0.0);
    let rotated: Vec<Point> = shapes
        .iter()
        .flat_map(|s| geom::shape_vertices(s))
        .map(|v| v.rotate_about(origin, -rotation))
        .collect();
    let bounds = Bounds::around(&rotated)?;
    let center = bounds.center().rotate_about(origin, rotation);
    Some(SelectionFrame {
        center,
        width: bounds.width().max(MIN_SHAPE_DIMENSION),
        height: bounds.height().max(MIN_SHAPE_DIMENSION),
        rotation,
    })
}

/// The frame rotation a selection carries: a single shape's own rotation, or
/// the explicitly accumulated rotation for multi-shape selections.
#[must_use]
pub fn frame_rotation(shapes: &[&Shape], accumulated: f64) -> f64 {
    match shapes {
        [only] => only.kind.rotation(),
        _ => accumulated,
    }
}

/// One of the eight scale handles on the selection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ScaleHandle {
    /// The handle's direction in frame-local units; y grows downward.
    #[must_use]
    pub fn unit(self) -> (i8, i8) {
        match self {
            Self::N => (0, -1),
            Self::Ne => (1, -1),
            Self::E => (1, 0),
            Self::Se => (1, 1),
            Self::S => (0, 1),
            Self::Sw => (-1, 1),
            Self::W => (-1, 0),
            Self::Nw => (-1, -1),
        }
    }
}

/// What a transform gesture does with pointer movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformKind {
    /// Translate by the raw pointer delta since gesture start.
    Move,
    /// Rotate about the frame center, optionally snapped to 15° steps.
    Rotate {
        /// Snap the rotation delta to 15° steps.
        snap: bool,
    },
    /// Scale about the anchor opposite the dragged handle.
    Scale {
        /// Which handle is being dragged.
        handle: ScaleHandle,
        /// Force `|scale_x| == |scale_y|` (shift held).
        aspect_locked: bool,
    },
}

/// An in-flight move/rotate/scale gesture over the current selection.
///
/// Holds the pre-gesture snapshot (shapes and frame); every [`update`]
/// recomputes all affected shapes from that snapshot. [`cancel`] rolls the
/// store back to the snapshot; [`commit`] keeps the current state.
///
/// [`update`]: TransformGesture::update
/// [`cancel`]: TransformGesture::cancel
/// [`commit`]: TransformGesture::commit
#[derive(Debug)]
pub struct TransformGesture {
    kind: TransformKind,
    start_pointer: Point,
    frame: SelectionFrame,
    tx: Transaction,
    rotation_delta: f64,
    current_frame: SelectionFrame,
}

impl TransformGesture {
    /// Begin a gesture over the shapes currently selected in `store`.
    ///
    /// Returns `None` for degenerate selections (no shapes, no extent); all
    /// transform operations are then no-ops by construction.
    #[must_use]
    pub fn begin(
        kind: TransformKind,
        pointer: Point,
        selected: &[ShapeId],
        frame_rot: f64,
        store: &ShapeStore,
    ) -> Option<Self> {
        let shapes: Vec<&Shape> = selected.iter().filter_map(|id| store.read(id)).collect();
        if shapes.is_empty() {
            return None;
        }
        let frame = selection_frame(&shapes, frame_rotation(&shapes, frame_rot))?;
        let tx = store.begin(selected.iter());
        Some(Self {
            kind,
            start_pointer: pointer,
            frame,
            tx,
            rotation_delta: 0.0,
            current_frame: frame,
        })
    }

    /// The pre-gesture frame snapshot.
    #[must_use]
    pub fn start_frame(&self) -> SelectionFrame {
        self.frame
    }

    /// The frame as of the latest update.
    #[must_use]
    pub fn current_frame(&self) -> SelectionFrame {
        self.current_frame
    }

    /// Rotation applied so far (zero for move/scale gestures).
    #[must_use]
    pub fn rotation_delta(&self) -> f64 {
        self.rotation_delta
    }

    /// Recompute every affected shape from the snapshot for the current
    /// pointer position and write the results to the store.
    pub fn update(&mut self, pointer: Point, store: &mut ShapeStore) {
        match self.kind {
            TransformKind::Move => self.update_move(pointer, store),
            TransformKind::Rotate { snap } => self.update_rotate(pointer, snap, store),
            TransformKind::Scale { handle, aspect_locked } => {
                self.update_scale(pointer, handle, aspect_locked, store);
            }
        }
    }

    /// Keep the transformed state. Returns the accumulated rotation delta so
    /// the caller can fold it into the selection's frame rotation.
    #[must_use]
    pub fn commit(self) -> f64 {
        let delta = self.rotation_delta;
        self.tx.commit();
        delta
    }

    /// Restore the exact pre-gesture snapshot.
    pub fn cancel(self, store: &mut ShapeStore) {
        self.tx.rollback(store);
    }

    fn update_move(&mut self, pointer: Point, store: &mut ShapeStore) {
        let dx = pointer.x - self.start_pointer.x;
        let dy = pointer.y - self.start_pointer.y;
        for snapshot in self.tx.snapshots() {
            let mut shape = snapshot.clone();
            translate_shape(&mut shape, dx, dy);
            store.write(shape);
        }
        self.current_frame = SelectionFrame {
            center: Point::new(self.frame.center.x + dx, self.frame.center.y + dy),
            ..self.frame
        };
    }

    fn update_rotate(&mut self, pointer: Point, snap: bool, store: &mut ShapeStore) {
        let center = self.frame.center;
        let start_angle = (self.start_pointer.y - center.y).atan2(self.start_pointer.x - center.x);
        let angle = (pointer.y - center.y).atan2(pointer.x - center.x);
        let mut delta = angle - start_angle;
        if snap {
            delta = (delta / ROTATION_SNAP).round() * ROTATION_SNAP;
        }
        for snapshot in self.tx.snapshots() {
            let mut shape = snapshot.clone();
            rotate_shape(&mut shape, center, delta);
            store.write(shape);
        }
        self.rotation_delta = delta;
        self.current_frame = SelectionFrame {
            rotation: self.frame.rotation + delta,
            ..self.frame
        };
    }

    fn update_scale(
        &mut self,
        pointer: Point,
        handle: ScaleHandle,
        aspect_locked: bool,
        store: &mut ShapeStore,
    ) {
        let frame = self.frame;
        let (ux, uy) = handle.unit();
        let handle_local = Point::new(
            f64::from(ux) * frame.width / 2.0,
            f64::from(uy) * frame.height / 2.0,
        );
        let anchor_local = Point::new(-handle_local.x, -handle_local.y);
        let pointer_local = frame.to_local(pointer);

        // Per-axis ratio of the dragged handle's travel; untouched axes stay 1.
        let mut sx = if ux == 0 {
            1.0
        } else {
            (pointer_local.x - anchor_local.x) / (handle_local.x - anchor_local.x)
        };
        let mut sy = if uy == 0 {
            1.0
        } else {
            (pointer_local.y - anchor_local.y) / (handle_local.y - anchor_local.y)
        };

        let floor_x = MIN_SHAPE_DIMENSION / frame.width;
        let floor_y = MIN_SHAPE_DIMENSION / frame.height;
        sx = floor_magnitude(sx, floor_x);
        sy = floor_magnitude(sy, floor_y);

        if aspect_locked {
            let magnitude = sx.abs().max(sy.abs()).max(floor_x).max(floor_y);
            sx = sx.signum() * magnitude;
            sy = sy.signum() * magnitude;
        }

        for snapshot in self.tx.snapshots() {
            let mut shape = snapshot.clone();
            scale_shape(&mut shape, &frame, anchor_local, sx, sy);
            store.write(shape);
        }

        let new_center_local =
            Point::new(anchor_local.x * (1.0 - sx), anchor_local.y * (1.0 - sy));
        self.current_frame = SelectionFrame {
            center: frame.from_local(new_center_local),
            width: (frame.width * sx.abs()).max(MIN_SHAPE_DIMENSION),
            height: (frame.height * sy.abs()).max(MIN_SHAPE_DIMENSION),
            rotation: frame.rotation,
        };
    }
}

/// Clamp a scale factor's magnitude to at least `floor`, preserving sign.
/// An exactly zero factor resolves to the positive floor.
fn floor_magnitude(s: f64, floor: f64) -> f64 {
    if s.abs() >= floor {
        return s;
    }
    let sign = if s == 0.0 { 1.0 } else { s.signum() };
    sign * floor
}

fn translate_shape(shape: &mut Shape, dx: f64, dy: f64) {
    match &mut shape.kind {
        ShapeKind::Rect { x, y, .. } | ShapeKind::Ellipse { x, y, .. } => {
            *x += dx;
            *y += dy;
        }
        ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } => {
            for p in points.iter_mut() {
                p.x += dx;
                p.y += dy;
            }
        }
    }
}

fn rotate_shape(shape: &mut Shape, pivot: Point, delta: f64) {
    match &mut shape.kind {
        ShapeKind::Rect { x, y, width, height, rotation }
        | ShapeKind::Ellipse { x, y, width, height, rotation } => {
            let center = Point::new(*x + *width / 2.0, *y + *height / 2.0);
            let new_center = center.rotate_about(pivot, delta);
            *x = new_center.x - *width / 2.0;
            *y = new_center.y - *height / 2.0;
            *rotation += delta;
        }
        ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } => {
            for p in points.iter_mut() {
                *p = p.rotate_about(pivot, delta);
            }
        }
    }
}

fn scale_shape(shape: &mut Shape, frame: &SelectionFrame, anchor_local: Point, sx: f64, sy: f64) {
    let scale_local = |p: Point| -> Point {
        let local = frame.to_local(p);
        let scaled = Point::new(
            anchor_local.x + (local.x - anchor_local.x) * sx,
            anchor_local.y + (local.y - anchor_local.y) * sy,
        );
        frame.from_local(scaled)
    };
    match &mut shape.kind {
        ShapeKind::Rect { x, y, width, height, rotation }
        | ShapeKind::Ellipse { x, y, width, height, rotation } => {
            let center = Point::new(*x + *width / 2.0, *y + *height / 2.0);
            let new_center = scale_local(center);
            // Work in frame-relative terms so a rotated frame scales the
            // shape along the frame's axes, not the world's.
            let rel = *rotation - frame.rotation;
            let (sin, cos) = rel.sin_cos();
            let new_rel = (sy * sin).atan2(sx * cos);
            let new_width = *width * ((sx * cos).powi(2) + (sy * sin).powi(2)).sqrt();
            let new_height = *height * ((sx * sin).powi(2) + (sy * cos).powi(2)).sqrt();
            *rotation = new_rel + frame.rotation;
            *width = new_width.max(MIN_SHAPE_DIMENSION);
            *height = new_height.max(MIN_SHAPE_DIMENSION);
            *x = new_center.x - *width / 2.0;
            *y = new_center.y - *height / 2.0;
        }
        ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } => {
            for p in points.iter_mut() {
                *p = scale_local(*p);
            }
        }
    }
}

/// How a marquee result combines with the existing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarqueeMode {
    /// Selection becomes exactly the marquee hits.
    #[default]
    Replace,
    /// Marquee hits are added to the selection.
    Extend,
    /// Marquee hits are removed from the selection.
    Subtract,
}

/// Resolve a marquee rectangle against every shape's bounding box and
/// combine with the current selection per `mode`. Order follows the store's
/// z-order for newly selected ids.
#[must_use]
pub fn marquee_select(
    store: &ShapeStore,
    marquee: Bounds,
    mode: MarqueeMode,
    current: &[ShapeId],
) -> Vec<ShapeId> {
    let hits: Vec<ShapeId> = store
        .list()
        .into_iter()
        .filter(|s| marquee.intersects(&geom::bounds_of(s)))
        .map(|s| s.id.clone())
        .collect();
    match mode {
        MarqueeMode::Replace => hits,
        MarqueeMode::Extend => {
            let mut out = current.to_vec();
            for id in hits {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
            out
        }
        MarqueeMode::Subtract => {
            current.iter().filter(|id| !hits.contains(id)).cloned().collect()
        }
    }
}
