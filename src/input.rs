//! Input model: tools, modifier keys, and the editing-session state machine.
//!
//! The editing engine owns at most one active session at a time, bound to a
//! single pointer id for its whole lifetime; attempts to start a second
//! session are rejected with [`SessionError::Busy`]. Each session variant
//! carries the context needed to recompute state from its starting snapshot
//! on every pointer move and to restore it exactly on cancel.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use thiserror::Error;

use crate::geom::Point;
use crate::selection::{MarqueeMode, TransformGesture};
use crate::shape::ShapeId;
use crate::store::Transaction;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Draw a rectangle.
    Rect,
    /// Draw an ellipse.
    Ellipse,
    /// Draw a straight line segment.
    Line,
    /// Draw a freehand path.
    Path,
    /// Erase shapes under the pointer.
    Erase,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// Identifier of the pointer driving a session (mouse, touch, pen).
pub type PointerId = u32;

/// Why a session could not be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Another editing session is already active.
    #[error("another editing session is already active")]
    Busy,
    /// The session's target shape does not exist.
    #[error("unknown shape: {0}")]
    UnknownShape(ShapeId),
}

/// The body of an active editing session.
#[derive(Debug)]
pub enum Session {
    /// Sizing a new rect/ellipse by dragging from an anchor corner.
    DrawingBox {
        /// Id of the provisional shape being sized.
        id: ShapeId,
        /// The corner where the drag started.
        anchor: Point,
    },
    /// Dragging out the second endpoint of a new line.
    DrawingLine {
        /// Id of the provisional line.
        id: ShapeId,
        /// First endpoint.
        anchor: Point,
    },
    /// Accumulating raw freehand points; simplified on commit.
    DrawingPath {
        /// Id of the provisional path.
        id: ShapeId,
        /// Raw pointer samples collected so far.
        points: Vec<Point>,
    },
    /// A move/rotate/scale gesture over the selection.
    Transforming(TransformGesture),
    /// Dragging out a marquee selection rectangle.
    Marquee {
        /// World position where the marquee started.
        start: Point,
        /// How the result combines with the existing selection.
        mode: MarqueeMode,
    },
    /// Dragging one vertex of a line/path shape.
    VertexEdit {
        /// Shape whose vertex is being dragged.
        id: ShapeId,
        /// Index of the dragged vertex.
        index: usize,
        /// Pre-gesture snapshot for cancellation.
        tx: Transaction,
    },
    /// Removing shapes under the pointer while held.
    Erasing,
}

/// A session bound to the pointer that started it.
#[derive(Debug)]
pub struct ActiveSession {
    /// The pointer exclusively driving this session.
    pub pointer_id: PointerId,
    /// The session body.
    pub session: Session,
}
