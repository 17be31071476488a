//! Shape model: vector shapes, their styles, and the JSON wire shape.
//!
//! This module defines the core data types that describe what is on the
//! canvas (`Shape`, `ShapeKind`, `ShapeStyle`). All coordinates live in the
//! unit square `[0,1]` independent of device pixels. Data flows into this
//! layer from import/persistence (JSON deserialization) and from the editing
//! engine (mutations through the store). The interaction runtime reads
//! shapes as immutable snapshots.
//!
//! Missing wire fields fall back to safe defaults rather than erroring:
//! geometry fields default to zero (a zero-size shape at the origin),
//! `points` to empty, `rotation` to `0`, `closed` to `false`, and style to
//! the default stroke/fill/width triple.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::MIN_SHAPE_DIMENSION;
use crate::event::Interaction;
use crate::geom::Point;

/// Stable opaque identifier for a shape. Survives every edit; minted once at
/// creation and never reassigned.
pub type ShapeId = String;

/// Mint a fresh shape (or event) id.
#[must_use]
pub fn new_id() -> ShapeId {
    Uuid::new_v4().to_string()
}

/// Visual style carried by every shape. The core never interprets the color
/// strings; they ride along for the external renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Stroke color as a CSS color string.
    #[serde(default = "default_stroke")]
    pub stroke: String,
    /// Fill color as a CSS color string.
    #[serde(default = "default_fill")]
    pub fill: String,
    /// Stroke width in unit-square units.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

fn default_stroke() -> String {
    "#ffffff".to_string()
}

fn default_fill() -> String {
    "transparent".to_string()
}

fn default_stroke_width() -> f64 {
    0.003
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke: default_stroke(),
            fill: default_fill(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// The geometric payload of a shape, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis box rotated about its center.
    Rect {
        /// Left edge of the unrotated bounding box.
        #[serde(default)]
        x: f64,
        /// Top edge of the unrotated bounding box.
        #[serde(default)]
        y: f64,
        /// Width of the unrotated bounding box.
        #[serde(default)]
        width: f64,
        /// Height of the unrotated bounding box.
        #[serde(default)]
        height: f64,
        /// Counter-clockwise rotation in radians about the box center.
        #[serde(default)]
        rotation: f64,
    },
    /// Ellipse inscribed in a rotated bounding box.
    Ellipse {
        /// Left edge of the unrotated bounding box.
        #[serde(default)]
        x: f64,
        /// Top edge of the unrotated bounding box.
        #[serde(default)]
        y: f64,
        /// Width of the unrotated bounding box.
        #[serde(default)]
        width: f64,
        /// Height of the unrotated bounding box.
        #[serde(default)]
        height: f64,
        /// Counter-clockwise rotation in radians about the box center.
        #[serde(default)]
        rotation: f64,
    },
    /// Straight polyline between explicit vertices.
    Line {
        /// Ordered vertices.
        #[serde(default)]
        points: Vec<Point>,
        /// Whether the last point connects back to the first.
        #[serde(default)]
        closed: bool,
    },
    /// Freehand path; same payload as `Line` but drawn/simplified differently.
    Path {
        /// Ordered vertices.
        #[serde(default)]
        points: Vec<Point>,
        /// Whether the last point connects back to the first.
        #[serde(default)]
        closed: bool,
    },
}

impl ShapeKind {
    /// The ordered vertex list for line/path kinds, `None` for rect/ellipse.
    #[must_use]
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            Self::Line { points, .. } | Self::Path { points, .. } => Some(points),
            _ => None,
        }
    }

    /// Whether a line/path kind is closed. Rect/ellipse are always closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Rect { .. } | Self::Ellipse { .. } => true,
            Self::Line { closed, .. } | Self::Path { closed, .. } => *closed,
        }
    }

    /// Rotation in radians. Line/path kinds carry rotation in their vertices.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        match self {
            Self::Rect { rotation, .. } | Self::Ellipse { rotation, .. } => *rotation,
            _ => 0.0,
        }
    }
}

/// A shape as stored in the repository and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Stable opaque identifier.
    pub id: ShapeId,
    /// Optional user-facing label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Visual style, defaulted when absent on the wire.
    #[serde(default)]
    pub style: ShapeStyle,
    /// Mapping configuration binding this shape to a signal source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    /// Geometric payload, tagged by `type`.
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    /// Build a rect shape with a fresh id and default style.
    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: new_id(),
            name: None,
            style: ShapeStyle::default(),
            interaction: None,
            kind: ShapeKind::Rect { x, y, width, height, rotation: 0.0 },
        }
    }

    /// Build an ellipse shape with a fresh id and default style.
    #[must_use]
    pub fn ellipse(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: new_id(),
            name: None,
            style: ShapeStyle::default(),
            interaction: None,
            kind: ShapeKind::Ellipse { x, y, width, height, rotation: 0.0 },
        }
    }

    /// Build a line shape with a fresh id and default style.
    #[must_use]
    pub fn line(points: Vec<Point>) -> Self {
        Self {
            id: new_id(),
            name: None,
            style: ShapeStyle::default(),
            interaction: None,
            kind: ShapeKind::Line { points, closed: false },
        }
    }

    /// Build an open freehand path with a fresh id and default style.
    #[must_use]
    pub fn path(points: Vec<Point>) -> Self {
        Self {
            id: new_id(),
            name: None,
            style: ShapeStyle::default(),
            interaction: None,
            kind: ShapeKind::Path { points, closed: false },
        }
    }

    /// Restore invariants after an edit: coordinates clamped to `[0,1]`,
    /// width/height floored at [`MIN_SHAPE_DIMENSION`], and the first/last
    /// vertex kept coincident when closed. Idempotent.
    pub fn canonicalize(&mut self) {
        match &mut self.kind {
            ShapeKind::Rect { x, y, width, height, .. }
            | ShapeKind::Ellipse { x, y, width, height, .. } => {
                *width = width.max(MIN_SHAPE_DIMENSION);
                *height = height.max(MIN_SHAPE_DIMENSION);
                *x = x.clamp(0.0, 1.0);
                *y = y.clamp(0.0, 1.0);
            }
            ShapeKind::Line { points, closed } | ShapeKind::Path { points, closed } => {
                for p in points.iter_mut() {
                    *p = p.clamp_unit();
                }
                if *closed {
                    if let Some(&first) = points.first() {
                        if let Some(last) = points.last_mut() {
                            *last = first;
                        }
                    }
                }
            }
        }
    }

    /// Whether the runtime should evaluate this shape at all.
    #[must_use]
    pub fn mapping_enabled(&self) -> bool {
        self.interaction.as_ref().is_some_and(|i| i.enabled)
    }
}

/// Parse a shape document (JSON array of shapes) with per-field defaulting.
///
/// # Errors
///
/// Returns the underlying serde error when the document is not a JSON array
/// of objects at all; individual missing fields never error.
pub fn parse_document(json: &str) -> Result<Vec<Shape>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a shape document to JSON.
///
/// # Errors
///
/// Returns the underlying serde error (practically unreachable for this
/// model).
pub fn write_document(shapes: &[Shape]) -> Result<String, serde_json::Error> {
    serde_json::to_string(shapes)
}
