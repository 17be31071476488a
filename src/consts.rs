//! Shared numeric constants for the motionboard crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width/height a shape may carry. Clamping here keeps later
/// divisions (normalized metrics, scale ratios) away from zero.
pub const MIN_SHAPE_DIMENSION: f64 = 0.001;

/// Number of polygon vertices used to approximate an ellipse outline.
pub const ELLIPSE_VERTEX_COUNT: usize = 16;

/// Epsilon below which two coordinates are treated as coincident.
pub const GEOM_EPSILON: f64 = 1e-9;

// ── Hit-testing & drawing ───────────────────────────────────────

/// Unit-square hit slop for selecting thin lines and open paths.
pub const HIT_TOLERANCE: f64 = 0.01;

/// Douglas-Peucker tolerance applied to freehand paths on commit.
pub const SIMPLIFY_TOLERANCE: f64 = 0.003;

/// Minimum number of points a committed freehand path must keep.
pub const MIN_PATH_POINTS: usize = 2;

// ── Transforms ──────────────────────────────────────────────────

/// Rotation snap step (15 degrees) when snapping is requested.
pub const ROTATION_SNAP: f64 = std::f64::consts::PI / 12.0;

// ── Runtime ─────────────────────────────────────────────────────

/// Minimum milliseconds between repeated firings of an `inside` trigger.
pub const INSIDE_RETRIGGER_MS: f64 = 120.0;
