//! Pure geometry: containment, bounds, simplification, and smoothing.
//!
//! Every function here is side-effect-free and owns no state. Coordinates
//! live in the unit square `[0,1]`. Rect and ellipse tests rotate the query
//! point into the shape's local (unrotated) frame rather than rotating the
//! shape; polyline tests work on the raw vertex list.
//!
//! Degenerate inputs (zero extents, coincident points) are epsilon-clamped
//! so no NaN or infinity ever escapes into later math.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::consts::{ELLIPSE_VERTEX_COUNT, GEOM_EPSILON, MIN_SHAPE_DIMENSION};
use crate::shape::{Shape, ShapeKind};

/// A point in unit-square canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point rotated by `angle` radians about `center`.
    #[must_use]
    pub fn rotate_about(self, center: Point, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Self {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }

    /// This point clamped into the unit square.
    #[must_use]
    pub fn clamp_unit(self) -> Self {
        Self { x: self.x.clamp(0.0, 1.0), y: self.y.clamp(0.0, 1.0) }
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn dist_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Linear interpolation toward `other` by `t`.
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// The tight box around a non-empty point set; `None` for an empty set.
    #[must_use]
    pub fn around(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut b = Self { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in &points[1..] {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Whether two boxes overlap (touching edges count as overlapping).
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Whether a point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// The center of a rect/ellipse bounding box, or the vertex centroid-box
/// center for line/path shapes.
#[must_use]
pub fn shape_center(shape: &Shape) -> Point {
    match &shape.kind {
        ShapeKind::Rect { x, y, width, height, .. }
        | ShapeKind::Ellipse { x, y, width, height, .. } => {
            Point::new(x + width / 2.0, y + height / 2.0)
        }
        ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } => {
            Bounds::around(points).map_or(Point::default(), |b| b.center())
        }
    }
}

/// World-space vertices of a shape: rect → 4 rotated corners, ellipse →
/// fixed-count rotated polygon approximation, line/path → the raw point list.
#[must_use]
pub fn shape_vertices(shape: &Shape) -> Vec<Point> {
    match &shape.kind {
        ShapeKind::Rect { x, y, width, height, rotation } => {
            let center = Point::new(x + width / 2.0, y + height / 2.0);
            [
                Point::new(*x, *y),
                Point::new(x + width, *y),
                Point::new(x + width, y + height),
                Point::new(*x, y + height),
            ]
            .iter()
            .map(|p| p.rotate_about(center, *rotation))
            .collect()
        }
        ShapeKind::Ellipse { x, y, width, height, rotation } => {
            let center = Point::new(x + width / 2.0, y + height / 2.0);
            let hw = width / 2.0;
            let hh = height / 2.0;
            (0..ELLIPSE_VERTEX_COUNT)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let angle = std::f64::consts::TAU * i as f64 / ELLIPSE_VERTEX_COUNT as f64;
                    Point::new(center.x + hw * angle.cos(), center.y + hh * angle.sin())
                        .rotate_about(center, *rotation)
                })
                .collect()
        }
        ShapeKind::Line { points, .. } | ShapeKind::Path { points, .. } => points.clone(),
    }
}

/// Axis-aligned bounding box of a shape's world-space vertices.
/// Degenerate shapes (no vertices) collapse to a zero box at the origin.
#[must_use]
pub fn bounds_of(shape: &Shape) -> Bounds {
    Bounds::around(&shape_vertices(shape)).unwrap_or(Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    })
}

/// Squared distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn point_segment_dist_sq(p: Point, a: Point, b: Point) -> f64 {
    let len_sq = a.dist_sq(b);
    if len_sq < GEOM_EPSILON {
        return p.dist_sq(a);
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq;
    let t = t.clamp(0.0, 1.0);
    p.dist_sq(a.lerp(b, t))
}

/// Ray-casting polygon containment over an ordered vertex list.
#[must_use]
pub fn polygon_contains(points: &[Point], p: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Minimum squared distance from `p` to the polyline's segments, including
/// the closing segment when `closed`.
#[must_use]
pub fn polyline_dist_sq(points: &[Point], p: Point, closed: bool) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.dist_sq(*only),
        _ => {
            let mut best = f64::INFINITY;
            for pair in points.windows(2) {
                best = best.min(point_segment_dist_sq(p, pair[0], pair[1]));
            }
            if closed {
                if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                    best = best.min(point_segment_dist_sq(p, last, first));
                }
            }
            best
        }
    }
}

/// Whether `point` hits the shape.
///
/// Rect/ellipse rotate the query point into the shape's local frame and test
/// the unrotated extents; `tolerance` is ignored for them. Closed line/path
/// hits on ray-cast containment or boundary proximity within `tolerance`;
/// open line/path hits on segment proximity within `tolerance` only.
#[must_use]
pub fn contains_point(shape: &Shape, point: Point, tolerance: f64) -> bool {
    match &shape.kind {
        ShapeKind::Rect { x, y, width, height, rotation } => {
            let center = Point::new(x + width / 2.0, y + height / 2.0);
            let local = point.rotate_about(center, -rotation);
            let hw = (width / 2.0).max(MIN_SHAPE_DIMENSION / 2.0);
            let hh = (height / 2.0).max(MIN_SHAPE_DIMENSION / 2.0);
            (local.x - center.x).abs() <= hw && (local.y - center.y).abs() <= hh
        }
        ShapeKind::Ellipse { x, y, width, height, rotation } => {
            let center = Point::new(x + width / 2.0, y + height / 2.0);
            let local = point.rotate_about(center, -rotation);
            let hw = (width / 2.0).max(MIN_SHAPE_DIMENSION / 2.0);
            let hh = (height / 2.0).max(MIN_SHAPE_DIMENSION / 2.0);
            let nx = (local.x - center.x) / hw;
            let ny = (local.y - center.y) / hh;
            nx * nx + ny * ny <= 1.0
        }
        ShapeKind::Line { points, closed } | ShapeKind::Path { points, closed } => {
            let near = polyline_dist_sq(points, point, *closed) <= tolerance * tolerance;
            if *closed {
                near || polygon_contains(points, point)
            } else {
                near
            }
        }
    }
}

/// Squared perpendicular distance used by Douglas-Peucker.
fn perp_dist_sq(p: Point, a: Point, b: Point) -> f64 {
    point_segment_dist_sq(p, a, b)
}

/// Two-pass polyline simplification: a radial pre-filter dropping points
/// within `tolerance` of the last kept point, then iterative (stack-based)
/// Douglas-Peucker on squared perpendicular distance. The first and last
/// input points always survive; output points are a subset of the input.
#[must_use]
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let tol_sq = tolerance * tolerance;
    let radial = radial_filter(points, tol_sq);
    douglas_peucker(&radial, tol_sq)
}

fn radial_filter(points: &[Point], tol_sq: f64) -> Vec<Point> {
    let mut kept = vec![points[0]];
    for p in &points[1..points.len() - 1] {
        if kept[kept.len() - 1].dist_sq(*p) > tol_sq {
            kept.push(*p);
        }
    }
    kept.push(points[points.len() - 1]);
    kept
}

fn douglas_peucker(points: &[Point], tol_sq: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        let mut max_d = tol_sq;
        let mut index = None;
        for (i, p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = perp_dist_sq(*p, points[first], points[last]);
            if d > max_d {
                max_d = d;
                index = Some(i);
            }
        }
        if let Some(i) = index {
            keep[i] = true;
            stack.push((first, i));
            stack.push((i, last));
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Chaikin corner-cutting: each segment is replaced by its 1/4 and 3/4
/// interpolated points, `iterations` times. Closed polylines wrap around the
/// last→first segment; open polylines keep the original endpoints fixed.
#[must_use]
pub fn smooth(points: &[Point], iterations: usize, closed: bool) -> Vec<Point> {
    let mut current = points.to_vec();
    // Closed shapes store the last vertex coincident with the first; drop
    // the duplicate so wrapping sees each corner once.
    if closed && current.len() > 1 && current[0].dist_sq(current[current.len() - 1]) < GEOM_EPSILON
    {
        current.pop();
    }
    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }
        let mut next = Vec::with_capacity(current.len() * 2);
        if closed {
            for i in 0..current.len() {
                let a = current[i];
                let b = current[(i + 1) % current.len()];
                next.push(a.lerp(b, 0.25));
                next.push(a.lerp(b, 0.75));
            }
        } else {
            next.push(current[0]);
            for pair in current.windows(2) {
                next.push(pair[0].lerp(pair[1], 0.25));
                next.push(pair[0].lerp(pair[1], 0.75));
            }
            next.push(current[current.len() - 1]);
        }
        current = next;
    }
    current
}

/// One cubic segment of a smooth path, ending at `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    /// First control point.
    pub c1: Point,
    /// Second control point.
    pub c2: Point,
    /// Segment end point.
    pub to: Point,
}

/// A point sequence converted into cubic curve segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGeometry {
    /// Curve start point.
    pub start: Point,
    /// Cubic segments; for closed paths the last segment ends at `start`.
    pub segments: Vec<CurveSegment>,
}

/// Convert a point sequence into a cardinal (Catmull-Rom-derived) cubic
/// curve sequence. Closed sequences wrap their neighbor lookups; open
/// sequences clamp at the ends. Two-point input degrades to a straight
/// segment; fewer than two points yield `None`.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn smooth_path_geometry(points: &[Point], closed: bool) -> Option<PathGeometry> {
    // A closed shape stores its last vertex coincident with the first;
    // drop the duplicate so wrapping sees each corner once.
    let mut pts: Vec<Point> = points.to_vec();
    if closed && pts.len() > 1 && pts[0].dist_sq(pts[pts.len() - 1]) < GEOM_EPSILON {
        pts.pop();
    }
    if pts.len() < 2 {
        return None;
    }

    let n = pts.len();
    let neighbor = |i: isize| -> Point {
        if closed {
            pts[i.rem_euclid(n as isize) as usize]
        } else {
            pts[i.clamp(0, n as isize - 1) as usize]
        }
    };

    let segment_count = if closed { n } else { n - 1 };
    let mut segments = Vec::with_capacity(segment_count);
    for i in 0..segment_count {
        let i = i as isize;
        let p0 = neighbor(i - 1);
        let p1 = neighbor(i);
        let p2 = neighbor(i + 1);
        let p3 = neighbor(i + 2);
        segments.push(CurveSegment {
            c1: Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0),
            c2: Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0),
            to: p2,
        });
    }
    Some(PathGeometry { start: pts[0], segments })
}
