//! Hit-testing and translation used for selecting and moving shapes.

use crate::shapes::{Geometry, Shape};
use kurbo::{Point, Rect, Vec2};

/// A point closer than this to a line segment hits the line.
pub const LINE_HIT_TOLERANCE: f64 = 5.0;

/// Approximate glyph advance as a fraction of the font size.
pub const TEXT_WIDTH_FACTOR: f64 = 0.6;

/// Check whether `point` lies within or near `geometry`.
pub fn hit_test(point: Point, geometry: &Geometry) -> bool {
    geometry.hit_test(point)
}

/// Move `geometry` by (dx, dy) in place.
pub fn translate(geometry: &mut Geometry, dx: f64, dy: f64) {
    geometry.translate(Vec2::new(dx, dy));
}

/// Find the topmost shape under `point`.
///
/// Shapes are in paint order, so the search runs back to front and the first
/// match wins.
pub fn topmost_at(shapes: &[Shape], point: Point) -> Option<&Shape> {
    shapes.iter().rev().find(|shape| shape.hit_test(point))
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Closed-interval containment; kurbo's `Rect::contains` excludes the far edges.
pub(crate) fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}
