//! Line shape.

use super::{SerializableColor, require_finite};
use crate::canvas::CanvasError;
use crate::geometry::{LINE_HIT_TOLERANCE, point_to_segment_dist};
use kurbo::{BezPath, Line as KurboLine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A straight line segment. The endpoints may coincide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            color: None,
        }
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.start().distance(self.end())
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start().midpoint(self.end())
    }

    /// Get as a kurbo Line.
    pub fn as_kurbo(&self) -> KurboLine {
        KurboLine::new(self.start(), self.end())
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    pub fn hit_test(&self, point: Point) -> bool {
        point_to_segment_dist(point, self.start(), self.end()) < LINE_HIT_TOLERANCE
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x1 += delta.x;
        self.y1 += delta.y;
        self.x2 += delta.x;
        self.y2 += delta.y;
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start());
        path.line_to(self.end());
        path
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        require_finite("line", &[self.x1, self.y1, self.x2, self.y2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_creation() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!((line.length() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let mid = line.midpoint();
        assert!((mid.x - 50.0).abs() < f64::EPSILON);
        assert!((mid.y - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_on_line() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 0.0)));
        assert!(line.hit_test(Point::new(50.0, 4.9)));
        assert!(!line.hit_test(Point::new(50.0, 5.0)));
        assert!(!line.hit_test(Point::new(50.0, 20.0)));
    }

    #[test]
    fn test_hit_test_beyond_endpoints() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(-3.0, 0.0)));
        assert!(!line.hit_test(Point::new(110.0, 0.0)));
    }

    #[test]
    fn test_degenerate_line() {
        let line = Line::new(Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        assert!(line.hit_test(Point::new(12.0, 12.0)));
        assert!(!line.hit_test(Point::new(20.0, 10.0)));
    }

    #[test]
    fn test_translate_moves_both_endpoints() {
        let mut line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        line.translate(Vec2::new(10.0, -5.0));
        assert_eq!(line.start(), Point::new(10.0, -5.0));
        assert_eq!(line.end(), Point::new(110.0, 45.0));
        assert!(line.hit_test(line.midpoint()));
    }

    #[test]
    fn test_bounds() {
        let line = Line::new(Point::new(50.0, 80.0), Point::new(10.0, 20.0));
        let bounds = line.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 80.0).abs() < f64::EPSILON);
    }
}
