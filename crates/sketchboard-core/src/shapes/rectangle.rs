//! Rectangle shape.

use super::{SerializableColor, require_finite};
use crate::canvas::CanvasError;
use crate::geometry::contains_inclusive;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle as dragged by the user.
///
/// Width and height keep the drag direction and may be negative; bounds,
/// hit-testing and painting use the normalized box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Drag origin x.
    pub x: f64,
    /// Drag origin y.
    pub y: f64,
    /// Signed width.
    pub w: f64,
    /// Signed height.
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            color: None,
        }
    }

    /// Create a rectangle from the drag start and end points, keeping the
    /// drag direction in the signed extents.
    pub fn from_corners(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    /// Set the paint color.
    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Get the normalized box as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h).abs()
    }

    pub fn bounds(&self) -> Rect {
        self.as_rect()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        contains_inclusive(self.as_rect(), point)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        require_finite("rectangle", &[self.x, self.y, self.w, self.h])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(10.0, 20.0, 100.0, 50.0);
        assert!((rect.x - 10.0).abs() < f64::EPSILON);
        assert!((rect.y - 20.0).abs() < f64::EPSILON);
        assert!((rect.w - 100.0).abs() < f64::EPSILON);
        assert!((rect.h - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rectangle_from_corners_keeps_direction() {
        let rect = Rectangle::from_corners(Point::new(100.0, 100.0), Point::new(50.0, 50.0));
        assert!((rect.w + 50.0).abs() < f64::EPSILON);
        assert!((rect.h + 50.0).abs() < f64::EPSILON);

        let bounds = rect.bounds();
        assert!((bounds.x0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 50.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test() {
        let rect = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect.hit_test(Point::new(50.0, 50.0)));
        assert!(rect.hit_test(Point::new(100.0, 100.0)));
        assert!(!rect.hit_test(Point::new(150.0, 50.0)));
        assert!(!rect.hit_test(Point::new(50.0, -0.5)));
    }

    #[test]
    fn test_hit_test_negative_extent() {
        let rect = Rectangle::new(100.0, 100.0, -40.0, -20.0);
        assert!(rect.hit_test(Point::new(70.0, 90.0)));
        assert!(!rect.hit_test(Point::new(110.0, 90.0)));
    }

    #[test]
    fn test_translate() {
        let mut rect = Rectangle::new(10.0, 20.0, 5.0, 5.0);
        rect.translate(Vec2::new(3.0, -4.0));
        assert!((rect.x - 13.0).abs() < f64::EPSILON);
        assert!((rect.y - 16.0).abs() < f64::EPSILON);
        assert!((rect.w - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_nan() {
        assert!(Rectangle::new(0.0, f64::NAN, 1.0, 1.0).validate().is_err());
        assert!(Rectangle::new(0.0, 0.0, 0.0, 0.0).validate().is_ok());
    }
}
