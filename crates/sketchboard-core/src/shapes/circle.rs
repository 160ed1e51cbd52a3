//! Circle shape.

use super::{SerializableColor, require_finite};
use crate::canvas::CanvasError;
use kurbo::{BezPath, Circle as KurboCircle, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// A circle given by its center and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Radius.
    pub r: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Circle {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self {
            x,
            y,
            r,
            color: None,
        }
    }

    /// Circle centered on the drag start, reaching the drag end.
    pub fn from_drag(start: Point, end: Point) -> Self {
        Self::new(start.x, start.y, start.distance(end))
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Get as a kurbo Circle.
    pub fn as_kurbo(&self) -> KurboCircle {
        KurboCircle::new(self.center(), self.r)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x - self.r,
            self.y - self.r,
            self.x + self.r,
            self.y + self.r,
        )
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.center().distance(point) <= self.r
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn to_path(&self) -> BezPath {
        self.as_kurbo().to_path(0.1)
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        require_finite("circle", &[self.x, self.y, self.r])?;
        if self.r < 0.0 {
            return Err(CanvasError::InvalidShape(format!(
                "circle radius must not be negative, got {}",
                self.r
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test_radius() {
        let circle = Circle::new(50.0, 50.0, 10.0);
        assert!(circle.hit_test(Point::new(55.0, 50.0)));
        assert!(circle.hit_test(Point::new(60.0, 50.0)));
        assert!(!circle.hit_test(Point::new(65.0, 50.0)));
    }

    #[test]
    fn test_from_drag() {
        let circle = Circle::from_drag(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((circle.r - 5.0).abs() < f64::EPSILON);
        assert!((circle.x).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let circle = Circle::new(200.0, 200.0, 30.0);
        let bounds = circle.bounds();
        assert!((bounds.x0 - 170.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 230.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_radius_rejected() {
        assert!(Circle::new(0.0, 0.0, -1.0).validate().is_err());
        assert!(Circle::new(0.0, 0.0, 0.0).validate().is_ok());
    }
}
