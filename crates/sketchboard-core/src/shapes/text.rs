//! Text shape.

use super::{SerializableColor, require_finite};
use crate::canvas::CanvasError;
use crate::geometry::{TEXT_WIDTH_FACTOR, contains_inclusive};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// A single line of text anchored at its baseline origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Baseline origin x.
    pub x: f64,
    /// Baseline origin y.
    pub y: f64,
    /// Font size in pixels.
    pub size: f64,
    /// The text content.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Text {
    /// Font size used when a drag gives no height.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Create a new text shape.
    pub fn new(x: f64, y: f64, size: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            size,
            text: text.into(),
            color: None,
        }
    }

    /// Text placed by a drag: the baseline sits at the drag end and the
    /// vertical drag distance is the font size.
    pub fn from_drag(start: Point, end: Point, text: impl Into<String>) -> Self {
        let height = (end.y - start.y).abs();
        let size = if height > 0.0 {
            height
        } else {
            Self::DEFAULT_FONT_SIZE
        };
        Self::new(start.x, end.y, size, text)
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn baseline_origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Approximate advance width, without font metrics.
    pub fn approx_width(&self) -> f64 {
        self.size * self.text.chars().count() as f64 * TEXT_WIDTH_FACTOR
    }

    /// Approximate box: one em tall, sitting on the baseline.
    pub fn approx_rect(&self) -> Rect {
        Rect::new(
            self.x,
            self.y - self.size,
            self.x + self.approx_width(),
            self.y,
        )
    }

    pub fn bounds(&self) -> Rect {
        self.approx_rect()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        contains_inclusive(self.approx_rect(), point)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn to_path(&self) -> BezPath {
        self.approx_rect().to_path(0.1)
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        require_finite("text", &[self.x, self.y, self.size])?;
        if self.size <= 0.0 {
            return Err(CanvasError::InvalidShape(format!(
                "text size must be positive, got {}",
                self.size
            )));
        }
        if self.text.is_empty() {
            return Err(CanvasError::InvalidShape("text must not be empty".to_string()));
        }
        Ok(())
    }
}
