//! Canvas document and state management.

use crate::draft::ShapeDraft;
use crate::geometry;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canvas width used until the first resize.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
/// Canvas height used until the first resize.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 500.0;

/// Document errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("Invalid canvas dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    #[error("Shape not found: {0}")]
    NotFound(ShapeId),
}

/// Serializable view of a document: the committed shapes and the redo stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub width: f64,
    pub height: f64,
    /// Committed shapes in paint order.
    pub elements: Vec<Shape>,
    /// Undone shapes, most recently undone last.
    pub undone: Vec<Shape>,
}

/// A canvas document: committed shapes, the redo stack and the canvas size.
///
/// All operations run to completion and either apply fully or leave the
/// document untouched. Callers that share a document between threads must
/// serialize access to it.
#[derive(Debug, Clone)]
pub struct CanvasDocument {
    /// Committed shapes, back to front.
    shapes: Vec<Shape>,
    /// Undone shapes, most recently undone last.
    redo_stack: Vec<Shape>,
    width: f64,
    height: f64,
    next_id: ShapeId,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a new empty document with the default canvas size.
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            redo_stack: Vec::new(),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            next_id: 1,
        }
    }

    /// Create a new empty document with the given canvas size.
    pub fn with_size(width: f64, height: f64) -> Result<Self, CanvasError> {
        let mut doc = Self::new();
        doc.resize(width, height)?;
        Ok(doc)
    }

    /// Commit a shape: assign a fresh id, record the style defaults, append it
    /// on top and drop the redo history.
    pub fn add_shape(&mut self, draft: ShapeDraft) -> Result<&Shape, CanvasError> {
        draft.geometry.validate()?;
        let style = draft.resolve_style()?;

        let id = self.next_id;
        self.next_id += 1;
        self.shapes.push(Shape {
            id,
            geometry: draft.geometry,
            style,
        });
        self.redo_stack.clear();

        let shape = self.shapes.last().ok_or(CanvasError::NotFound(id))?;
        log::debug!("added {} shape {}", shape.geometry.kind(), id);
        Ok(shape)
    }

    /// Undo the last commit.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.shapes.pop() {
            Some(shape) => {
                log::debug!("undo shape {}", shape.id);
                self.redo_stack.push(shape);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone commit.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(shape) => {
                log::debug!("redo shape {}", shape.id);
                self.shapes.push(shape);
                true
            }
            None => false,
        }
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.shapes.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all shapes and the redo history.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.redo_stack.clear();
    }

    /// Set the canvas size. Shape coordinates are not rescaled.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), CanvasError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(CanvasError::InvalidDimension(format!("{width} x {height}")));
        }
        self.width = width;
        self.height = height;
        log::debug!("canvas resized to {width} x {height}");
        Ok(())
    }

    /// Translate a committed shape by (dx, dy).
    ///
    /// Returns `Ok(false)` without changes when no committed shape has `id`;
    /// a concurrent undo or clear can legitimately remove a shape that a
    /// client is still dragging.
    pub fn move_shape(&mut self, id: ShapeId, dx: f64, dy: f64) -> Result<bool, CanvasError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(CanvasError::InvalidShape(format!(
                "move delta must be finite, got ({dx}, {dy})"
            )));
        }
        match self.shapes.iter_mut().find(|s| s.id == id) {
            Some(shape) => {
                shape.translate(Vec2::new(dx, dy));
                Ok(true)
            }
            None => {
                log::debug!("move ignored, shape {id} is not committed");
                Ok(false)
            }
        }
    }

    /// Get a committed shape by ID.
    pub fn get(&self, id: ShapeId) -> Result<&Shape, CanvasError> {
        self.shapes
            .iter()
            .find(|s| s.id == id)
            .ok_or(CanvasError::NotFound(id))
    }

    /// Topmost committed shape under `point`.
    pub fn shape_at(&self, point: Point) -> Option<&Shape> {
        geometry::topmost_at(&self.shapes, point)
    }

    /// Committed shapes in paint order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Undone shapes, most recently undone last.
    pub fn redo_stack(&self) -> &[Shape] {
        &self.redo_stack
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of committed shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Copy the document state out for serialization or off-lock rendering.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            width: self.width,
            height: self.height,
            elements: self.shapes.clone(),
            undone: self.redo_stack.clone(),
        }
    }

    /// Serialize the document state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Geometry, Line, Rectangle, SerializableColor, Text};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> ShapeDraft {
        ShapeDraft::new(Geometry::Rectangle(Rectangle::new(x, y, w, h)))
    }

    fn circle(x: f64, y: f64, r: f64) -> ShapeDraft {
        ShapeDraft::new(Geometry::Circle(Circle::new(x, y, r)))
    }

    #[test]
    fn test_document_creation() {
        let doc = CanvasDocument::new();
        assert!(doc.is_empty());
        assert!((doc.width() - 800.0).abs() < f64::EPSILON);
        assert!((doc.height() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_shape_applies_defaults() {
        let mut doc = CanvasDocument::new();
        let shape = doc.add_shape(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(shape.id(), 1);
        assert_eq!(shape.style().stroke_color, SerializableColor::black());
        assert!(shape.style().fill_color.is_none());
        assert!((shape.style().line_width - 1.0).abs() < f64::EPSILON);
        assert_eq!(shape.style().font, "Helvetica");
    }

    #[test]
    fn test_add_shape_returns_topmost() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let added = doc.add_shape(circle(5.0, 5.0, 2.0)).unwrap().clone();
        assert_eq!(added.id(), 2);
        assert_eq!(doc.shapes().last(), Some(&added));
    }

    #[test]
    fn test_add_invalid_shape_leaves_document_unchanged() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        doc.undo();

        let err = doc.add_shape(circle(0.0, 0.0, -1.0)).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidShape(_)));
        let text = ShapeDraft::new(Geometry::Text(Text::new(0.0, 0.0, 10.0, "")));
        assert!(doc.add_shape(text).is_err());

        assert!(doc.is_empty());
        assert_eq!(doc.redo_stack().len(), 1);
    }

    #[test]
    fn test_undo_redo_scenario() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(10.0, 10.0, 100.0, 50.0)).unwrap();
        doc.add_shape(circle(200.0, 200.0, 30.0)).unwrap();
        assert_eq!(doc.len(), 2);

        assert!(doc.undo());
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.redo_stack().len(), 1);

        assert!(doc.redo());
        assert_eq!(doc.len(), 2);
        assert!(matches!(doc.shapes()[0].geometry(), Geometry::Rectangle(_)));
        assert!(matches!(doc.shapes()[1].geometry(), Geometry::Circle(_)));
    }

    #[test]
    fn test_add_undo_redo_round_trip() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(circle(5.0, 5.0, 2.0)).unwrap();
        doc.add_shape(rect(1.0, 2.0, 3.0, 4.0)).unwrap();
        let after_add = doc.shapes().to_vec();

        doc.undo();
        doc.redo();
        assert_eq!(doc.shapes(), after_add.as_slice());
    }

    #[test]
    fn test_add_after_undo_clears_redo() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        doc.add_shape(rect(0.0, 0.0, 2.0, 2.0)).unwrap();
        doc.undo();
        doc.undo();
        assert_eq!(doc.redo_stack().len(), 2);

        doc.add_shape(rect(0.0, 0.0, 3.0, 3.0)).unwrap();
        assert!(!doc.can_redo());
        assert!(!doc.redo());
    }

    #[test]
    fn test_undo_redo_empty_stacks() {
        let mut doc = CanvasDocument::new();
        assert!(!doc.can_undo());
        assert!(!doc.undo());
        assert!(!doc.can_redo());
        assert!(!doc.redo());
    }

    #[test]
    fn test_ids_never_reused() {
        let mut doc = CanvasDocument::new();
        let first = doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap().id();
        doc.undo();
        let second = doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap().id();
        doc.clear();
        let third = doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap().id();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        doc.undo();

        doc.clear();
        let once = doc.snapshot();
        doc.clear();
        assert_eq!(doc.snapshot(), once);
        assert!(once.elements.is_empty());
        assert!(once.undone.is_empty());
    }

    #[test]
    fn test_resize_rejects_non_positive() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        let before = doc.snapshot();

        let err = doc.resize(0.0, 100.0).unwrap_err();
        assert!(matches!(err, CanvasError::InvalidDimension(_)));
        assert!(doc.resize(100.0, -1.0).is_err());
        assert!(doc.resize(f64::NAN, 100.0).is_err());
        assert!(doc.resize(100.0, f64::INFINITY).is_err());
        assert_eq!(doc.snapshot(), before);
    }

    #[test]
    fn test_resize_keeps_shapes_and_redo() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect(700.0, 400.0, 50.0, 50.0)).unwrap();
        doc.add_shape(rect(0.0, 0.0, 5.0, 5.0)).unwrap();
        doc.undo();

        doc.resize(100.0, 100.0).unwrap();
        assert!((doc.width() - 100.0).abs() < f64::EPSILON);
        assert_eq!(doc.len(), 1);
        assert!(doc.can_redo());
        let Geometry::Rectangle(r) = doc.shapes()[0].geometry() else {
            panic!("expected a rectangle");
        };
        assert!((r.x - 700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlapping_hit_returns_later_shape() {
        let mut doc = CanvasDocument::new();
        let a = doc.add_shape(rect(0.0, 0.0, 100.0, 100.0)).unwrap().id();
        let b = doc.add_shape(rect(50.0, 50.0, 100.0, 100.0)).unwrap().id();

        assert_eq!(doc.shape_at(Point::new(75.0, 75.0)).map(Shape::id), Some(b));
        assert_eq!(doc.shape_at(Point::new(25.0, 25.0)).map(Shape::id), Some(a));
    }

    #[test]
    fn test_move_line() {
        let mut doc = CanvasDocument::new();
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let id = doc
            .add_shape(ShapeDraft::new(Geometry::Line(line)))
            .unwrap()
            .id();

        assert!(doc.move_shape(id, 20.0, 30.0).unwrap());
        let Geometry::Line(moved) = doc.get(id).unwrap().geometry() else {
            panic!("expected a line");
        };
        assert_eq!(moved.start(), Point::new(20.0, 30.0));
        assert_eq!(moved.end(), Point::new(120.0, 30.0));
        assert_eq!(doc.shape_at(Point::new(70.0, 30.0)).map(Shape::id), Some(id));
    }

    #[test]
    fn test_move_unknown_id_is_noop() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(circle(10.0, 10.0, 5.0)).unwrap();
        let before = doc.snapshot();

        assert!(!doc.move_shape(42, 1.0, 1.0).unwrap());
        assert!(doc.move_shape(1, f64::NAN, 0.0).is_err());
        assert_eq!(doc.snapshot(), before);
        assert_eq!(doc.get(42).unwrap_err(), CanvasError::NotFound(42));
    }

    #[test]
    fn test_snapshot_json() {
        let mut doc = CanvasDocument::with_size(640.0, 480.0).unwrap();
        doc.add_shape(circle(1.0, 2.0, 3.0)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["width"], 640.0);
        assert_eq!(json["elements"][0]["type"], "circle");
        assert_eq!(json["elements"][0]["r"], 3.0);
        assert!(json["undone"].as_array().unwrap().is_empty());
    }
}
