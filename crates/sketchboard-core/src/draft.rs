//! Caller-submitted shapes, before the document assigns an id.

use crate::canvas::CanvasError;
use crate::shapes::{
    Circle, DEFAULT_FONT, DEFAULT_LINE_WIDTH, Geometry, Image, ImageRef, Line, Rectangle,
    SerializableColor, ShapeStyle, Text,
};
use kurbo::Point;
use serde_json::{Map, Value};

/// A shape as submitted for commit: geometry plus optional style overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDraft {
    pub geometry: Geometry,
    pub stroke_color: Option<SerializableColor>,
    pub fill_color: Option<SerializableColor>,
    pub line_width: Option<f64>,
    pub font: Option<String>,
}

impl ShapeDraft {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            stroke_color: None,
            fill_color: None,
            line_width: None,
            font: None,
        }
    }

    pub fn with_stroke_color(mut self, color: SerializableColor) -> Self {
        self.stroke_color = Some(color);
        self
    }

    pub fn with_fill_color(mut self, color: SerializableColor) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Parse a draft from a JSON object such as
    /// `{"type": "rectangle", "x": 10, "y": 10, "w": 100, "h": 50, "color": "#f00"}`.
    ///
    /// Missing or non-numeric geometry fields, unknown kinds and unparseable
    /// colors are reported as [`CanvasError::InvalidShape`].
    pub fn from_json(value: &Value) -> Result<Self, CanvasError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("shape must be a JSON object"))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing shape type"))?;
        let color = optional_color(obj, "color")?;

        let geometry = match kind {
            "rectangle" => Geometry::Rectangle(Rectangle {
                x: number(obj, kind, "x")?,
                y: number(obj, kind, "y")?,
                w: number(obj, kind, "w")?,
                h: number(obj, kind, "h")?,
                color,
            }),
            "circle" => Geometry::Circle(Circle {
                x: number(obj, kind, "x")?,
                y: number(obj, kind, "y")?,
                r: number(obj, kind, "r")?,
                color,
            }),
            "line" => {
                let start = Point::new(number(obj, kind, "x1")?, number(obj, kind, "y1")?);
                let end = Point::new(number(obj, kind, "x2")?, number(obj, kind, "y2")?);
                Geometry::Line(Line { color, ..Line::new(start, end) })
            }
            "text" => Geometry::Text(Text {
                x: number(obj, kind, "x")?,
                y: number(obj, kind, "y")?,
                size: number(obj, kind, "size")?,
                text: string(obj, kind, &["text"])?,
                color,
            }),
            "image" => Geometry::Image(Image {
                x: number(obj, kind, "x")?,
                y: number(obj, kind, "y")?,
                w: number(obj, kind, "w")?,
                h: number(obj, kind, "h")?,
                src: ImageRef::new(string(obj, kind, &["imgSrc", "img"])?),
                color,
            }),
            other => return Err(invalid(&format!("unknown shape type {other:?}"))),
        };
        geometry.validate()?;

        let line_width = match obj.get("lineWidth") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| invalid("lineWidth must be a number"))?),
        };
        let font = match obj.get("font") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_str()
                    .ok_or_else(|| invalid("font must be a string"))?
                    .to_string(),
            ),
        };

        Ok(Self {
            geometry,
            stroke_color: optional_color(obj, "strokeColor")?,
            fill_color: optional_color(obj, "fillColor")?,
            line_width,
            font,
        })
    }

    /// Resolve the style recorded on commit, filling in defaults.
    ///
    /// A zero line width or empty font name counts as absent.
    pub(crate) fn resolve_style(&self) -> Result<ShapeStyle, CanvasError> {
        let line_width = match self.line_width {
            None => DEFAULT_LINE_WIDTH,
            Some(w) if w == 0.0 => DEFAULT_LINE_WIDTH,
            Some(w) if w.is_finite() && w > 0.0 => w,
            Some(w) => return Err(invalid(&format!("invalid lineWidth {w}"))),
        };
        let font = match self.font.as_deref() {
            None | Some("") => DEFAULT_FONT.to_string(),
            Some(font) => font.to_string(),
        };
        Ok(ShapeStyle {
            stroke_color: self.stroke_color.unwrap_or_else(SerializableColor::black),
            fill_color: self.fill_color,
            line_width,
            font,
        })
    }
}

impl From<Geometry> for ShapeDraft {
    fn from(geometry: Geometry) -> Self {
        Self::new(geometry)
    }
}

fn invalid(message: &str) -> CanvasError {
    CanvasError::InvalidShape(message.to_string())
}

fn number(obj: &Map<String, Value>, kind: &str, key: &str) -> Result<f64, CanvasError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(&format!("{kind} requires numeric field {key:?}")))
}

fn string(obj: &Map<String, Value>, kind: &str, keys: &[&str]) -> Result<String, CanvasError> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| invalid(&format!("{kind} requires string field {:?}", keys[0])))
}

fn optional_color(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<SerializableColor>, CanvasError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => SerializableColor::parse(s)
            .map(Some)
            .ok_or_else(|| invalid(&format!("unrecognized {key} {s:?}"))),
        Some(_) => Err(invalid(&format!("{key} must be a string"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rectangle() {
        let draft = ShapeDraft::from_json(&json!({
            "type": "rectangle", "x": 10, "y": 10, "w": 100, "h": 50, "color": "#ff0000"
        }))
        .unwrap();
        let Geometry::Rectangle(rect) = &draft.geometry else {
            panic!("expected a rectangle");
        };
        assert!((rect.w - 100.0).abs() < f64::EPSILON);
        assert_eq!(rect.color, Some(SerializableColor::new(255, 0, 0, 255)));
        assert!(draft.stroke_color.is_none());
    }

    #[test]
    fn test_parse_style_fields() {
        let draft = ShapeDraft::from_json(&json!({
            "type": "circle", "x": 0, "y": 0, "r": 4,
            "strokeColor": "blue", "fillColor": null, "lineWidth": 3, "font": "Courier"
        }))
        .unwrap();
        let style = draft.resolve_style().unwrap();
        assert_eq!(style.stroke_color, SerializableColor::new(0, 0, 255, 255));
        assert!(style.fill_color.is_none());
        assert!((style.line_width - 3.0).abs() < f64::EPSILON);
        assert_eq!(style.font, "Courier");
    }

    #[test]
    fn test_missing_field_is_invalid_shape() {
        let err = ShapeDraft::from_json(&json!({"type": "line", "x1": 0, "y1": 0, "x2": 5}))
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidShape(_)));

        let err = ShapeDraft::from_json(&json!({"type": "circle", "x": "1", "y": 0, "r": 5}))
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidShape(_)));
    }

    #[test]
    fn test_unknown_type_and_bad_color() {
        assert!(ShapeDraft::from_json(&json!({"type": "star"})).is_err());
        assert!(ShapeDraft::from_json(&json!({"x": 1})).is_err());
        assert!(ShapeDraft::from_json(&json!([1, 2])).is_err());
        assert!(
            ShapeDraft::from_json(&json!({
                "type": "circle", "x": 0, "y": 0, "r": 1, "color": "not-a-color"
            }))
            .is_err()
        );
    }

    #[test]
    fn test_text_requires_content() {
        let err = ShapeDraft::from_json(&json!({"type": "text", "x": 0, "y": 0, "size": 12, "text": ""}))
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidShape(_)));
    }

    #[test]
    fn test_image_accepts_either_key() {
        let a = ShapeDraft::from_json(&json!({
            "type": "image", "x": 0, "y": 0, "w": 10, "h": 10, "imgSrc": "a.png"
        }))
        .unwrap();
        let b = ShapeDraft::from_json(&json!({
            "type": "image", "x": 0, "y": 0, "w": 10, "h": 10, "img": "a.png"
        }))
        .unwrap();
        assert_eq!(a.geometry, b.geometry);
    }

    #[test]
    fn test_style_defaults() {
        let draft = ShapeDraft::new(Geometry::Circle(Circle::new(0.0, 0.0, 1.0))).with_line_width(0.0);
        let style = draft.resolve_style().unwrap();
        assert_eq!(style, ShapeStyle::default());

        let bad = ShapeDraft::new(Geometry::Circle(Circle::new(0.0, 0.0, 1.0))).with_line_width(-2.0);
        assert!(bad.resolve_style().is_err());
    }
}
