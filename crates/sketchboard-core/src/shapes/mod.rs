//! Shape definitions for the drawing surface.

mod circle;
mod image;
mod line;
mod rectangle;
mod text;

pub use circle::Circle;
pub use image::{Image, ImageFormat, ImageRef};
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::Text;

use crate::canvas::CanvasError;
use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for committed shapes, assigned by the owning document.
pub type ShapeId = u64;

/// Font family recorded on shapes when the caller does not name one.
pub const DEFAULT_FONT: &str = "Helvetica";

/// Stroke width recorded on shapes when the caller does not give one.
pub const DEFAULT_LINE_WIDTH: f64 = 1.0;

/// Serializable color representation (RGBA8).
///
/// On the wire colors are CSS-style strings: `#rrggbb`, or `#rrggbbaa` when
/// not fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`) or one of the
    /// basic named colors.
    pub fn parse(color: &str) -> Option<Self> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let named = match color.to_ascii_lowercase().as_str() {
            "black" => Self::black(),
            "white" => Self::white(),
            "transparent" => Self::transparent(),
            "red" => Self::new(255, 0, 0, 255),
            "green" => Self::new(0, 128, 0, 255),
            "blue" => Self::new(0, 0, 255, 255),
            "yellow" => Self::new(255, 255, 0, 255),
            "orange" => Self::new(255, 165, 0, 255),
            "purple" => Self::new(128, 0, 128, 255),
            "gray" | "grey" => Self::new(128, 128, 128, 255),
            _ => return None,
        };
        Some(named)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as a CSS hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for SerializableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unrecognized color: {value:?}"))
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_hex()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties recorded on a shape when it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Stroke width.
    pub line_width: f64,
    /// Font family name.
    pub font: String,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            fill_color: None,
            line_width: DEFAULT_LINE_WIDTH,
            font: DEFAULT_FONT.to_string(),
        }
    }
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }
}

/// The geometric part of a shape, one case per primitive kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Rectangle(Rectangle),
    Circle(Circle),
    Line(Line),
    Text(Text),
    Image(Image),
}

impl Geometry {
    /// Wire name of the kind (`"rectangle"`, `"circle"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Rectangle(_) => "rectangle",
            Geometry::Circle(_) => "circle",
            Geometry::Line(_) => "line",
            Geometry::Text(_) => "text",
            Geometry::Image(_) => "image",
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Geometry::Rectangle(s) => s.bounds(),
            Geometry::Circle(s) => s.bounds(),
            Geometry::Line(s) => s.bounds(),
            Geometry::Text(s) => s.bounds(),
            Geometry::Image(s) => s.bounds(),
        }
    }

    /// Check if a point hits this shape.
    pub fn hit_test(&self, point: Point) -> bool {
        match self {
            Geometry::Rectangle(s) => s.hit_test(point),
            Geometry::Circle(s) => s.hit_test(point),
            Geometry::Line(s) => s.hit_test(point),
            Geometry::Text(s) => s.hit_test(point),
            Geometry::Image(s) => s.hit_test(point),
        }
    }

    /// Move the shape's anchor (or both endpoints of a line) by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Geometry::Rectangle(s) => s.translate(delta),
            Geometry::Circle(s) => s.translate(delta),
            Geometry::Line(s) => s.translate(delta),
            Geometry::Text(s) => s.translate(delta),
            Geometry::Image(s) => s.translate(delta),
        }
    }

    /// Outline path for stroking. Text is not a path; its approximate box is returned.
    pub fn to_path(&self) -> BezPath {
        match self {
            Geometry::Rectangle(s) => s.to_path(),
            Geometry::Circle(s) => s.to_path(),
            Geometry::Line(s) => s.to_path(),
            Geometry::Text(s) => s.to_path(),
            Geometry::Image(s) => s.to_path(),
        }
    }

    /// Per-kind paint color, if one was given.
    pub fn color(&self) -> Option<SerializableColor> {
        match self {
            Geometry::Rectangle(s) => s.color,
            Geometry::Circle(s) => s.color,
            Geometry::Line(s) => s.color,
            Geometry::Text(s) => s.color,
            Geometry::Image(s) => s.color,
        }
    }

    /// Image reference, for image shapes.
    pub fn image_ref(&self) -> Option<&ImageRef> {
        match self {
            Geometry::Image(img) => Some(&img.src),
            _ => None,
        }
    }

    /// Check the kind's invariants: finite coordinates, r >= 0, size > 0,
    /// non-empty text and image reference.
    pub fn validate(&self) -> Result<(), CanvasError> {
        match self {
            Geometry::Rectangle(s) => s.validate(),
            Geometry::Circle(s) => s.validate(),
            Geometry::Line(s) => s.validate(),
            Geometry::Text(s) => s.validate(),
            Geometry::Image(s) => s.validate(),
        }
    }
}

/// A committed shape: id, geometry and the style recorded at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    #[serde(flatten)]
    pub(crate) geometry: Geometry,
    #[serde(flatten)]
    pub(crate) style: ShapeStyle,
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.geometry.hit_test(point)
    }

    /// Color used to paint the shape: its own color, else the stroke color.
    pub fn paint_color(&self) -> SerializableColor {
        self.geometry.color().unwrap_or(self.style.stroke_color)
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.geometry.translate(delta);
    }
}

/// An in-progress shape shown while dragging. Never stored, never given an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewShape {
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

impl PreviewShape {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            style: ShapeStyle::default(),
        }
    }

    /// Color used to paint the preview.
    pub fn paint_color(&self) -> SerializableColor {
        self.geometry.color().unwrap_or(self.style.stroke_color)
    }

    /// Text and image previews are drawn dashed to mark them as uncommitted.
    pub fn is_dashed(&self) -> bool {
        matches!(self.geometry, Geometry::Text(_) | Geometry::Image(_))
    }
}

pub(crate) fn require_finite(name: &str, values: &[f64]) -> Result<(), CanvasError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CanvasError::InvalidShape(format!("{name} has non-finite coordinates")))
    }
}
