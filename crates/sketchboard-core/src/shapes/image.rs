//! Image shape for placing raster images by reference.

use super::{SerializableColor, require_finite};
use crate::canvas::CanvasError;
use crate::geometry::contains_inclusive;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image format for encoded image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// Reference to an image held by an external cache: a `data:` URL or a
/// fetchable URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Inline `data:` URL.
    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// `http://` or `https://` URL.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URLs can be megabytes long.
        match self.0.char_indices().nth(48) {
            Some((end, _)) if self.is_data_url() => write!(f, "{}...", &self.0[..end]),
            _ => f.write_str(&self.0),
        }
    }
}

/// An image placed into a box. Width and height keep the drag direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Drag origin x.
    pub x: f64,
    /// Drag origin y.
    pub y: f64,
    /// Signed display width.
    pub w: f64,
    /// Signed display height.
    pub h: f64,
    /// Image reference, resolved through the image cache.
    #[serde(rename = "imgSrc", alias = "img")]
    pub src: ImageRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
}

impl Image {
    pub fn new(x: f64, y: f64, w: f64, h: f64, src: ImageRef) -> Self {
        Self {
            x,
            y,
            w,
            h,
            src,
            color: None,
        }
    }

    /// Image placed by a drag from `start` to `end`.
    pub fn from_drag(start: Point, end: Point, src: ImageRef) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y, src)
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Get the normalized bounding rectangle.
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
        // Bounding box, used for the preview frame
        self.as_rect().to_path(0.1)
    }

    pub(crate) fn validate(&self) -> Result<(), CanvasError> {
        require_finite("image", &[self.x, self.y, self.w, self.h])?;
        if self.src.as_str().trim().is_empty() {
            return Err(CanvasError::InvalidShape(
                "image reference must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
