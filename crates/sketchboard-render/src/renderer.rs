//! Renderer trait abstraction.

use kurbo::Size;
use peniko::Color;
use sketchboard_core::canvas::DocumentSnapshot;
use sketchboard_core::{CanvasDocument, PreviewShape, Shape};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Largest surface a render may allocate, in pixels (64 Mpx, 256 MiB RGBA).
pub const MAX_SURFACE_PIXELS: u64 = 8192 * 8192;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
///
/// Borrowed from whoever owns the shapes, so a caller can render from a
/// snapshot without holding the document lock.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Committed shapes in draw order.
    pub shapes: &'a [Shape],
    /// Canvas size in pixels.
    pub canvas_size: Size,
    /// In-progress shape drawn above everything else.
    pub preview: Option<&'a PreviewShape>,
    /// Background color.
    pub background_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context with a white background and no preview.
    pub fn new(shapes: &'a [Shape], canvas_size: Size) -> Self {
        Self {
            shapes,
            canvas_size,
            preview: None,
            background_color: Color::WHITE,
        }
    }

    /// Context for the current state of a document.
    pub fn from_document(document: &'a CanvasDocument) -> Self {
        Self::new(document.shapes(), document.size())
    }

    /// Context for a detached snapshot.
    pub fn from_snapshot(snapshot: &'a DocumentSnapshot) -> Self {
        Self::new(
            &snapshot.elements,
            Size::new(snapshot.width, snapshot.height),
        )
    }

    /// Set the preview shape.
    pub fn with_preview(mut self, preview: Option<&'a PreviewShape>) -> Self {
        self.preview = preview;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Pixel dimensions of the target surface, at least 1x1.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dim = |v: f64| {
            if v.is_finite() && v >= 1.0 {
                v.ceil().min(u32::MAX as f64) as u32
            } else {
                1
            }
        };
        (dim(self.canvas_size.width), dim(self.canvas_size.height))
    }

    /// [`pixel_size`](Self::pixel_size), refused when the area exceeds
    /// [`MAX_SURFACE_PIXELS`].
    pub fn surface_size(&self) -> RenderResult<(u32, u32)> {
        let (width, height) = self.pixel_size();
        if u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
            return Err(RendererError::Surface(format!(
                "{width}x{height} exceeds {MAX_SURFACE_PIXELS} pixels"
            )));
        }
        Ok((width, height))
    }
}

/// Trait for rendering backends.
///
/// A render is a pure function of the context and of what the backend's
/// image cache holds at the time of the call.
pub trait Renderer: Send + Sync {
    /// Output of one frame.
    type Frame;

    /// Draw background, committed shapes in order, then the preview.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Frame>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchboard_core::ShapeDraft;
    use sketchboard_core::shapes::{Geometry, Rectangle};

    #[test]
    fn test_context_from_document() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(ShapeDraft::new(Geometry::Rectangle(Rectangle::new(
            1.0, 2.0, 3.0, 4.0,
        ))))
        .unwrap();

        let ctx = RenderContext::from_document(&doc);
        assert_eq!(ctx.shapes.len(), 1);
        assert_eq!(ctx.pixel_size(), (800, 500));
        assert_eq!(ctx.background_color, Color::WHITE);
        assert!(ctx.preview.is_none());
    }

    #[test]
    fn test_context_from_snapshot_matches_document() {
        let doc = CanvasDocument::with_size(320.0, 240.0).unwrap();
        let snapshot = doc.snapshot();
        let ctx = RenderContext::from_snapshot(&snapshot);
        assert_eq!(ctx.pixel_size(), (320, 240));
    }

    #[test]
    fn test_pixel_size_rounds_up_and_clamps() {
        let ctx = RenderContext::new(&[], Size::new(10.2, 0.0));
        assert_eq!(ctx.pixel_size(), (11, 1));
    }

    #[test]
    fn test_surface_size_caps_area() {
        let ctx = RenderContext::new(&[], Size::new(8192.0, 8192.0));
        assert_eq!(ctx.surface_size().unwrap(), (8192, 8192));

        let ctx = RenderContext::new(&[], Size::new(8192.0, 8193.0));
        assert!(matches!(ctx.surface_size(), Err(RendererError::Surface(_))));
        let ctx = RenderContext::new(&[], Size::new(1e6, 1e6));
        assert!(matches!(ctx.surface_size(), Err(RendererError::Surface(_))));
    }
}
