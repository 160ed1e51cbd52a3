//! CPU renderer built on tiny-skia.

use crate::export::{self, ExportError, RasterPayload};
use crate::image_cache::{ImageCache, Resolution};
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use crate::text::TextRasterizer;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use kurbo::{BezPath, PathEl};
use sketchboard_core::shapes::{Geometry, Image, ShapeStyle, Text};
use sketchboard_core::{PreviewShape, SerializableColor};
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, SpreadMode, Stroke, StrokeDash,
    Transform,
};

/// Dash pattern for uncommitted text and image previews.
const PREVIEW_DASH: [f32; 2] = [5.0, 3.0];

/// A rendered frame: straight RGBA once read back, premultiplied inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixmap: Pixmap,
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Pixel data as packed RGB, composited over white.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixmap.data().len() / 4 * 3);
        for px in self.pixmap.pixels() {
            // Premultiplied over white: c + (255 - a).
            let inv = 255 - px.alpha();
            rgb.extend_from_slice(&[
                px.red().saturating_add(inv),
                px.green().saturating_add(inv),
                px.blue().saturating_add(inv),
            ]);
        }
        rgb
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RendererError::Encode(e.to_string()))
    }

    /// Baseline JPEG at `quality` (1-100).
    pub fn to_jpeg(&self, quality: u8) -> RenderResult<Vec<u8>> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode(
                &self.to_rgb8(),
                self.width(),
                self.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// One-page PDF of this frame at the export JPEG quality.
    pub fn to_pdf(&self, width: f64, height: f64) -> Result<Vec<u8>, ExportError> {
        let jpeg = self
            .to_jpeg(export::JPEG_QUALITY)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        export::export_pdf(&RasterPayload::from_bytes(jpeg)?, width, height)
    }
}

/// tiny-skia renderer. Cheap to clone; clones share the image cache and font.
#[derive(Debug, Clone)]
pub struct SkiaRenderer {
    images: Arc<ImageCache>,
    text: TextRasterizer,
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self::new(Arc::new(ImageCache::new()))
    }
}

impl SkiaRenderer {
    pub fn new(images: Arc<ImageCache>) -> Self {
        Self {
            images,
            text: TextRasterizer::new(),
        }
    }

    pub fn with_text(mut self, text: TextRasterizer) -> Self {
        self.text = text;
        self
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    pub fn text_rasterizer(&self) -> &TextRasterizer {
        &self.text
    }

    /// Fill (if any) then stroke a path with the shape's style.
    fn render_path(
        &self,
        pixmap: &mut Pixmap,
        path: &BezPath,
        style: &ShapeStyle,
        color: SerializableColor,
        dashed: bool,
    ) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        if let Some(fill) = style.fill_color {
            pixmap.fill_path(
                &path,
                &solid_paint(fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        pixmap.stroke_path(
            &path,
            &solid_paint(color),
            &stroke(style.line_width, dashed),
            Transform::identity(),
            None,
        );
    }

    fn render_text(&self, pixmap: &mut Pixmap, text: &Text, color: SerializableColor) {
        match self.text.glyph_path(text) {
            Some(path) => pixmap.fill_path(
                &path,
                &solid_paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            ),
            None => {
                if !self.text.has_font() {
                    self.text.warn_missing_font();
                    if let Some(path) = to_skia_path(&text.to_path()) {
                        pixmap.stroke_path(
                            &path,
                            &solid_paint(color),
                            &stroke(1.0, false),
                            Transform::identity(),
                            None,
                        );
                    }
                }
            }
        }
    }

    /// Draw a ready image scaled into its box. Pending or failed images draw
    /// nothing; the pending lookup itself requests the load.
    fn render_image(&self, pixmap: &mut Pixmap, image: &Image) {
        let Resolution::Ready(source) = self.images.resolve(&image.src) else {
            return;
        };
        let rect = image.as_rect();
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        let sx = (rect.width() / f64::from(source.width())) as f32;
        let sy = (rect.height() / f64::from(source.height())) as f32;
        let pattern = Pattern::new(
            (*source).as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            Transform::from_row(sx, 0.0, 0.0, sy, rect.x0 as f32, rect.y0 as f32),
        );
        let paint = Paint {
            shader: pattern,
            anti_alias: true,
            ..Paint::default()
        };
        if let Some(target) = tiny_skia::Rect::from_ltrb(
            rect.x0 as f32,
            rect.y0 as f32,
            rect.x1 as f32,
            rect.y1 as f32,
        ) {
            pixmap.fill_rect(target, &paint, Transform::identity(), None);
        }
    }

    fn render_geometry(
        &self,
        pixmap: &mut Pixmap,
        geometry: &Geometry,
        style: &ShapeStyle,
        color: SerializableColor,
    ) {
        match geometry {
            Geometry::Rectangle(_) | Geometry::Circle(_) | Geometry::Line(_) => {
                self.render_path(pixmap, &geometry.to_path(), style, color, false);
            }
            Geometry::Text(text) => self.render_text(pixmap, text, color),
            Geometry::Image(image) => self.render_image(pixmap, image),
        }
    }

    /// Previews draw like committed shapes, except text and images which are
    /// shown as a dashed box (images also show their pixels when ready).
    fn render_preview(&self, pixmap: &mut Pixmap, preview: &PreviewShape) {
        let color = preview.paint_color();
        if !preview.is_dashed() {
            self.render_geometry(pixmap, &preview.geometry, &preview.style, color);
            return;
        }
        if let Geometry::Image(image) = &preview.geometry {
            self.render_image(pixmap, image);
        }
        let outline = ShapeStyle {
            fill_color: None,
            ..preview.style.clone()
        };
        self.render_path(pixmap, &preview.geometry.to_path(), &outline, color, true);
    }
}

impl Renderer for SkiaRenderer {
    type Frame = Raster;

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Raster> {
        let (width, height) = ctx.surface_size()?;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RendererError::Surface(format!("cannot allocate {width}x{height} surface"))
        })?;
        pixmap.fill(skia_color(self.background_color(ctx).into()));

        for shape in ctx.shapes {
            self.render_geometry(&mut pixmap, shape.geometry(), shape.style(), shape.paint_color());
        }
        if let Some(preview) = ctx.preview {
            self.render_preview(&mut pixmap, preview);
        }

        Ok(Raster { pixmap })
    }
}

fn skia_color(color: SerializableColor) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid_paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn stroke(width: f64, dashed: bool) -> Stroke {
    let width = if width.is_finite() && width > 0.0 {
        width as f32
    } else {
        1.0
    };
    Stroke {
        width,
        dash: if dashed {
            StrokeDash::new(PREVIEW_DASH.to_vec(), 0.0)
        } else {
            None
        },
        ..Stroke::default()
    }
}

/// Convert a kurbo path. `None` when the path is empty or degenerate.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => {
                builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
