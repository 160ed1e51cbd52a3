//! Glyph outlines for text shapes.

use crate::renderer::{RenderResult, RendererError};
use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use sketchboard_core::shapes::Text;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tiny_skia::PathBuilder;

/// Fonts probed when no font file is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Turns text shapes into fillable paths.
///
/// Every shape is laid out with the one loaded face; the per-shape font
/// family is recorded but not used for lookup. Without a face, callers fall
/// back to the approximate text box.
#[derive(Clone, Default)]
pub struct TextRasterizer {
    font: Option<FontArc>,
    warned: Arc<AtomicBool>,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRasterizer {
    /// Rasterizer with no font.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_font(font: FontArc) -> Self {
        Self {
            font: Some(font),
            warned: Arc::default(),
        }
    }

    /// Parse a TrueType/OpenType font.
    pub fn from_font_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RendererError::InitFailed(format!("invalid font: {e}")))?;
        Ok(Self::from_font(font))
    }

    /// Load a font file from disk.
    pub fn load(path: &Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            RendererError::InitFailed(format!("cannot read font {}: {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes)
    }

    /// Load `explicit` if given, else the first loadable system font.
    ///
    /// An explicit path that fails to load is an error. Finding no system
    /// font is not; the rasterizer then has no font.
    pub fn discover(explicit: Option<&Path>) -> RenderResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for candidate in SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from) {
            if !candidate.is_file() {
                continue;
            }
            match Self::load(&candidate) {
                Ok(rasterizer) => {
                    log::info!("Using font {}", candidate.display());
                    return Ok(rasterizer);
                }
                Err(e) => log::debug!("Skipping font candidate: {e}"),
            }
        }
        log::warn!("No usable system font found; text renders as outline boxes");
        Ok(Self::new())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Log once per rasterizer (and its clones) that text is being drawn
    /// without a font.
    pub(crate) fn warn_missing_font(&self) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            log::warn!("No font loaded; drawing text shapes as their bounding boxes");
        }
    }

    /// Outline of `text` with its baseline origin at `(x, y)`.
    ///
    /// `None` without a font, or when no glyph has an outline (whitespace).
    pub fn glyph_path(&self, text: &Text) -> Option<tiny_skia::Path> {
        let font = self.font.as_ref()?;
        let size = text.size as f32;
        if !(size.is_finite() && size > 0.0) {
            return None;
        }
        let scaled = font.as_scaled(PxScale::from(size));
        let (h_scale, v_scale) = (scaled.h_scale_factor(), scaled.v_scale_factor());
        let baseline = text.y as f32;

        let mut builder = PathBuilder::new();
        let mut caret = text.x as f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            if let Some(outline) = font.outline(id) {
                // Font units are y-up; the canvas is y-down.
                let map = |p: ab_glyph::Point| (caret + p.x * h_scale, baseline - p.y * v_scale);
                let mut last: Option<ab_glyph::Point> = None;
                for curve in &outline.curves {
                    let start = match curve {
                        OutlineCurve::Line(a, _)
                        | OutlineCurve::Quad(a, _, _)
                        | OutlineCurve::Cubic(a, _, _, _) => *a,
                    };
                    if last != Some(start) {
                        if last.is_some() {
                            builder.close();
                        }
                        let (x, y) = map(start);
                        builder.move_to(x, y);
                    }
                    let end = match curve {
                        OutlineCurve::Line(_, b) => {
                            let (x, y) = map(*b);
                            builder.line_to(x, y);
                            *b
                        }
                        OutlineCurve::Quad(_, c, b) => {
                            let ((cx, cy), (x, y)) = (map(*c), map(*b));
                            builder.quad_to(cx, cy, x, y);
                            *b
                        }
                        OutlineCurve::Cubic(_, c1, c2, b) => {
                            let ((x1, y1), (x2, y2), (x, y)) = (map(*c1), map(*c2), map(*b));
                            builder.cubic_to(x1, y1, x2, y2, x, y);
                            *b
                        }
                    };
                    last = Some(end);
                }
                if last.is_some() {
                    builder.close();
                }
            }
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        builder.finish()
    }
}
