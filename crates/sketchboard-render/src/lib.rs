//! SketchBoard Render Library
//!
//! Renderer abstraction and the CPU implementation for SketchBoard, plus the
//! shared image cache and raster-to-PDF export.

mod data_url;
pub mod export;
pub mod image_cache;
mod renderer;
mod skia_impl;
pub mod text;

pub use export::{ExportError, JPEG_QUALITY, RasterPayload, export_pdf};
pub use image_cache::{ImageCache, ImageCacheError, ImageEvent, Resolution};
pub use renderer::{MAX_SURFACE_PIXELS, RenderContext, RenderResult, Renderer, RendererError};
pub use skia_impl::{Raster, SkiaRenderer};
pub use text::TextRasterizer;
