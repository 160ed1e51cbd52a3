//! Shared application state.
//!
//! One document per process behind an async mutex. Handlers hold the lock
//! for the whole operation; rendering copies the shapes under the lock and
//! rasterizes outside it. The last frame is cached and tagged with the
//! document revision it was rendered from.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use sketchboard_core::CanvasDocument;
use sketchboard_render::{ImageCache, Raster, RenderContext, Renderer, SkiaRenderer, TextRasterizer};
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::ApiError;

struct CachedFrame {
    revision: u64,
    raster: Arc<Raster>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub document: Arc<Mutex<CanvasDocument>>,
    pub images: Arc<ImageCache>,
    pub http: reqwest::Client,
    renderer: SkiaRenderer,
    revision: Arc<AtomicU64>,
    frame: Arc<StdMutex<Option<CachedFrame>>>,
}

impl AppState {
    pub fn new(config: ServerConfig, text: TextRasterizer) -> Result<Self, Box<dyn std::error::Error>> {
        let document = CanvasDocument::with_size(config.canvas_width, config.canvas_height)?;
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;
        let images = Arc::new(ImageCache::new());
        let renderer = SkiaRenderer::new(Arc::clone(&images)).with_text(text);

        Ok(Self {
            config: Arc::new(config),
            document: Arc::new(Mutex::new(document)),
            images,
            http,
            renderer,
            revision: Arc::new(AtomicU64::new(0)),
            frame: Arc::new(StdMutex::new(None)),
        })
    }

    /// Record that the next render would differ from the cached frame.
    ///
    /// Handlers call this while still holding the document lock.
    pub fn mark_dirty(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Render the current document and cache the frame.
    pub async fn render(&self) -> Result<Arc<Raster>, ApiError> {
        let (shapes, size, revision) = {
            let doc = self.document.lock().await;
            (doc.shapes().to_vec(), doc.size(), self.revision())
        };

        let mut renderer = self.renderer.clone();
        let raster = tokio::task::spawn_blocking(move || {
            renderer.render(&RenderContext::new(&shapes, size))
        })
        .await??;
        let raster = Arc::new(raster);

        let mut frame = self.frame.lock().unwrap_or_else(PoisonError::into_inner);
        // A slower render of an older revision must not replace a newer frame.
        if frame.as_ref().is_none_or(|cached| cached.revision <= revision) {
            *frame = Some(CachedFrame {
                revision,
                raster: Arc::clone(&raster),
            });
        }
        Ok(raster)
    }

    /// The cached frame if it is current, else a fresh render.
    pub async fn current_frame(&self) -> Result<Arc<Raster>, ApiError> {
        let current = self.revision();
        let cached = self
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|cached| cached.revision == current)
            .map(|cached| Arc::clone(&cached.raster));
        match cached {
            Some(raster) => Ok(raster),
            None => self.render().await,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = ServerConfig {
        canvas_width: 200.0,
        canvas_height: 100.0,
        ..ServerConfig::default()
    };
    AppState::new(config, TextRasterizer::new()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchboard_core::ShapeDraft;
    use sketchboard_core::shapes::{Geometry, Rectangle};

    #[tokio::test]
    async fn test_frame_is_cached_until_dirty() {
        let state = test_state();
        let first = state.current_frame().await.unwrap();
        let again = state.current_frame().await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!((first.width(), first.height()), (200, 100));

        {
            let mut doc = state.document.lock().await;
            doc.add_shape(ShapeDraft::new(Geometry::Rectangle(Rectangle::new(
                10.0, 10.0, 20.0, 20.0,
            ))))
            .unwrap();
            state.mark_dirty();
        }
        let after = state.current_frame().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &after));
        assert_ne!(*first, *after);
    }
}
