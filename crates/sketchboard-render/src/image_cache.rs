//! Decoded image cache shared between the renderer and image loaders.
//!
//! Rendering never blocks on I/O: an unknown reference is recorded as pending
//! and subscribers are told about it. Whoever does the loading hands the bytes
//! back through [`ImageCache::fill`], which announces the result exactly once
//! so the owner can re-render.

use crate::data_url;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use sketchboard_core::shapes::ImageRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tiny_skia::{IntSize, Pixmap};

/// Image cache errors.
#[derive(Debug, Error)]
pub enum ImageCacheError {
    #[error("Not a base64 data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no pixels")]
    Empty,
}

/// Change in the state of a cached reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEvent {
    /// First sighting of a reference; a loader should fetch it.
    Requested(ImageRef),
    /// The reference decoded and is ready to draw.
    Loaded(ImageRef),
    /// The reference could not be loaded or decoded.
    Failed(ImageRef),
}

/// What a lookup found.
#[derive(Debug, Clone)]
pub enum Resolution {
    Ready(Arc<Pixmap>),
    Pending,
    Failed,
}

#[derive(Debug, Clone)]
enum Entry {
    Pending,
    Ready(Arc<Pixmap>),
    Failed(String),
}

/// Thread-safe map from image reference to decoded pixels.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: RwLock<HashMap<ImageRef, Entry>>,
    subscribers: Mutex<Vec<UnboundedSender<ImageEvent>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a reference. Unknown references are registered as pending and
    /// announced with [`ImageEvent::Requested`].
    pub fn resolve(&self, image: &ImageRef) -> Resolution {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(image) {
                Some(Entry::Ready(pixmap)) => return Resolution::Ready(Arc::clone(pixmap)),
                Some(Entry::Pending) => return Resolution::Pending,
                Some(Entry::Failed(_)) => return Resolution::Failed,
                None => {}
            }
        }
        self.request(image);
        Resolution::Pending
    }

    /// Register interest in a reference ahead of rendering.
    ///
    /// Returns `true` if the reference was unknown and a load was requested.
    pub fn request(&self, image: &ImageRef) -> bool {
        let inserted = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if entries.contains_key(image) {
                false
            } else {
                entries.insert(image.clone(), Entry::Pending);
                true
            }
        };
        if inserted {
            log::debug!("Image requested: {image}");
            self.emit(ImageEvent::Requested(image.clone()));
        }
        inserted
    }

    /// Decode `bytes` and store them under `image`.
    ///
    /// Emits [`ImageEvent::Loaded`] only on the transition to ready; filling
    /// a reference that is already ready is a no-op. A decode failure marks
    /// the reference failed.
    pub fn fill(&self, image: &ImageRef, bytes: &[u8]) -> Result<(), ImageCacheError> {
        let pixmap = match decode_pixmap(bytes) {
            Ok(pixmap) => pixmap,
            Err(err) => {
                self.fail(image, err.to_string());
                return Err(err);
            }
        };

        let transitioned = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match entries.get(image) {
                Some(Entry::Ready(_)) => false,
                _ => {
                    entries.insert(image.clone(), Entry::Ready(Arc::new(pixmap)));
                    true
                }
            }
        };
        if transitioned {
            log::debug!("Image loaded: {image}");
            self.emit(ImageEvent::Loaded(image.clone()));
        }
        Ok(())
    }

    /// Mark a reference as failed. Ready images are left alone.
    pub fn fail(&self, image: &ImageRef, reason: impl Into<String>) {
        let reason = reason.into();
        let transitioned = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match entries.get(image) {
                Some(Entry::Ready(_)) | Some(Entry::Failed(_)) => false,
                _ => {
                    entries.insert(image.clone(), Entry::Failed(reason.clone()));
                    true
                }
            }
        };
        if transitioned {
            log::warn!("Image failed: {image}: {reason}");
            self.emit(ImageEvent::Failed(image.clone()));
        }
    }

    /// Drop every entry. A load still in flight fills its reference again
    /// when it finishes.
    pub fn clear(&self) {
        let evicted = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let evicted = entries.len();
            entries.clear();
            evicted
        };
        log::debug!("Image cache cleared, {evicted} entries evicted");
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> UnboundedReceiver<ImageEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn is_ready(&self, image: &ImageRef) -> bool {
        matches!(
            self.entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(image),
            Some(Entry::Ready(_))
        )
    }

    /// Failure reason recorded for a reference.
    pub fn failure(&self, image: &ImageRef) -> Option<String> {
        match self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(image)
        {
            Some(Entry::Failed(reason)) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Number of known references, in any state.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(&self, event: ImageEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropped receivers are pruned here.
        subscribers.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

/// Decode the payload of a `data:` image reference.
pub fn decode_data_url(image: &ImageRef) -> Result<Vec<u8>, ImageCacheError> {
    data_url::decode_data_url(image.as_str())
        .map(|url| url.bytes)
        .ok_or_else(|| ImageCacheError::InvalidDataUrl(image.to_string()))
}

/// Decode encoded image bytes into a premultiplied pixmap.
fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap, ImageCacheError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(ImageCacheError::Empty)?;

    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * a + 127) / 255) as u8;
            }
        }
    }
    Pixmap::from_vec(data, size).ok_or(ImageCacheError::Empty)
}
