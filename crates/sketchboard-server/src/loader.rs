//! Image loading and re-render on load.
//!
//! The image cache announces references it has not seen. This task loads
//! each one (inline data URL, HTTP(S) fetch, or a file under the static
//! directory), fills the cache, and re-renders once per successful load.

use std::path::{Component, Path, PathBuf};

use futures::StreamExt;
use sketchboard_core::shapes::ImageRef;
use sketchboard_render::image_cache::{ImageCacheError, ImageEvent, decode_data_url};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Cache(#[from] ImageCacheError),
    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("unsupported image reference")]
    Unsupported,
    #[error("image larger than {limit} bytes")]
    TooLarge { limit: usize },
}

/// Spawn the task that reacts to image cache events.
///
/// Subscribes before returning, so no request made afterwards is missed.
pub fn spawn_image_events(state: AppState) -> JoinHandle<()> {
    let mut events = state.images.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                ImageEvent::Requested(src) => {
                    let state = state.clone();
                    tokio::spawn(async move { load(&state, src).await });
                }
                ImageEvent::Loaded(src) => {
                    tracing::debug!(image = %src, "image ready, re-rendering");
                    state.mark_dirty();
                    if let Err(e) = state.render().await {
                        tracing::warn!(error = %e, "re-render after image load failed");
                    }
                }
                ImageEvent::Failed(src) => {
                    tracing::warn!(image = %src, "image could not be loaded");
                }
            }
        }
    })
}

/// Load one reference into the cache, marking it failed on any error.
pub async fn load(state: &AppState, src: ImageRef) {
    if let Err(e) = fetch_and_fill(state, &src).await {
        state.images.fail(&src, e.to_string());
    }
}

async fn fetch_and_fill(state: &AppState, src: &ImageRef) -> Result<(), LoadError> {
    let bytes = if src.is_data_url() {
        let src = src.clone();
        tokio::task::spawn_blocking(move || decode_data_url(&src)).await??
    } else if src.is_remote() {
        let response = state.http.get(src.as_str()).send().await?.error_for_status()?;
        read_capped(response, state.config.body_limit).await?
    } else {
        let path = static_path(&state.config.static_dir, src.as_str()).ok_or(LoadError::Unsupported)?;
        tokio::fs::read(path).await?
    };

    let images = state.images.clone();
    let src = src.clone();
    tokio::task::spawn_blocking(move || images.fill(&src, &bytes)).await??;
    Ok(())
}

/// Read a response body, giving up as soon as it passes `limit` bytes.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, LoadError> {
    let too_large = || LoadError::TooLarge { limit };
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Resolve a relative reference inside `root`. Rejects anything that could
/// leave it.
fn static_path(root: &Path, reference: &str) -> Option<PathBuf> {
    let reference = reference.split(['?', '#']).next()?.trim_start_matches('/');
    let relative = Path::new(reference);
    let mut components = relative.components().peekable();
    components.peek()?;
    if components.all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
        Some(root.join(relative))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::time::Duration;

    fn red_png_data_url() -> String {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(png.into_inner()))
    }

    #[test]
    fn test_static_path_stays_inside_root() {
        let root = Path::new("public");
        assert_eq!(
            static_path(root, "img/cat.png"),
            Some(PathBuf::from("public/img/cat.png"))
        );
        assert_eq!(
            static_path(root, "/img/cat.png?v=2"),
            Some(PathBuf::from("public/img/cat.png"))
        );
        assert_eq!(static_path(root, "../secret.png"), None);
        assert_eq!(static_path(root, "img/../../x.png"), None);
        assert_eq!(static_path(root, ""), None);
    }

    #[tokio::test]
    async fn test_data_url_loads_and_rerenders() {
        let state = test_state();
        let _events = spawn_image_events(state.clone());
        let src = ImageRef::new(red_png_data_url());
        let before = state.revision();

        assert!(state.images.request(&src));
        tokio::time::timeout(Duration::from_secs(5), async {
            while !state.images.is_ready(&src) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while state.revision() == before {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Serve `body` on a local port, chunked when `stream` is set.
    async fn serve_bytes(body: Vec<u8>, stream: bool) -> String {
        use axum::body::Body;
        use axum::routing::get;

        let app = axum::Router::new().route(
            "/img.png",
            get(move || {
                let body = body.clone();
                async move {
                    if stream {
                        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
                            body.chunks(256).map(|c| Ok(c.to_vec())).collect();
                        Body::from_stream(futures::stream::iter(chunks))
                    } else {
                        Body::from(body)
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/img.png")
    }

    #[tokio::test]
    async fn test_remote_body_over_limit_is_rejected() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        for stream in [false, true] {
            let url = serve_bytes(vec![0; 2048], stream).await;

            let response = client.get(&url).send().await.unwrap();
            let err = read_capped(response, 1024).await.unwrap_err();
            assert!(matches!(err, LoadError::TooLarge { limit: 1024 }), "stream={stream}");

            let response = client.get(&url).send().await.unwrap();
            assert_eq!(read_capped(response, 4096).await.unwrap().len(), 2048);
        }
    }

    #[tokio::test]
    async fn test_missing_file_marks_failed() {
        let state = test_state();
        let src = ImageRef::new("definitely/not/here.png");
        state.images.request(&src);
        load(&state, src.clone()).await;
        assert!(state.images.failure(&src).is_some());
    }

    #[tokio::test]
    async fn test_bad_data_url_marks_failed() {
        let state = test_state();
        let src = ImageRef::new("data:image/png;base64,!!!");
        load(&state, src.clone()).await;
        assert!(state.images.failure(&src).is_some());
    }
}
