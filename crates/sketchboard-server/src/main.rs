//! SketchBoard Server
//!
//! Serves the browser client and the `/api/canvas` command set over one
//! in-memory canvas document. The server keeps its own render of the
//! document and can export either that render or a client-supplied raster
//! as a single-page PDF.

mod config;
mod error;
mod loader;
mod routes;
mod state;

use sketchboard_render::TextRasterizer;
use tracing::info;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sketchboard_server=info,sketchboard_render=info,tower_http=info".into()
            }),
        )
        .init();

    let config = ServerConfig::from_env();
    let text = TextRasterizer::discover(config.font.as_deref())?;
    let state = AppState::new(config.clone(), text)?;

    let _image_events = loader::spawn_image_events(state.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("SketchBoard server listening on http://{}", config.addr);
    info!("Serving client files from {}", config.static_dir.display());

    axum::serve(listener, app).await?;
    Ok(())
}
