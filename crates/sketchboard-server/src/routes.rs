//! Router assembly and canvas command handlers.

use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use kurbo::Point;
use serde::Deserialize;
use serde_json::{Value, json};
use sketchboard_core::canvas::{CanvasError, DocumentSnapshot};
use sketchboard_core::{Shape, ShapeDraft, ShapeId};
use sketchboard_render::{JPEG_QUALITY, RasterPayload, export_pdf};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Full application router: canvas API, health check, static client files.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/state", get(get_state))
        .route("/init", post(init))
        .route("/add-shape", post(add_shape))
        .route("/move", post(move_shape))
        .route("/hit", get(hit))
        .route("/shape/{id}", get(get_shape))
        .route("/undo", post(undo))
        .route("/redo", post(redo))
        .route("/clear", post(clear))
        .route("/render.png", get(render_png))
        .route("/render.jpg", get(render_jpeg))
        .route("/export-pdf", post(export_client_pdf))
        .route("/export.pdf", get(export_server_pdf));

    Router::new()
        .nest("/api/canvas", api)
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub id: ShapeId,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Deserialize)]
pub struct HitQuery {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBody {
    pub image_data: String,
}

async fn health() -> &'static str {
    "ok"
}

/// `GET /api/canvas/state`
pub async fn get_state(State(state): State<AppState>) -> Json<DocumentSnapshot> {
    Json(state.document.lock().await.snapshot())
}

/// `POST /api/canvas/init`: set the canvas size. Missing or non-numeric
/// dimensions are an invalid dimension, like non-positive ones.
pub async fn init(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (width, height) = (dimension(&body, "width")?, dimension(&body, "height")?);
    let mut doc = state.document.lock().await;
    doc.resize(width, height)?;
    state.mark_dirty();
    tracing::info!(width, height, "canvas resized");
    Ok(Json(json!({ "status": "ok", "width": doc.width(), "height": doc.height() })))
}

fn dimension(body: &Value, key: &str) -> Result<f64, CanvasError> {
    let value = body.get(key).unwrap_or(&Value::Null);
    value
        .as_f64()
        .ok_or_else(|| CanvasError::InvalidDimension(format!("{key}: {value}")))
}

/// `POST /api/canvas/add-shape`: commit a shape and start loading its image.
pub async fn add_shape(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let draft = ShapeDraft::from_json(&body)?;
    let shape = {
        let mut doc = state.document.lock().await;
        let shape = doc.add_shape(draft)?.clone();
        state.mark_dirty();
        shape
    };
    tracing::info!(id = shape.id(), kind = shape.geometry().kind(), "shape added");

    if let Some(src) = shape.geometry().image_ref() {
        state.images.request(src);
    }
    Ok(Json(json!({ "status": "ok", "shape": shape })))
}

/// `POST /api/canvas/move`: translate a shape. Unknown ids are a no-op.
pub async fn move_shape(
    State(state): State<AppState>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let mut doc = state.document.lock().await;
    let moved = doc.move_shape(body.id, body.dx, body.dy)?;
    if moved {
        state.mark_dirty();
    } else {
        tracing::debug!(id = body.id, "move ignored, no such shape");
    }
    Ok(Json(json!({ "status": "ok", "moved": moved })))
}

/// `GET /api/canvas/hit?x=&y=`: id of the topmost shape under the point.
pub async fn hit(
    State(state): State<AppState>,
    query: Result<Query<HitQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let doc = state.document.lock().await;
    let id = doc.shape_at(Point::new(query.x, query.y)).map(|shape| shape.id());
    Ok(Json(json!({ "id": id })))
}

/// `GET /api/canvas/shape/{id}`
pub async fn get_shape(
    State(state): State<AppState>,
    Path(id): Path<ShapeId>,
) -> Result<Json<Shape>, ApiError> {
    let doc = state.document.lock().await;
    Ok(Json(doc.get(id)?.clone()))
}

/// `POST /api/canvas/undo`
pub async fn undo(State(state): State<AppState>) -> Json<Value> {
    let mut doc = state.document.lock().await;
    let changed = doc.undo();
    if changed {
        state.mark_dirty();
    }
    Json(json!({ "status": "ok", "changed": changed }))
}

/// `POST /api/canvas/redo`
pub async fn redo(State(state): State<AppState>) -> Json<Value> {
    let mut doc = state.document.lock().await;
    let changed = doc.redo();
    if changed {
        state.mark_dirty();
    }
    Json(json!({ "status": "ok", "changed": changed }))
}

/// `POST /api/canvas/clear`
pub async fn clear(State(state): State<AppState>) -> Json<Value> {
    let mut doc = state.document.lock().await;
    doc.clear();
    state.images.clear();
    state.mark_dirty();
    tracing::info!("canvas cleared");
    Json(json!({ "status": "ok" }))
}

/// `GET /api/canvas/render.png`
pub async fn render_png(State(state): State<AppState>) -> Result<Response, ApiError> {
    let frame = state.current_frame().await?;
    let png = tokio::task::spawn_blocking(move || frame.to_png()).await??;
    Ok(([(CONTENT_TYPE, "image/png")], png).into_response())
}

/// `GET /api/canvas/render.jpg`
pub async fn render_jpeg(State(state): State<AppState>) -> Result<Response, ApiError> {
    let frame = state.current_frame().await?;
    let jpeg = tokio::task::spawn_blocking(move || frame.to_jpeg(JPEG_QUALITY)).await??;
    Ok(([(CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

/// `POST /api/canvas/export-pdf`: wrap a client-side raster in a PDF page
/// sized to the canvas.
pub async fn export_client_pdf(
    State(state): State<AppState>,
    body: Result<Json<ExportBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let (width, height) = {
        let doc = state.document.lock().await;
        (doc.width(), doc.height())
    };
    let pdf = tokio::task::spawn_blocking(move || {
        let payload = RasterPayload::from_data_url(&body.image_data)?;
        export_pdf(&payload, width, height)
    })
    .await??;
    tracing::info!(width, height, bytes = pdf.len(), "exported client raster");
    Ok(pdf_response(pdf))
}

/// `GET /api/canvas/export.pdf`: the server-side render as a PDF.
pub async fn export_server_pdf(State(state): State<AppState>) -> Result<Response, ApiError> {
    let frame = state.current_frame().await?;
    let (width, height) = {
        let doc = state.document.lock().await;
        (doc.width(), doc.height())
    };
    let pdf = tokio::task::spawn_blocking(move || frame.to_pdf(width, height)).await??;
    Ok(pdf_response(pdf))
}

fn pdf_response(pdf: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"canvas.pdf\""),
        ],
        pdf,
    )
        .into_response()
}
