//! HTTP error mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sketchboard_core::CanvasError;
use sketchboard_render::{ExportError, RendererError};
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("{0}")]
    BadRequest(String),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Canvas(CanvasError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Canvas(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(ExportError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) | ApiError::Render(_) | ApiError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = json!({ "status": "error", "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Canvas(CanvasError::InvalidShape("x".into())), StatusCode::BAD_REQUEST),
            (
                ApiError::Canvas(CanvasError::InvalidDimension("0x0".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::Canvas(CanvasError::NotFound(3)), StatusCode::NOT_FOUND),
            (
                ApiError::Export(ExportError::InvalidInput("empty".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Export(ExportError::Pdf("broken".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Render(RendererError::Surface("oom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("missing width".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "missing width");
    }
}
