use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lgl_core::CoreError;
use lgl_pool::api::RpcError;
use lgl_pool::LayoutError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`LayoutError`] and adds request-shape errors. Implements
/// [`IntoResponse`] to produce `{ "error", "code" }` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Layout(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Layout(layout) => match layout {
                LayoutError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
                }
                LayoutError::Merge(msg) => {
                    tracing::warn!(error = %msg, "Layout output could not be merged");
                    (StatusCode::BAD_GATEWAY, "MERGE_ERROR", msg.clone())
                }
                // The worker's own message is passed through as-is.
                LayoutError::Rpc(RpcError::Status { body, .. }) => {
                    (StatusCode::BAD_GATEWAY, "WORKER_ERROR", body.clone())
                }
                LayoutError::Rpc(rpc) => {
                    tracing::warn!(error = %rpc, "Layout worker call failed");
                    (StatusCode::BAD_GATEWAY, "WORKER_ERROR", rpc.to_string())
                }
                LayoutError::Io { .. } | LayoutError::StartupFailure(_) => {
                    tracing::error!(error = %layout, "Internal layout error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
