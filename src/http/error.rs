use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::lifecycle::LifecycleError;
use crate::params::ApplyError;
use crate::system::collector::CollectionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("worker task failed: {0}")]
    Task(String),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::BadRequest(msg) = self {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response();
        }

        let message = self.to_string();
        warn!(error = %message, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": message })),
        )
            .into_response()
    }
}
