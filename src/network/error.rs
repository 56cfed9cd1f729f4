//! HTTP error mapping
//!
//! [`ApiError`] turns store failures into status codes with a JSON
//! `{"error": "..."}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::StoreError;

/// Errors surfaced by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The `:id` path segment is not a non-negative integer
    #[error("Invalid ID {0:?}")]
    InvalidId(String),

    /// The body is missing, not JSON, or not a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    /// Status code this error is rendered with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::MissingId | StoreError::InvalidEntity(_)) | Self::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidBody(rejection) => rejection.status(),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
