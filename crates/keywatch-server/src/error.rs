//! Error types for the Keywatch HTTP layer.
//!
//! [`ApiError`] covers every failure a request handler can report and
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Errors that can occur while handling a store request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested key has never been set.
    #[error("key does not exist: {0}")]
    KeyNotFound(String),

    /// The key in the request path is not a valid key.
    #[error("requested key not valid: {0}")]
    InvalidKey(String),

    /// A write arrived with a content type other than
    /// `application/octet-stream`.
    #[error("content type {0:?} not supported, application/octet-stream is supported")]
    InvalidContentType(String),

    /// The route exists but not for this method.
    #[error("{0}: method not allowed")]
    MethodNotAllowed(Method),
}

impl ApiError {
    /// HTTP status code for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::KeyNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidKey(_) | Self::InvalidContentType(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
