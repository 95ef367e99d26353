//! REST endpoint handlers for the Keywatch server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/db/{key}` | Read a value |
//! | `POST` | `/db/{key}` | Write a value and notify the watcher |
//! | `GET` | `/health` | Liveness plus watcher/key counts |
//!
//! A write responds only after the notification has been handed to the
//! attached watcher (or discarded because there is none), so a write may
//! block until the current watcher reads the previous notification.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

/// Query parameters for `GET /db/{key}`.
#[derive(Debug, serde::Deserialize)]
pub struct GetQuery {
    /// `json` labels the response as `application/json`.
    pub format: Option<String>,
}

/// Read the value stored under `key`.
///
/// # Route
///
/// `GET /db/{key}`
pub async fn get_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<GetQuery>,
) -> Result<Response, ApiError> {
    let key = validate_key(key)?;
    let value = state.store.get(&key).ok_or(ApiError::KeyNotFound(key))?;

    let content_type = if query.format.as_deref() == Some("json") {
        "application/json"
    } else {
        OCTET_STREAM
    };

    Ok(([(CONTENT_TYPE, content_type)], value).into_response())
}

/// Store the request body under `key`, then publish the change.
///
/// # Route
///
/// `POST /db/{key}` with `Content-Type: application/octet-stream`
pub async fn set_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let key = validate_key(key)?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if !essence.eq_ignore_ascii_case(OCTET_STREAM) {
        return Err(ApiError::InvalidContentType(content_type.to_owned()));
    }

    let existed = state.store.set(key.as_str(), body.to_vec());
    info!(key, bytes = body.len(), overwrite = existed, "stored value");

    let outcome = state.notifier.publish(&key, &body).await;
    debug!(key, ?outcome, "publish finished");

    Ok(StatusCode::CREATED)
}

/// Report liveness, whether a watcher is attached, and the key count.
///
/// # Route
///
/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "watcher_attached": state.notifier.is_attached(),
        "keys": state.store.len(),
    }))
}

/// Fallback for methods other than `GET` and `POST` on `/db/{key}`.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

/// Keys are single path segments.
fn validate_key(key: String) -> Result<String, ApiError> {
    if key.is_empty() || key.contains('/') {
        return Err(ApiError::InvalidKey(key));
    }
    Ok(key)
}
