//! Integration tests for the Keywatch REST endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use keywatch_server::router::build_router;
use keywatch_server::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let state = Arc::new(AppState::default());
    state.store.set("greeting", "hello");
    state
}

fn post(path: &str, body: &'static str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/octet-stream")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_get_existing_key() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/db/greeting").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response.into_body()).await, b"hello");
}

#[tokio::test]
async fn test_get_with_json_format_sets_content_type() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::get("/db/greeting?format=json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_bytes(response.into_body()).await, b"hello");
}

#[tokio::test]
async fn test_get_missing_key_returns_404() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/db/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_set_then_get() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router
        .clone()
        .oneshot(post("/db/color", "blue"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(Request::get("/db/color").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, b"blue");
    assert!(!state.store.was_updated("color"));
}

#[tokio::test]
async fn test_second_set_marks_key_updated() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router.oneshot(post("/db/greeting", "hi")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(state.store.get("greeting"), Some(b"hi".to_vec()));
    assert!(state.store.was_updated("greeting"));
}

#[tokio::test]
async fn test_set_accepts_value_larger_than_default_body_limit() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));
    let value = vec![b'x'; 3 * 1024 * 1024];

    let request = Request::post("/db/big")
        .header("content-type", "application/octet-stream")
        .body(Body::from(value.clone()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(state.store.get("big"), Some(value));
}

#[tokio::test]
async fn test_set_without_watcher_does_not_block() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        router.oneshot(post("/db/fast", "1")),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(!state.notifier.is_attached());
}

#[tokio::test]
async fn test_set_with_wrong_content_type_is_rejected() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::post("/db/color")
                .header("content-type", "text/plain")
                .body(Body::from("blue"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.get("color").is_none());
}

#[tokio::test]
async fn test_set_without_content_type_is_rejected() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::post("/db/color").body(Body::from("blue")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_type_parameters_are_accepted() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::post("/db/color")
                .header("content-type", "application/octet-stream; charset=binary")
                .body(Body::from("blue"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_key_with_slash_is_rejected() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/db/a/b").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_unsupported_method_returns_405() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::delete("/db/greeting").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "DELETE: method not allowed");
}

#[tokio::test]
async fn test_health_reports_state() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["watcher_attached"], false);
    assert_eq!(json["keys"], 1);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
