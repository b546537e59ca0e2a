//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, Blind, StubOpener};

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = build_test_app(StubOpener { frames: 0 }, Blind);
    let response = get(&app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["tracked_analyses"], 0);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(StubOpener { frames: 0 }, Blind);
    let response = get(&app.router, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = build_test_app(StubOpener { frames: 0 }, Blind);
    let response = get(&app.router, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    // MakeRequestUuid produces hyphenated v4 UUIDs.
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
