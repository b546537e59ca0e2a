//! Integration tests for `POST /api/check-position`.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, multipart_body, png, post_multipart, Blind, StillPose, StubOpener};

#[tokio::test]
async fn missing_pose_asks_for_full_body() {
    let app = build_test_app(StubOpener { frames: 0 }, Blind);
    let body = multipart_body("image", "frame.png", &png(180), Some("quadruped"));
    let response = post_multipart(&app.router, "/api/check-position", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_position_correct"], false);
    assert!(json["feedback"].as_str().unwrap().contains("Pose not detected"));
}

#[tokio::test]
async fn detected_pose_reports_details() {
    let app = build_test_app(StubOpener { frames: 0 }, StillPose);
    let body = multipart_body("image", "frame.png", &png(180), Some("toe_drive"));
    let response = post_multipart(&app.router, "/api/check-position", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["is_position_correct"].is_boolean());
    assert!(json["position_details"].is_object());
}

#[tokio::test]
async fn undecodable_image_is_bad_request() {
    let app = build_test_app(StubOpener { frames: 0 }, StillPose);
    let body = multipart_body("image", "frame.png", b"garbage", None);
    let response = post_multipart(&app.router, "/api/check-position", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn missing_image_field_is_bad_request() {
    let app = build_test_app(StubOpener { frames: 0 }, StillPose);
    let body = multipart_body("video", "frame.png", &png(180), None);
    let response = post_multipart(&app.router, "/api/check-position", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
