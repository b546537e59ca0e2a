#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, RgbImage};
use tower::ServiceExt;

use formcheck_api::config::ServerConfig;
use formcheck_api::jobs::JobStore;
use formcheck_api::router::build_app_router;
use formcheck_api::state::AppState;
use formcheck_core::landmark::{Landmark, LANDMARK_COUNT};
use formcheck_core::thresholds::{AnalysisThresholds, PositionThresholds};
use formcheck_pipeline::estimator::EstimatorError;
use formcheck_pipeline::source::SampledFrame;
use formcheck_pipeline::{
    FrameSource, PipelineError, PoseEstimator, Sampling, VideoAnalyzer, VideoMeta, VideoOpener,
};

pub const BOUNDARY: &str = "formcheck-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        pose_estimator_url: "http://127.0.0.1:0/estimate".to_string(),
        pose_estimator_timeout_secs: 1,
        frame_stride: 1,
        max_frames: 1800,
    }
}

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Yields `frames` tiny frames regardless of the uploaded file.
pub struct StubOpener {
    pub frames: u64,
}

#[async_trait]
impl VideoOpener for StubOpener {
    async fn open(&self, _: &Path, _: Sampling) -> Result<Box<dyn FrameSource>, PipelineError> {
        Ok(Box::new(StubSource {
            meta: VideoMeta::new(30.0, self.frames, 0.0, 2, 2),
            next: 0,
        }))
    }
}

struct StubSource {
    meta: VideoMeta,
    next: u64,
}

#[async_trait]
impl FrameSource for StubSource {
    fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    async fn next_frame(&mut self) -> Result<Option<SampledFrame>, PipelineError> {
        if self.next >= self.meta.frame_count {
            return Ok(None);
        }
        let index = self.next;
        self.next += 1;
        Ok(Some(SampledFrame {
            index,
            image: RgbImage::new(2, 2),
        }))
    }
}

/// Rejects every file as undecodable.
pub struct BrokenOpener;

#[async_trait]
impl VideoOpener for BrokenOpener {
    async fn open(&self, _: &Path, _: Sampling) -> Result<Box<dyn FrameSource>, PipelineError> {
        Err(PipelineError::Input("Unable to open video file".into()))
    }
}

/// Reports the same fully visible body on every frame.
pub struct StillPose;

#[async_trait]
impl PoseEstimator for StillPose {
    async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
        Ok(Some(vec![Landmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT]))
    }
}

/// Never detects a body.
pub struct Blind;

#[async_trait]
impl PoseEstimator for Blind {
    async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
        Ok(None)
    }
}

/// Crashes on the first frame.
pub struct Panicky;

#[async_trait]
impl PoseEstimator for Panicky {
    async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
        panic!("estimator crashed");
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub jobs: Arc<JobStore>,
}

/// Build the full application router around the given collaborators.
pub fn build_test_app(
    opener: impl VideoOpener + 'static,
    estimator: impl PoseEstimator + 'static,
) -> TestApp {
    let config = test_config();
    let estimator: Arc<dyn PoseEstimator> = Arc::new(estimator);
    let analyzer = VideoAnalyzer::new(
        Arc::new(opener),
        Arc::clone(&estimator),
        AnalysisThresholds::default(),
        config.sampling(),
    );
    let jobs = Arc::new(JobStore::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        jobs: Arc::clone(&jobs),
        analyzer,
        estimator,
        position_thresholds: Arc::new(PositionThresholds::default()),
    };

    TestApp {
        router: build_app_router(state, &config),
        jobs,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A multipart body with one file part and an optional `exercise_type`.
pub fn multipart_body(field: &str, filename: &str, data: &[u8], exercise: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    if let Some(exercise) = exercise {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"exercise_type\"\r\n\r\n{exercise}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, body: Vec<u8>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A uniformly grey PNG.
pub fn png(level: u8) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, image::Rgb([level; 3])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
