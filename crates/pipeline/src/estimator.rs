//! Pose estimation seam.
//!
//! The estimator itself runs out of process; [`HttpPoseEstimator`] talks to
//! it over HTTP. Anything implementing [`PoseEstimator`] can stand in for it.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;

use formcheck_core::landmark::Landmark;

/// JPEG quality used when shipping frames to the estimator.
const JPEG_QUALITY: u8 = 85;

/// Errors from the pose estimation layer.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The estimator returned a non-2xx status code.
    #[error("Pose estimator error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// Maps one RGB frame to the 33-point landmark set, or `None` when no body
/// is detected.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, frame: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError>;
}

/// Body of the estimator's response.
#[derive(Debug, Deserialize)]
struct EstimateResponse {
    landmarks: Option<Vec<Landmark>>,
}

/// HTTP client for a pose estimation sidecar.
///
/// Each frame is POSTed as `image/jpeg`; the sidecar answers
/// `{"landmarks": [...]}` or `{"landmarks": null}`.
pub struct HttpPoseEstimator {
    client: reqwest::Client,
    url: String,
}

impl HttpPoseEstimator {
    pub fn new(url: String, timeout: Duration) -> Result<Self, EstimatorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Create an estimator reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    // ---- private helpers ----

    async fn encode(frame: &RgbImage) -> Result<Vec<u8>, EstimatorError> {
        let frame = frame.clone();
        tokio::task::spawn_blocking(move || encode_jpeg(&frame))
            .await
            .map_err(|e| EstimatorError::Encode(format!("encoder task failed: {e}")))?
    }

    /// Ensure the response has a success status code.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EstimatorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EstimatorError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PoseEstimator for HttpPoseEstimator {
    async fn estimate(&self, frame: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
        let body = Self::encode(frame).await?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let parsed = response.json::<EstimateResponse>().await?;
        Ok(parsed.landmarks.filter(|l| !l.is_empty()))
    }
}

fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, EstimatorError> {
    let mut out = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    frame
        .write_with_encoder(encoder)
        .map_err(|e| EstimatorError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_round_trip_dimensions() {
        let frame = RgbImage::from_pixel(8, 6, image::Rgb([120, 80, 40]));
        let bytes = encode_jpeg(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn response_accepts_null_landmarks() {
        let parsed: EstimateResponse = serde_json::from_str(r#"{"landmarks": null}"#).unwrap();
        assert!(parsed.landmarks.is_none());

        let parsed: EstimateResponse = serde_json::from_str(
            r#"{"landmarks": [{"x": 0.1, "y": 0.2, "z": 0.0, "visibility": 0.9}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.landmarks.unwrap()[0].visibility, 0.9);
    }
}
