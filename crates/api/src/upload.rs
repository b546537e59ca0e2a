//! Multipart upload handling.
//!
//! Videos stream to a temp file; images are small enough to buffer. Both
//! carry an optional `exercise_type` text field.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, StatusCode};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use formcheck_core::exercise::ExerciseType;

use crate::error::{AppError, AppResult};

pub const VIDEO_FIELD: &str = "video";
pub const IMAGE_FIELD: &str = "image";
pub const EXERCISE_FIELD: &str = "exercise_type";

/// Reject a request whose declared `Content-Length` is over `limit` before
/// reading the body.
pub fn ensure_content_length(headers: &HeaderMap, limit: u64) -> AppResult<()> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    match declared {
        Some(len) if len > limit => Err(AppError::PayloadTooLarge(limit)),
        _ => Ok(()),
    }
}

/// An uploaded video on disk. The file is deleted by [`UploadedVideo::cleanup`]
/// or, failing that, on drop.
#[derive(Debug)]
pub struct UploadedVideo {
    pub file: NamedTempFile,
    pub exercise: ExerciseType,
}

impl UploadedVideo {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Delete the temp file, logging instead of failing.
    pub fn cleanup(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove uploaded video");
        }
    }
}

#[derive(Debug)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub exercise: ExerciseType,
}

/// Read a `video` + `exercise_type` form, streaming the video to disk.
pub async fn receive_video(mut multipart: Multipart, limit: u64) -> AppResult<UploadedVideo> {
    let mut file: Option<NamedTempFile> = None;
    let mut exercise: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error(limit))? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            VIDEO_FIELD => file = Some(stream_to_temp(field, limit).await?),
            EXERCISE_FIELD => exercise = Some(field.text().await.map_err(multipart_error(limit))?),
            _ => {} // ignore unknown fields
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("Missing required 'video' field".into()))?;
    Ok(UploadedVideo {
        file,
        exercise: exercise_from_form(exercise.as_deref()),
    })
}

/// Read an `image` + `exercise_type` form into memory.
pub async fn receive_image(mut multipart: Multipart, limit: u64) -> AppResult<UploadedImage> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut exercise: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error(limit))? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let data = field.bytes().await.map_err(multipart_error(limit))?;
                if data.len() as u64 > limit {
                    return Err(AppError::PayloadTooLarge(limit));
                }
                bytes = Some(data.to_vec());
            }
            EXERCISE_FIELD => exercise = Some(field.text().await.map_err(multipart_error(limit))?),
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| AppError::BadRequest("Missing required 'image' field".into()))?;
    Ok(UploadedImage {
        bytes,
        exercise: exercise_from_form(exercise.as_deref()),
    })
}

fn exercise_from_form(raw: Option<&str>) -> ExerciseType {
    let exercise = ExerciseType::parse_or_default(raw);
    if let Some(raw) = raw {
        if raw.trim().parse::<ExerciseType>().is_err() {
            tracing::debug!(raw, fallback = %exercise, "Unknown exercise type");
        }
    }
    exercise
}

async fn stream_to_temp(mut field: Field<'_>, limit: u64) -> AppResult<NamedTempFile> {
    let suffix = field
        .file_name()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
        .unwrap_or_else(|| ".mp4".into());

    let temp = tempfile::Builder::new()
        .prefix("formcheck-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| AppError::InternalError(format!("Failed to create temp file: {e}")))?;
    let std_file = temp
        .reopen()
        .map_err(|e| AppError::InternalError(format!("Failed to open temp file: {e}")))?;
    let mut out = tokio::fs::File::from_std(std_file);

    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error(limit))? {
        written += chunk.len() as u64;
        if written > limit {
            return Err(AppError::PayloadTooLarge(limit));
        }
        out.write_all(&chunk)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;
    }
    out.flush()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write upload: {e}")))?;

    if written == 0 {
        return Err(AppError::BadRequest("Uploaded video is empty".into()));
    }
    tracing::debug!(bytes = written, path = %temp.path().display(), "Stored uploaded video");
    Ok(temp)
}

/// Map multipart failures, treating a tripped body limit as 413.
fn multipart_error(limit: u64) -> impl Fn(MultipartError) -> AppError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(limit)
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}
