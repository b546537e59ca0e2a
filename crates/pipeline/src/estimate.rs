//! Processing-time estimate shown when a background analysis is accepted.

/// Fixed start-up cost in seconds.
pub const BASE_SECONDS: f64 = 3.0;

/// Processing seconds per second of video.
pub const SECONDS_PER_VIDEO_SECOND: f64 = 1.5;

/// Multiplier for clips under [`SHORT_VIDEO_SECS`], which carry
/// proportionally more overhead.
pub const SHORT_VIDEO_FACTOR: f64 = 1.5;

pub const SHORT_VIDEO_SECS: f64 = 10.0;

/// Video length beyond which the estimate stops growing.
pub const MAX_ESTIMATED_DURATION_SECS: f64 = 120.0;

/// Estimated wall-clock seconds to analyze a video of `duration_secs`.
pub fn estimated_processing_seconds(duration_secs: f64) -> u64 {
    let duration = if duration_secs.is_finite() {
        duration_secs.max(0.0)
    } else {
        0.0
    };
    let mut factor = SECONDS_PER_VIDEO_SECOND;
    if duration < SHORT_VIDEO_SECS {
        factor *= SHORT_VIDEO_FACTOR;
    }
    (BASE_SECONDS + duration.min(MAX_ESTIMATED_DURATION_SECS) * factor) as u64
}
