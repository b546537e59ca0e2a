use formcheck_pipeline::source::{DEFAULT_FRAME_STRIDE, DEFAULT_MAX_FRAMES};
use formcheck_pipeline::Sampling;

/// Default upload ceiling: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Synchronous analysis runs inside the
    /// request, so this is generous (default: `300`).
    pub request_timeout_secs: u64,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: u64,
    /// Endpoint of the pose estimation sidecar.
    pub pose_estimator_url: String,
    /// Per-frame timeout for the pose estimator (default: `10`).
    pub pose_estimator_timeout_secs: u64,
    /// Analyze every n-th source frame (default: `2`).
    pub frame_stride: u64,
    /// Cap on decoded source frames per video (default: `1800`).
    pub max_frames: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                          |
    /// |-------------------------------|----------------------------------|
    /// | `HOST`                        | `0.0.0.0`                        |
    /// | `PORT`                        | `8000`                           |
    /// | `CORS_ORIGINS`                | `http://localhost:3000`          |
    /// | `REQUEST_TIMEOUT_SECS`        | `300`                            |
    /// | `MAX_UPLOAD_BYTES`            | `104857600`                      |
    /// | `POSE_ESTIMATOR_URL`          | `http://localhost:8500/estimate` |
    /// | `POSE_ESTIMATOR_TIMEOUT_SECS` | `10`                             |
    /// | `FRAME_STRIDE`                | `2`                              |
    /// | `MAX_FRAMES`                  | `1800`                           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 300);
        let max_upload_bytes = env_u64("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        let pose_estimator_url = std::env::var("POSE_ESTIMATOR_URL")
            .unwrap_or_else(|_| "http://localhost:8500/estimate".into());
        let pose_estimator_timeout_secs = env_u64("POSE_ESTIMATOR_TIMEOUT_SECS", 10);

        let frame_stride = env_u64("FRAME_STRIDE", DEFAULT_FRAME_STRIDE);
        let max_frames = env_u64("MAX_FRAMES", DEFAULT_MAX_FRAMES);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            pose_estimator_url,
            pose_estimator_timeout_secs,
            frame_stride,
            max_frames,
        }
    }

    /// Frame sampling derived from `FRAME_STRIDE` and `MAX_FRAMES`.
    pub fn sampling(&self) -> Sampling {
        Sampling {
            stride: self.frame_stride.max(1),
            max_frames: self.max_frames,
        }
    }
}

/// Read a `u64` env var, panicking at startup on a malformed value.
fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}
