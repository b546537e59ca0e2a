use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formcheck_api::config::ServerConfig;
use formcheck_api::jobs::JobStore;
use formcheck_api::router::build_app_router;
use formcheck_api::state::AppState;
use formcheck_core::thresholds::{AnalysisThresholds, PositionThresholds};
use formcheck_pipeline::{FfmpegOpener, HttpPoseEstimator, PoseEstimator, VideoAnalyzer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "formcheck_api=debug,formcheck_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let analysis_thresholds = AnalysisThresholds::default();
    analysis_thresholds
        .validate()
        .expect("Analysis thresholds are invalid");
    let position_thresholds = PositionThresholds::default();
    position_thresholds
        .validate()
        .expect("Position thresholds are invalid");

    // --- Pose estimator ---
    let estimator: Arc<dyn PoseEstimator> = Arc::new(
        HttpPoseEstimator::new(
            config.pose_estimator_url.clone(),
            Duration::from_secs(config.pose_estimator_timeout_secs),
        )
        .expect("Failed to build pose estimator client"),
    );
    tracing::info!(url = %config.pose_estimator_url, "Pose estimator configured");

    // --- Analyzer ---
    let sampling = config.sampling();
    let analyzer = VideoAnalyzer::new(
        Arc::new(FfmpegOpener),
        Arc::clone(&estimator),
        analysis_thresholds,
        sampling,
    );
    tracing::info!(
        stride = sampling.stride,
        max_frames = sampling.max_frames,
        "Video analyzer ready"
    );

    // --- App state ---
    let jobs = Arc::new(JobStore::new());
    let state = AppState {
        config: Arc::new(config.clone()),
        jobs: Arc::clone(&jobs),
        analyzer,
        estimator,
        position_thresholds: Arc::new(position_thresholds),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Background analyses are not persisted; anything still running is lost.
    let tracked = jobs.len().await;
    tracing::info!(tracked, "Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
