//! Frame streaming and analysis runner.
//!
//! Pulls sampled frames from a [`FrameSource`], runs each through the
//! [`PoseEstimator`], builds the [`LandmarkSequence`] and hands it to the
//! core analyzer. Progress is reported through a [`ProgressSink`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use formcheck_core::analysis::{analyze, AnalysisResult};
use formcheck_core::error::CoreError;
use formcheck_core::exercise::ExerciseType;
use formcheck_core::job::{FINALIZING_PROGRESS, STREAMING_PROGRESS_CAP};
use formcheck_core::landmark::LandmarkSequence;
use formcheck_core::thresholds::{AnalysisThresholds, JOB_MIN_VALID_FRAMES, SYNC_MIN_VALID_FRAMES};

use crate::error::PipelineError;
use crate::estimator::PoseEstimator;
use crate::source::{FrameSource, Sampling, VideoOpener};

/// Report progress about once per this many source frames.
pub const PROGRESS_INTERVAL_FRAMES: u64 = 30;

/// Receives progress updates while a video is analyzed.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, progress: u8, message: String);
}

/// Discards progress; used by the blocking endpoint.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _progress: u8, _message: String) {}
}

/// How the caller waits for the result, which decides how strict the
/// analysis is about missing pose data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Caller blocks on the request; too little pose data becomes a soft
    /// result with guidance text.
    Blocking,
    /// Background job; too little pose data is an error.
    Background,
}

impl AnalysisMode {
    pub fn min_valid_frames(self) -> usize {
        match self {
            Self::Blocking => SYNC_MIN_VALID_FRAMES,
            Self::Background => JOB_MIN_VALID_FRAMES,
        }
    }
}

/// Streaming progress for source frame `index` of `total`, capped below the
/// finalize milestone.
pub fn streaming_progress(index: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = index.saturating_mul(u64::from(STREAMING_PROGRESS_CAP)) / total;
    pct.min(u64::from(STREAMING_PROGRESS_CAP)) as u8
}

/// Wires the collaborators together for one kind of analysis.
#[derive(Clone)]
pub struct VideoAnalyzer {
    opener: Arc<dyn VideoOpener>,
    estimator: Arc<dyn PoseEstimator>,
    thresholds: AnalysisThresholds,
    sampling: Sampling,
}

impl VideoAnalyzer {
    pub fn new(
        opener: Arc<dyn VideoOpener>,
        estimator: Arc<dyn PoseEstimator>,
        thresholds: AnalysisThresholds,
        sampling: Sampling,
    ) -> Self {
        Self {
            opener,
            estimator,
            thresholds,
            sampling,
        }
    }

    pub fn thresholds(&self) -> &AnalysisThresholds {
        &self.thresholds
    }

    /// Open a video so its metadata can be inspected before analysis.
    pub async fn open(&self, path: &std::path::Path) -> Result<Box<dyn FrameSource>, PipelineError> {
        self.opener.open(path, self.sampling).await
    }

    /// Stream every sampled frame through the estimator.
    ///
    /// A frame the estimator fails on is recorded as having no pose; only
    /// when every frame fails is the estimator error returned.
    pub async fn collect(
        &self,
        source: &mut dyn FrameSource,
        progress: &dyn ProgressSink,
    ) -> Result<LandmarkSequence, PipelineError> {
        let meta = source.meta().clone();
        let total = self.sampling.decoded_frames(meta.frame_count);
        let mut seq = LandmarkSequence::new(meta.fps);
        seq.duration_secs = meta.duration_secs;

        let mut failures = 0usize;
        let mut last_error = None;
        let mut next_report = 0;
        while let Some(frame) = source.next_frame().await? {
            let landmarks = match self.estimator.estimate(&frame.image).await {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    tracing::warn!(frame = frame.index, error = %e, "Pose estimation failed for frame");
                    failures += 1;
                    last_error = Some(e);
                    None
                }
            };
            if !seq.push(frame.index, landmarks) {
                tracing::warn!(frame = frame.index, "Dropping out-of-order frame");
            }

            // Sampled indices need not land on interval multiples.
            if frame.index >= next_report {
                next_report = frame.index + PROGRESS_INTERVAL_FRAMES;
                progress
                    .report(
                        streaming_progress(frame.index, total),
                        format!("Analyzing frame {}/{}...", frame.index, total),
                    )
                    .await;
            }
        }

        if seq.is_empty() {
            return Err(PipelineError::Input(
                "Unable to read any frames from the video".into(),
            ));
        }
        if failures == seq.len() {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }

        tracing::debug!(
            sampled = seq.len(),
            valid = seq.valid_frame_count(),
            failures,
            "Collected landmark sequence"
        );
        Ok(seq)
    }

    /// Collect and analyze an opened video.
    pub async fn analyze_source(
        &self,
        mut source: Box<dyn FrameSource>,
        exercise: ExerciseType,
        mode: AnalysisMode,
        progress: &dyn ProgressSink,
    ) -> Result<AnalysisResult, PipelineError> {
        let started = Instant::now();
        let (width, height) = (source.meta().width, source.meta().height);
        let seq = self.collect(source.as_mut(), progress).await?;

        progress
            .report(FINALIZING_PROGRESS, "Analyzing movement patterns...".into())
            .await;

        let mut result = match analyze(&seq, exercise, &self.thresholds, mode.min_valid_frames()) {
            Ok(result) => result,
            Err(CoreError::InsufficientData { found, required })
                if mode == AnalysisMode::Blocking =>
            {
                tracing::info!(found, required, "Returning insufficient-data result");
                AnalysisResult::insufficient_data(&seq, exercise, &self.thresholds)
            }
            Err(e) => return Err(e.into()),
        };

        let elapsed = started.elapsed().as_secs_f64();
        result.processing_metadata.processing_time_seconds = Some(elapsed);
        result.processing_metadata.video_dimensions = Some((width, height));
        tracing::info!(
            exercise = %exercise,
            repetitions = result.repetitions,
            elapsed_secs = elapsed,
            "Video analysis finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EstimatorError;
    use crate::source::{SampledFrame, VideoMeta};
    use assert_matches::assert_matches;
    use formcheck_core::landmark::{Landmark, LANDMARK_COUNT};
    use image::RgbImage;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct VecSource {
        meta: VideoMeta,
        frames: std::vec::IntoIter<u64>,
    }

    #[async_trait]
    impl FrameSource for VecSource {
        fn meta(&self) -> &VideoMeta {
            &self.meta
        }

        async fn next_frame(&mut self) -> Result<Option<SampledFrame>, PipelineError> {
            Ok(self.frames.next().map(|index| SampledFrame {
                index,
                image: RgbImage::new(2, 2),
            }))
        }
    }

    fn source(frames: u64) -> Box<dyn FrameSource> {
        Box::new(VecSource {
            meta: VideoMeta::new(30.0, frames, 0.0, 2, 2),
            frames: (0..frames).step_by(2).collect::<Vec<_>>().into_iter(),
        })
    }

    struct NoOpener;

    #[async_trait]
    impl VideoOpener for NoOpener {
        async fn open(&self, _: &Path, _: Sampling) -> Result<Box<dyn FrameSource>, PipelineError> {
            Err(PipelineError::Input("no video".into()))
        }
    }

    /// Detects a body in every frame, rocking the hips up and down.
    struct Rocking {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoseEstimator for Rocking {
        async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            let y = 0.6 + 0.05 * (n / 15.0 * std::f64::consts::TAU).sin();
            let mut set = vec![Landmark::new(0.5, y, 0.0, 0.9); LANDMARK_COUNT];
            set[0] = Landmark::new(0.1, 0.4, 0.0, 0.9);
            Ok(Some(set))
        }
    }

    struct Blind;

    #[async_trait]
    impl PoseEstimator for Blind {
        async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
            Ok(None)
        }
    }

    struct Down;

    #[async_trait]
    impl PoseEstimator for Down {
        async fn estimate(&self, _: &RgbImage) -> Result<Option<Vec<Landmark>>, EstimatorError> {
            Err(EstimatorError::ApiError {
                status: 503,
                body: "warming up".into(),
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u8>>);

    #[async_trait]
    impl ProgressSink for Recorder {
        async fn report(&self, progress: u8, _message: String) {
            self.0.lock().unwrap().push(progress);
        }
    }

    fn analyzer(estimator: Arc<dyn PoseEstimator>) -> VideoAnalyzer {
        VideoAnalyzer::new(
            Arc::new(NoOpener),
            estimator,
            AnalysisThresholds::default(),
            Sampling::default(),
        )
    }

    #[test]
    fn streaming_progress_is_capped() {
        assert_eq!(streaming_progress(0, 100), 0);
        assert_eq!(streaming_progress(50, 100), 45);
        assert_eq!(streaming_progress(500, 100), 90);
        assert_eq!(streaming_progress(10, 0), 0);
    }

    #[tokio::test]
    async fn collects_every_sampled_frame() {
        let a = analyzer(Arc::new(Rocking {
            calls: AtomicUsize::new(0),
        }));
        let mut src = source(120);
        let seq = a.collect(src.as_mut(), &NoProgress).await.unwrap();
        assert_eq!(seq.len(), 60);
        assert_eq!(seq.frames[1].index, 2);
        assert!((seq.duration() - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_below_finalize() {
        let a = analyzer(Arc::new(Rocking {
            calls: AtomicUsize::new(0),
        }));
        let rec = Recorder::default();
        a.analyze_source(source(300), ExerciseType::Quadruped, AnalysisMode::Background, &rec)
            .await
            .unwrap();
        let seen = rec.0.lock().unwrap().clone();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&FINALIZING_PROGRESS));
        assert!(seen[..seen.len() - 1].iter().all(|p| *p <= STREAMING_PROGRESS_CAP));
    }

    #[tokio::test]
    async fn progress_reported_for_coprime_stride() {
        let a = analyzer(Arc::new(Blind));
        let rec = Recorder::default();
        let mut src = VecSource {
            meta: VideoMeta::new(30.0, 300, 0.0, 2, 2),
            frames: (0..300).step_by(7).collect::<Vec<_>>().into_iter(),
        };
        a.collect(&mut src, &rec).await.unwrap();

        // Frames 0, 35, 70, ... 280: one report per interval crossed.
        let seen = rec.0.lock().unwrap().clone();
        assert_eq!(seen.len(), 9);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn blind_video_is_soft_when_blocking() {
        let a = analyzer(Arc::new(Blind));
        let result = a
            .analyze_source(source(60), ExerciseType::Quadruped, AnalysisMode::Blocking, &NoProgress)
            .await
            .unwrap();
        assert!(result.feedback_points.is_empty());
        assert_eq!(
            result.summary,
            formcheck_core::analysis::INSUFFICIENT_DATA_SUMMARY
        );
        assert_eq!(result.processing_metadata.video_dimensions, Some((2, 2)));
    }

    #[tokio::test]
    async fn blind_video_fails_in_background() {
        let a = analyzer(Arc::new(Blind));
        let err = a
            .analyze_source(source(60), ExerciseType::ToeDrive, AnalysisMode::Background, &NoProgress)
            .await;
        assert_matches!(
            err,
            Err(PipelineError::Core(CoreError::InsufficientData { found: 0, required: 10 }))
        );
    }

    #[tokio::test]
    async fn estimator_outage_is_an_error() {
        let a = analyzer(Arc::new(Down));
        let err = a
            .analyze_source(source(20), ExerciseType::Quadruped, AnalysisMode::Blocking, &NoProgress)
            .await;
        assert_matches!(err, Err(PipelineError::Estimator(_)));
    }

    #[tokio::test]
    async fn empty_video_is_input_error() {
        let a = analyzer(Arc::new(Blind));
        let err = a
            .analyze_source(source(0), ExerciseType::Quadruped, AnalysisMode::Blocking, &NoProgress)
            .await;
        assert_matches!(err, Err(PipelineError::Input(_)));
    }
}
