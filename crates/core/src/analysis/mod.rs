//! Exercise analysis: turns a landmark sequence into structured feedback.
//!
//! The shared pipeline is interpolate, derive the primary oscillation
//! signal, smooth, detect cycles, then hand the per-frame metrics and
//! cycles to the exercise-specific analyzer. Whole-sequence diagnostics
//! and the score floors are applied here for every exercise.

pub mod diagnostics;
mod quadruped;
mod toe_drive;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::exercise::ExerciseType;
use crate::feedback::{
    ensure_positive, format_total_time, percent, FeedbackLine, FeedbackPoint, Scores, Tone,
};
use crate::interpolation::interpolate_missing;
use crate::landmark::{FrameRecord, Landmark, LandmarkSequence, PoseLandmark as P};
use crate::metrics::{pair_midpoint_y, FrameMetrics};
use crate::signal::{adaptive_window, detect_cycles, moving_average, Cycle};
use crate::thresholds::AnalysisThresholds;

pub use diagnostics::Diagnostics;

pub const INSUFFICIENT_DATA_FEEDBACK: &str =
    "Not enough pose data detected. Please try recording with better lighting or a clearer camera angle.";
pub const INSUFFICIENT_DATA_SUMMARY: &str =
    "Unable to analyze exercise due to insufficient pose data.";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Classification of a single repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Good,
    SpineInstability,
    FeetNotFlat,
    InsufficientToeDrive,
    /// Every frame of the repetition was gated out for the deciding metric.
    Unassessed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionAssessment {
    /// 1-based repetition number.
    pub number: usize,
    pub start_time: f64,
    pub end_time: f64,
    /// Max minus min spine angle over the repetition, in degrees.
    pub spine_range: Option<f64>,
    pub feet_flat_percent: Option<f64>,
    pub avg_toe_angle: Option<f64>,
    pub verdict: Verdict,
}

impl RepetitionAssessment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn mid_time(&self) -> f64 {
        self.start_time + self.duration() / 2.0
    }
}

/// Frame accounting and timing attached to every result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Frames handed to the pose estimator.
    pub sampled_frames: usize,
    /// Sampled frames where a body was detected.
    pub valid_frames: usize,
    /// Frames filled in by interpolation.
    pub interpolated_frames: usize,
    pub smoothing_window: usize,
    /// Wall-clock analysis time; filled in by the caller that timed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub exercise: ExerciseType,
    pub feedback: Vec<FeedbackLine>,
    pub feedback_points: Vec<FeedbackPoint>,
    pub summary: String,
    pub repetitions: usize,
    pub form_quality: u32,
    pub positive_feedback_percent: u32,
    /// Source video length as `MM:SS`.
    pub total_time: String,
    pub fps: f64,
    pub assessments: Vec<RepetitionAssessment>,
    pub diagnostics: Option<Diagnostics>,
    /// Quadruped only: 100 minus a penalty per frame with a lifted foot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feet_flattening_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foot_lift_detected: Option<bool>,
    /// Interpolated landmark sets, one per sampled frame, for overlays.
    pub landmarks: Vec<Vec<Landmark>>,
    pub processing_metadata: ProcessingMetadata,
}

impl AnalysisResult {
    /// Soft result returned when too few frames carried a pose.
    pub fn insufficient_data(
        seq: &LandmarkSequence,
        exercise: ExerciseType,
        t: &AnalysisThresholds,
    ) -> Self {
        let mut feedback = vec![FeedbackLine::warning(INSUFFICIENT_DATA_FEEDBACK)];
        let invisible = diagnostics::invisible_parts_in(&seq.frames, t);
        if let Some(line) = diagnostics::visibility_line(&invisible) {
            feedback.push(line);
        }

        let valid = seq.valid_frame_count();
        let scores = Scores::floored(0, percent(valid, seq.len()), 0);

        Self {
            exercise,
            feedback,
            feedback_points: Vec::new(),
            summary: INSUFFICIENT_DATA_SUMMARY.to_string(),
            repetitions: scores.repetitions,
            form_quality: scores.form_quality,
            positive_feedback_percent: scores.positive_feedback_percent,
            total_time: format_total_time(seq.duration()),
            fps: seq.fps,
            assessments: Vec::new(),
            diagnostics: None,
            feet_flattening_score: None,
            foot_lift_detected: None,
            landmarks: Vec::new(),
            processing_metadata: ProcessingMetadata {
                sampled_frames: seq.len(),
                valid_frames: valid,
                ..ProcessingMetadata::default()
            },
        }
    }

    /// Plain-text feedback lines with their tone markers.
    pub fn rendered_feedback(&self) -> Vec<String> {
        self.feedback.iter().map(FeedbackLine::render).collect()
    }
}

// ---------------------------------------------------------------------------
// Shared analyzer plumbing
// ---------------------------------------------------------------------------

/// Inputs shared by the exercise analyzers.
pub(crate) struct Segments<'a> {
    /// Interpolated frames.
    pub frames: &'a [FrameRecord],
    /// Frames exactly as observed, gaps included.
    pub observed: &'a [FrameRecord],
    pub metrics: &'a [FrameMetrics],
    pub cycles: &'a [Cycle],
    pub thresholds: &'a AnalysisThresholds,
}

impl Segments<'_> {
    pub fn time_at(&self, index: usize) -> f64 {
        self.frames.get(index).map_or(0.0, |f| f.timestamp)
    }

    /// Metrics for frames `start..=end` of a cycle.
    pub fn cycle_metrics(&self, cycle: Cycle) -> &[FrameMetrics] {
        let end = (cycle.end + 1).min(self.metrics.len());
        self.metrics.get(cycle.start..end).unwrap_or_default()
    }

    pub fn average_cycle_duration(&self) -> f64 {
        if self.cycles.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .cycles
            .iter()
            .map(|c| self.time_at(c.end) - self.time_at(c.start))
            .sum();
        total / self.cycles.len() as f64
    }
}

/// What an exercise analyzer contributes to the final result.
#[derive(Debug, Default)]
pub(crate) struct ExerciseReport {
    pub feedback: Vec<FeedbackLine>,
    pub feedback_points: Vec<FeedbackPoint>,
    pub assessments: Vec<RepetitionAssessment>,
    pub summary: String,
    pub feet_flattening_score: Option<i32>,
    pub foot_lift_detected: Option<bool>,
}

/// Opening of every repetition summary.
pub(crate) fn repetition_summary(exercise: ExerciseType, segments: &Segments<'_>) -> String {
    format!(
        "Completed {} repetitions of {}. Average repetition duration: {:.1} seconds. ",
        segments.cycles.len(),
        exercise.display_name(),
        segments.average_cycle_duration()
    )
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Oscillation signal the cycle detector runs on.
///
/// Frames without the needed keypoints repeat the previous value (or the
/// first available one at the start) so the signal stays aligned 1:1 with
/// the frames.
fn primary_signal(frames: &[FrameRecord], exercise: ExerciseType) -> Vec<f64> {
    let (left, right) = match exercise {
        ExerciseType::Quadruped => (P::LeftHip, P::RightHip),
        ExerciseType::ToeDrive => (P::LeftAnkle, P::RightAnkle),
    };
    let raw: Vec<Option<f64>> = frames
        .iter()
        .map(|f| f.pose().and_then(|p| pair_midpoint_y(&p, left, right)))
        .collect();

    let first = raw.iter().flatten().copied().next().unwrap_or(0.0);
    let mut last = first;
    raw.into_iter()
        .map(|v| {
            if let Some(v) = v {
                last = v;
            }
            last
        })
        .collect()
}

/// Run the full analysis for one exercise.
///
/// Fails with [`CoreError::InsufficientData`] when fewer than
/// `min_valid_frames` frames carry a pose; callers decide whether that is a
/// soft result or an error.
pub fn analyze(
    seq: &LandmarkSequence,
    exercise: ExerciseType,
    t: &AnalysisThresholds,
    min_valid_frames: usize,
) -> Result<AnalysisResult, CoreError> {
    let valid = seq.valid_frame_count();
    let required = min_valid_frames.max(1);
    if valid < required {
        return Err(CoreError::InsufficientData {
            found: valid,
            required,
        });
    }

    let filled = interpolate_missing(seq);
    let signal = primary_signal(&filled.frames, exercise);
    let window = adaptive_window(signal.len());
    let smoothed = moving_average(&signal, window);
    let cycles = detect_cycles(&smoothed);

    let metrics: Vec<FrameMetrics> = filled
        .frames
        .iter()
        .map(|f| {
            f.pose()
                .map(|p| FrameMetrics::extract(&p, t))
                .unwrap_or_default()
        })
        .collect();

    let segments = Segments {
        frames: &filled.frames,
        observed: &seq.frames,
        metrics: &metrics,
        cycles: &cycles,
        thresholds: t,
    };
    let report = match exercise {
        ExerciseType::Quadruped => quadruped::assess(&segments),
        ExerciseType::ToeDrive => toe_drive::assess(&segments),
    };

    let diag = diagnostics::compute(&seq.frames, exercise, seq.len(), t);
    let checks = diagnostics::feedback_lines(&diag, t);
    let (positive, cues) = cue_score(&checks, diagnostics::cue_count(&diag));

    let mut feedback = report.feedback;
    feedback.extend(checks);
    if let Some(line) = diagnostics::visibility_line(&diag.invisible_parts) {
        feedback.push(line);
    }
    ensure_positive(&mut feedback);

    let scores = Scores::floored(
        cycles.len(),
        percent(valid, seq.len()),
        percent(positive, cues),
    );

    Ok(AnalysisResult {
        exercise,
        feedback,
        feedback_points: report.feedback_points,
        summary: report.summary,
        repetitions: scores.repetitions,
        form_quality: scores.form_quality,
        positive_feedback_percent: scores.positive_feedback_percent,
        total_time: format_total_time(seq.duration()),
        fps: seq.fps,
        assessments: report.assessments,
        diagnostics: Some(diag),
        feet_flattening_score: report.feet_flattening_score,
        foot_lift_detected: report.foot_lift_detected,
        landmarks: filled
            .frames
            .into_iter()
            .map(|f| f.landmarks.unwrap_or_default())
            .collect(),
        processing_metadata: ProcessingMetadata {
            sampled_frames: seq.len(),
            valid_frames: valid,
            interpolated_frames: seq.len() - valid,
            smoothing_window: window,
            ..ProcessingMetadata::default()
        },
    })
}

/// Positive and total cues over the global checks. When none passed, the
/// encouragement line scores as one extra positive cue.
fn cue_score(checks: &[FeedbackLine], cues: usize) -> (usize, usize) {
    match checks.iter().filter(|l| l.tone == Tone::Positive).count() {
        0 => (1, cues + 1),
        positive => (positive, cues),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::landmark::{Landmark, LandmarkSequence, PoseLandmark as P, LANDMARK_COUNT};

    /// A clean quadruped pose whose hips and ankles sit at `phase_y`.
    pub fn rocking_pose(phase_y: f64) -> Vec<Landmark> {
        let mut set = vec![Landmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT];
        let mut put = |which: P, x: f64, y: f64| set[which.index()] = Landmark::new(x, y, 0.0, 0.9);
        put(P::Nose, 0.1, 0.4);
        put(P::LeftEar, 0.2, 0.5);
        put(P::LeftShoulder, 0.3, 0.6);
        put(P::RightShoulder, 0.3, 0.6);
        put(P::LeftWrist, 0.3, 0.9);
        put(P::RightWrist, 0.3, 0.9);
        put(P::LeftHip, 0.6, phase_y);
        put(P::RightHip, 0.6, phase_y);
        put(P::LeftKnee, 0.9, phase_y);
        put(P::RightKnee, 0.9, phase_y);
        put(P::LeftAnkle, 1.0, phase_y);
        put(P::RightAnkle, 1.0, phase_y);
        put(P::LeftHeel, 0.95, phase_y);
        put(P::RightHeel, 0.95, phase_y);
        put(P::LeftFootIndex, 1.05, phase_y);
        put(P::RightFootIndex, 1.05, phase_y);
        set
    }

    /// `frames` frames of a sinusoidal rock with `periods` full periods.
    pub fn rocking_sequence(frames: u64, periods: f64) -> LandmarkSequence {
        let mut seq = LandmarkSequence::new(30.0);
        for i in 0..frames {
            let phase = i as f64 / frames as f64 * periods * std::f64::consts::TAU;
            seq.push(i * 2, Some(rocking_pose(0.6 + 0.05 * phase.sin())));
        }
        seq
    }
}
