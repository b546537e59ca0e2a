//! Quadruped rocking: hands and knees, rocking the hips back toward the heels.

use crate::exercise::ExerciseType;
use crate::feedback::{FeedbackLine, FeedbackPoint};
use crate::landmark::FrameRecord;
use crate::metrics::foot_lifted;
use crate::thresholds::{FEET_FLATTENING_FLOOR, FEET_FLATTENING_PENALTY};

use super::{mean, repetition_summary, ExerciseReport, RepetitionAssessment, Segments, Verdict};

const FLATTEN_FEET_CUE: &str =
    "Flatten the tops of your feet and ankles against the ground - press them down actively.";

pub(crate) fn assess(s: &Segments<'_>) -> ExerciseReport {
    let t = s.thresholds;
    let mut report = ExerciseReport::default();

    report.feedback.push(FeedbackLine::warning(FLATTEN_FEET_CUE));

    let observed: Vec<&FrameRecord> = s.observed.iter().filter(|f| f.is_valid()).collect();
    let lifted_frames = observed
        .iter()
        .filter_map(|f| f.pose())
        .filter(|p| foot_lifted(p, t.visibility, t.foot_lift_margin) == Some(true))
        .count();
    let lifted = lifted_frames > 0;
    let penalty = i32::try_from(lifted_frames)
        .unwrap_or(i32::MAX)
        .saturating_mul(FEET_FLATTENING_PENALTY);
    report.feet_flattening_score = Some(100i32.saturating_sub(penalty).max(FEET_FLATTENING_FLOOR));
    report.foot_lift_detected = Some(lifted);

    if lifted {
        report.feedback.push(FeedbackLine::failure(
            "Feet lifted from ground during movement. Keep the tops of your feet flat against the floor.",
        ));
        let mid = observed.get(observed.len() / 2).map_or(0.0, |f| f.timestamp);
        report
            .feedback_points
            .push(FeedbackPoint::new(mid, "Keep feet flat on ground"));
    }

    for (i, cycle) in s.cycles.iter().enumerate() {
        let number = i + 1;
        let metrics = s.cycle_metrics(*cycle);

        let spine: Vec<f64> = metrics.iter().filter_map(|m| m.spine_angle).collect();
        let spine_range = spine
            .iter()
            .copied()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .map(|(lo, hi)| hi - lo);

        let flat: Vec<bool> = metrics.iter().filter_map(|m| m.feet_flat).collect();
        let feet_flat_percent = (!flat.is_empty())
            .then(|| flat.iter().filter(|f| **f).count() as f64 / flat.len() as f64 * 100.0);

        let mut assessment = RepetitionAssessment {
            number,
            start_time: s.time_at(cycle.start),
            end_time: s.time_at(cycle.end),
            spine_range,
            feet_flat_percent,
            avg_toe_angle: mean(metrics.iter().filter_map(|m| m.toe_angle)),
            verdict: Verdict::Good,
        };
        let mid = assessment.mid_time();

        let feet_not_flat = feet_flat_percent.is_some_and(|p| p < t.feet_flat_min_percent);
        if feet_not_flat {
            report.feedback.push(FeedbackLine::failure(format!(
                "During repetition {number}, feet were not consistently flat against the floor."
            )));
            report.feedback_points.push(FeedbackPoint::new(mid, "Keep feet flat"));
        }

        let unstable = match spine_range {
            Some(range) if range > t.spine_range_max_deg => {
                report.feedback.push(FeedbackLine::warning(format!(
                    "Repetition {number}: Try to maintain a more consistent spine angle throughout the movement."
                )));
                report.feedback_points.push(FeedbackPoint::new(mid, "Keep spine stable"));
                true
            }
            Some(_) => {
                report.feedback.push(FeedbackLine::positive(format!(
                    "Repetition {number}: Good spine stability during this repetition."
                )));
                report
                    .feedback_points
                    .push(FeedbackPoint::new(mid, "Good spine stability"));
                false
            }
            None => false,
        };

        assessment.verdict = if unstable {
            Verdict::SpineInstability
        } else if feet_not_flat {
            Verdict::FeetNotFlat
        } else if spine_range.is_none() && feet_flat_percent.is_none() {
            Verdict::Unassessed
        } else {
            Verdict::Good
        };
        report.assessments.push(assessment);
    }

    if s.cycles.is_empty() {
        report.feedback.push(FeedbackLine::info(
            "Unable to detect clear rocking movements. Try to rock forward and backward more distinctly.",
        ));
        report.summary =
            "No clear exercise repetitions detected. Try to make your movements more distinct."
                .to_string();
    } else {
        let stable = report
            .assessments
            .iter()
            .all(|a| a.verdict != Verdict::SpineInstability);
        report.summary = format!(
            "{}Spine stability: {}.",
            repetition_summary(ExerciseType::Quadruped, s),
            if stable { "good" } else { "inconsistent" }
        );
    }

    report
}
