//! Toe drive: quadruped rocking with the toes tucked and pressed into the floor.

use crate::exercise::ExerciseType;
use crate::feedback::{FeedbackLine, FeedbackPoint};

use super::{mean, repetition_summary, ExerciseReport, RepetitionAssessment, Segments, Verdict};

pub(crate) fn assess(s: &Segments<'_>) -> ExerciseReport {
    let t = s.thresholds;
    let mut report = ExerciseReport::default();
    let mut all_angles = Vec::new();

    for (i, cycle) in s.cycles.iter().enumerate() {
        let number = i + 1;
        let metrics = s.cycle_metrics(*cycle);
        let angles: Vec<f64> = metrics.iter().filter_map(|m| m.toe_angle).collect();
        let avg_toe_angle = mean(angles.iter().copied());
        all_angles.extend(angles);

        let flat: Vec<bool> = metrics.iter().filter_map(|m| m.feet_flat).collect();
        let mut assessment = RepetitionAssessment {
            number,
            start_time: s.time_at(cycle.start),
            end_time: s.time_at(cycle.end),
            spine_range: None,
            feet_flat_percent: (!flat.is_empty())
                .then(|| flat.iter().filter(|f| **f).count() as f64 / flat.len() as f64 * 100.0),
            avg_toe_angle,
            verdict: Verdict::Good,
        };
        let mid = assessment.mid_time();

        assessment.verdict = match avg_toe_angle {
            Some(angle) if angle < t.toe_angle_min_deg => {
                report.feedback.push(FeedbackLine::warning(format!(
                    "Repetition {number}: Remember to point your toes more during toe drive."
                )));
                report.feedback_points.push(FeedbackPoint::new(mid, "Point toes more"));
                Verdict::InsufficientToeDrive
            }
            Some(_) => {
                report.feedback.push(FeedbackLine::positive(format!(
                    "Repetition {number}: Good toe pointing during this repetition."
                )));
                report
                    .feedback_points
                    .push(FeedbackPoint::new(mid, "Good toe position"));
                Verdict::Good
            }
            None => {
                report.feedback.push(FeedbackLine::info(format!(
                    "Repetition {number}: Feet weren't visible enough to assess toe pointing."
                )));
                Verdict::Unassessed
            }
        };
        report.assessments.push(assessment);
    }

    if s.cycles.is_empty() {
        report.feedback.push(FeedbackLine::info(
            "Unable to detect clear toe drive movements. Try to rock forward and backward more distinctly with toes pointed.",
        ));
        report.summary = "No clear exercise repetitions detected. Try to make your movements more distinct with toes pointed."
            .to_string();
    } else {
        let overall = mean(all_angles.into_iter()).unwrap_or(0.0);
        report.summary = format!(
            "{}Toe pointing: {}.",
            repetition_summary(ExerciseType::ToeDrive, s),
            if overall >= t.toe_angle_min_deg {
                "good"
            } else {
                "needs improvement"
            }
        );
    }

    report
}
