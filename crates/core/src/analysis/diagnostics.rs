//! Whole-sequence form diagnostics.
//!
//! These run over the frames where the estimator actually saw a body
//! (interpolated frames are synthetic and would dilute the ratios).

use serde::{Deserialize, Serialize};

use crate::exercise::ExerciseType;
use crate::feedback::FeedbackLine;
use crate::landmark::{FrameRecord, Pose, PoseLandmark as P};
use crate::metrics::{ankle_angle, neck_angle, Ratio};
use crate::thresholds::AnalysisThresholds;

/// Body parts tracked for "not clearly visible" guidance.
const TRACKED_PARTS: &[(&str, P)] = &[
    ("left shoulder", P::LeftShoulder),
    ("right shoulder", P::RightShoulder),
    ("left wrist", P::LeftWrist),
    ("right wrist", P::RightWrist),
    ("left hip", P::LeftHip),
    ("right hip", P::RightHip),
    ("left knee", P::LeftKnee),
    ("right knee", P::RightKnee),
    ("left ankle", P::LeftAnkle),
    ("right ankle", P::RightAnkle),
    ("head", P::Nose),
];

/// Tracked parts rendered individually before switching to a generic message.
const MAX_NAMED_PARTS: usize = 3;

/// Ratios and flags computed over the observed frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub foot_lift: Ratio,
    pub head_drop: Ratio,
    pub ankle_collapse: Ratio,
    /// Only evaluated for toe drive.
    pub toe_drive: Option<Ratio>,
    /// Body parts invisible in more than the configured share of frames.
    pub invisible_parts: Vec<String>,
}

impl Diagnostics {
    fn part_invisible(&self, name: &str) -> bool {
        self.invisible_parts.iter().any(|p| p == name)
    }
}

/// Compute the global diagnostics.
///
/// `sampled_frames` is the number of frames handed to the estimator, which
/// is the denominator for visibility issues.
pub fn compute(
    frames: &[FrameRecord],
    exercise: ExerciseType,
    sampled_frames: usize,
    t: &AnalysisThresholds,
) -> Diagnostics {
    let poses: Vec<Pose<'_>> = frames.iter().filter_map(FrameRecord::pose).collect();
    let vis = t.visibility;

    let invisible_parts = invisible_parts(&poses, sampled_frames, t);

    let mut head_drop = Ratio::default();
    let mut ankle_collapse = Ratio::default();
    for pose in &poses {
        if let Some(angle) = neck_angle(pose, vis) {
            head_drop.record(angle < t.neck_angle_min_deg);
        }
        if let Some(angle) = ankle_angle(pose, vis) {
            ankle_collapse.record(angle < t.ankle_collapse_deg);
        }
    }

    // Foot baselines come from the first frames with a visible left ankle;
    // those frames are not evaluated themselves.
    let mut baseline_z = Vec::with_capacity(t.baseline_frames);
    let mut baseline_foot_y = Vec::with_capacity(t.baseline_frames);
    let mut evaluated = Vec::new();
    for pose in &poses {
        let Some(ankle) = pose.visible(P::LeftAnkle, vis) else {
            continue;
        };
        if baseline_z.len() < t.baseline_frames {
            baseline_z.push(ankle.z);
            if let Some(foot) = pose.get(P::LeftFootIndex) {
                baseline_foot_y.push(foot.y);
            }
        } else {
            evaluated.push((pose, ankle.z));
        }
    }

    let mut foot_lift = Ratio::default();
    if let Some(base_z) = mean(&baseline_z) {
        for (_, z) in &evaluated {
            foot_lift.record((z - base_z).abs() > t.foot_lift_z_deviation);
        }
    }

    let toe_drive = (exercise == ExerciseType::ToeDrive).then(|| {
        let mut ratio = Ratio::default();
        if let Some(base_y) = mean(&baseline_foot_y) {
            for (pose, _) in &evaluated {
                if let Some(foot) = pose.visible(P::LeftFootIndex, vis) {
                    ratio.record(foot.y > base_y + t.toe_drive_y_offset);
                }
            }
        }
        ratio
    });

    Diagnostics {
        foot_lift,
        head_drop,
        ankle_collapse,
        toe_drive,
        invisible_parts,
    }
}

fn invisible_parts(poses: &[Pose<'_>], sampled_frames: usize, t: &AnalysisThresholds) -> Vec<String> {
    let limit = sampled_frames as f64 * t.invisible_fraction;
    TRACKED_PARTS
        .iter()
        .filter(|(_, which)| {
            let misses = poses
                .iter()
                .filter(|p| p.visible(*which, t.visibility).is_none())
                .count();
            misses as f64 > limit
        })
        .map(|(name, _)| (*name).to_string())
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Global checks scored for the positive-feedback percentage: foot, head
/// and ankle, plus toe drive when it was evaluated.
///
/// A check counts even when it produced no line.
pub fn cue_count(d: &Diagnostics) -> usize {
    3 + usize::from(d.toe_drive.is_some())
}

/// Pass/fail lines for the global checks, in display order.
pub fn feedback_lines(d: &Diagnostics, t: &AnalysisThresholds) -> Vec<FeedbackLine> {
    let mut lines = Vec::with_capacity(4);

    // The lift ratio is judged whenever a baseline produced evaluated
    // frames; visibility only matters when it could not be.
    if d.foot_lift.total > 0 {
        lines.push(if d.foot_lift.value() > t.foot_lift_ratio_max {
            FeedbackLine::failure("Feet lifted during exercise - try to stay grounded.")
        } else {
            FeedbackLine::positive("Good foot stability throughout movement.")
        });
    } else if d.part_invisible("left ankle") || d.part_invisible("right ankle") {
        lines.push(FeedbackLine::warning(
            "Feet weren't fully visible - try to keep them in frame for better analysis.",
        ));
    }

    lines.push(if d.part_invisible("head") {
        FeedbackLine::warning("Your head wasn't consistently visible in the frame.")
    } else if d.head_drop.value() > t.head_drop_ratio_max {
        FeedbackLine::failure("Head dropped - try to keep your gaze forward.")
    } else {
        FeedbackLine::positive("Excellent head and neck alignment maintained.")
    });

    lines.push(
        if d.part_invisible("left ankle") && d.part_invisible("right ankle") {
            FeedbackLine::warning(
                "Ankles weren't clearly visible - try to ensure they're in frame.",
            )
        } else if d.ankle_collapse.value() > t.ankle_collapse_ratio_max {
            FeedbackLine::failure("Ankle collapse detected - maintain firm ankle position.")
        } else {
            FeedbackLine::positive("Great ankle stability throughout the exercise.")
        },
    );

    if let Some(toe) = &d.toe_drive {
        lines.push(if d.part_invisible("left ankle") {
            FeedbackLine::warning("Feet weren't clearly visible to assess toe drive technique.")
        } else if toe.value() < t.toe_drive_ratio_min {
            FeedbackLine::failure(
                "More toe drive needed - press toes into the ground during movement.",
            )
        } else {
            FeedbackLine::positive("Excellent toe drive technique.")
        });
    }

    lines
}

/// Guidance naming the body parts that were hard to see, if any.
pub fn visibility_line(invisible_parts: &[String]) -> Option<FeedbackLine> {
    match invisible_parts.len() {
        0 => None,
        n if n <= MAX_NAMED_PARTS => {
            let verb = if n > 1 { "were" } else { "was" };
            Some(FeedbackLine::warning(format!(
                "Your {} {verb} not clearly visible. Adjust camera or position.",
                invisible_parts.join(", ")
            )))
        }
        _ => Some(FeedbackLine::warning(
            "Multiple body parts weren't visible. Try repositioning the camera for a clearer view.",
        )),
    }
}

/// Visibility issues over any set of frames, for the insufficient-data path.
pub fn invisible_parts_in(frames: &[FrameRecord], t: &AnalysisThresholds) -> Vec<String> {
    let poses: Vec<Pose<'_>> = frames.iter().filter_map(FrameRecord::pose).collect();
    invisible_parts(&poses, frames.len(), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Tone;
    use crate::landmark::{Landmark, LANDMARK_COUNT};

    fn frame(index: u64, edit: impl Fn(&mut Vec<Landmark>)) -> FrameRecord {
        let mut set = vec![Landmark::new(0.5, 0.5, 0.0, 0.9); LANDMARK_COUNT];
        edit(&mut set);
        FrameRecord::new(index, 30.0, Some(set))
    }

    /// Upright head (straight neck) and an open ankle.
    fn good_pose(set: &mut Vec<Landmark>) {
        set[P::LeftShoulder.index()] = Landmark::new(0.3, 0.6, 0.0, 0.9);
        set[P::LeftEar.index()] = Landmark::new(0.2, 0.5, 0.0, 0.9);
        set[P::RightEar.index()] = Landmark::new(0.2, 0.5, 0.0, 0.5);
        set[P::Nose.index()] = Landmark::new(0.1, 0.4, 0.0, 0.9);
        set[P::LeftHeel.index()] = Landmark::new(0.6, 0.7, 0.0, 0.9);
        set[P::LeftAnkle.index()] = Landmark::new(0.7, 0.7, 0.0, 0.9);
        set[P::LeftFootIndex.index()] = Landmark::new(0.8, 0.7, 0.0, 0.9);
    }

    #[test]
    fn clean_sequence_passes_every_check() {
        let frames: Vec<_> = (0..10).map(|i| frame(i, good_pose)).collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::Quadruped, frames.len(), &t);

        assert!(d.invisible_parts.is_empty());
        assert_eq!(d.head_drop.hits, 0);
        assert_eq!(d.ankle_collapse.hits, 0);
        assert_eq!(d.foot_lift.total, 7);
        assert!(d.toe_drive.is_none());

        let lines = feedback_lines(&d, &t);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.tone == Tone::Positive));
    }

    #[test]
    fn head_drop_fails_above_ratio() {
        let frames: Vec<_> = (0..10)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    // Nose folded back toward the shoulder: sharp neck angle.
                    set[P::Nose.index()] = Landmark::new(0.3, 0.55, 0.0, 0.9);
                })
            })
            .collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::Quadruped, frames.len(), &t);
        assert_eq!(d.head_drop.hits, 10);

        let lines = feedback_lines(&d, &t);
        assert_eq!(lines[1].tone, Tone::Failure);
    }

    #[test]
    fn foot_lift_from_depth_baseline() {
        let frames: Vec<_> = (0..10)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    if i >= 5 {
                        set[P::LeftAnkle.index()].z = 0.4;
                    }
                })
            })
            .collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::Quadruped, frames.len(), &t);
        assert_eq!(d.foot_lift, Ratio { hits: 5, total: 7 });
        assert_eq!(feedback_lines(&d, &t)[0].tone, Tone::Failure);
    }

    #[test]
    fn gated_frames_leave_denominator() {
        let frames: Vec<_> = (0..4)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    if i % 2 == 0 {
                        set[P::LeftHeel.index()].visibility = 0.1;
                    }
                })
            })
            .collect();
        let d = compute(&frames, ExerciseType::Quadruped, 4, &AnalysisThresholds::default());
        assert_eq!(d.ankle_collapse.total, 2);
    }

    #[test]
    fn hidden_head_warns() {
        let frames: Vec<_> = (0..6)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    set[P::Nose.index()].visibility = 0.0;
                })
            })
            .collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::Quadruped, 6, &t);
        assert_eq!(d.invisible_parts, vec!["head".to_string()]);
        assert_eq!(feedback_lines(&d, &t)[1].tone, Tone::Warning);
    }

    #[test]
    fn toe_drive_ratio_only_for_toe_drive() {
        let frames: Vec<_> = (0..10)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    if i >= 3 {
                        set[P::LeftFootIndex.index()].y = 0.75;
                    }
                })
            })
            .collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::ToeDrive, 10, &t);
        assert_eq!(d.toe_drive, Some(Ratio { hits: 7, total: 7 }));
        let lines = feedback_lines(&d, &t);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3].tone, Tone::Positive);
    }

    #[test]
    fn foot_stability_judged_with_one_ankle_hidden() {
        let frames: Vec<_> = (0..10)
            .map(|i| {
                frame(i, |set| {
                    good_pose(set);
                    set[P::RightAnkle.index()].visibility = 0.0;
                })
            })
            .collect();
        let t = AnalysisThresholds::default();
        let d = compute(&frames, ExerciseType::Quadruped, 10, &t);
        assert!(d.invisible_parts.contains(&"right ankle".to_string()));
        assert_eq!(d.foot_lift.total, 7);

        let lines = feedback_lines(&d, &t);
        assert_eq!(lines[0].tone, Tone::Positive);
        assert!(lines[0].message.contains("foot stability"));
    }

    #[test]
    fn foot_check_without_baseline() {
        let t = AnalysisThresholds::default();
        let visible = Diagnostics::default();
        assert!(feedback_lines(&visible, &t)
            .iter()
            .all(|l| !l.message.contains("Feet")));
        assert_eq!(cue_count(&visible), 3);

        let hidden = Diagnostics {
            invisible_parts: vec!["left ankle".into()],
            toe_drive: Some(Ratio::default()),
            ..Diagnostics::default()
        };
        let lines = feedback_lines(&hidden, &t);
        assert_eq!(lines[0].tone, Tone::Warning);
        assert!(lines[0].message.starts_with("Feet weren't fully visible"));
        assert_eq!(cue_count(&hidden), 4);
    }

    #[test]
    fn visibility_line_wording() {
        assert!(visibility_line(&[]).is_none());
        let one = visibility_line(&["head".into()]).unwrap();
        assert!(one.message.contains("head was not"));
        let two = visibility_line(&["left knee".into(), "right knee".into()]).unwrap();
        assert!(two.message.contains("left knee, right knee were not"));
        let many: Vec<String> = (0..4).map(|i| format!("part {i}")).collect();
        assert!(visibility_line(&many).unwrap().message.starts_with("Multiple"));
    }
}
