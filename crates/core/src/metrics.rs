//! Per-frame biomechanical metrics.
//!
//! Every metric is visibility gated: when any landmark it needs is at or
//! below the threshold the metric is `None`, and aggregations leave that
//! frame out of their denominator instead of counting it as zero.

use serde::{Deserialize, Serialize};

use crate::geometry::{calculate_angle, Point};
use crate::landmark::{Pose, PoseLandmark as P};
use crate::thresholds::AnalysisThresholds;

/// Body side selector for paired keypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn ankle(self) -> P {
        match self {
            Side::Left => P::LeftAnkle,
            Side::Right => P::RightAnkle,
        }
    }

    fn knee(self) -> P {
        match self {
            Side::Left => P::LeftKnee,
            Side::Right => P::RightKnee,
        }
    }

    fn foot_index(self) -> P {
        match self {
            Side::Left => P::LeftFootIndex,
            Side::Right => P::RightFootIndex,
        }
    }
}

/// Count of frames meeting a condition out of the frames where it could be
/// evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ratio {
    pub hits: usize,
    pub total: usize,
}

impl Ratio {
    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.hits += 1;
        }
    }

    /// `hits / total`, or `0.0` when nothing was evaluated.
    pub fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

fn xy(pose: &Pose<'_>, which: P, visibility: f64) -> Option<Point> {
    pose.visible(which, visibility).map(|lm| lm.xy())
}

/// Shoulder–hip–knee angle on the left side.
pub fn spine_angle(pose: &Pose<'_>, visibility: f64) -> Option<f64> {
    Some(calculate_angle(
        xy(pose, P::LeftShoulder, visibility)?,
        xy(pose, P::LeftHip, visibility)?,
        xy(pose, P::LeftKnee, visibility)?,
    ))
}

/// Shoulder–ear–nose angle, using whichever ear is more visible.
pub fn neck_angle(pose: &Pose<'_>, visibility: f64) -> Option<f64> {
    let shoulder = xy(pose, P::LeftShoulder, visibility)?;
    let nose = xy(pose, P::Nose, visibility)?;
    let ear = match (
        pose.visible(P::LeftEar, visibility),
        pose.visible(P::RightEar, visibility),
    ) {
        (Some(l), Some(r)) => {
            if l.visibility > r.visibility {
                l
            } else {
                r
            }
        }
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => return None,
    };
    Some(calculate_angle(shoulder, ear.xy(), nose))
}

/// Heel–ankle–toe angle on the left side.
pub fn ankle_angle(pose: &Pose<'_>, visibility: f64) -> Option<f64> {
    Some(calculate_angle(
        xy(pose, P::LeftHeel, visibility)?,
        xy(pose, P::LeftAnkle, visibility)?,
        xy(pose, P::LeftFootIndex, visibility)?,
    ))
}

/// Angle at the foot index between the ankle and a point straight below the
/// foot. Larger means the toes point further down.
pub fn toe_vertical_angle(
    pose: &Pose<'_>,
    side: Side,
    visibility: f64,
    reference_offset: f64,
) -> Option<f64> {
    let ankle = xy(pose, side.ankle(), visibility)?;
    let foot = xy(pose, side.foot_index(), visibility)?;
    Some(calculate_angle(ankle, foot, (foot.0, foot.1 + reference_offset)))
}

/// Mean toe-vertical angle of both feet.
pub fn average_toe_angle(pose: &Pose<'_>, visibility: f64, reference_offset: f64) -> Option<f64> {
    let left = toe_vertical_angle(pose, Side::Left, visibility, reference_offset)?;
    let right = toe_vertical_angle(pose, Side::Right, visibility, reference_offset)?;
    Some((left + right) / 2.0)
}

/// Both ankles within `tolerance` of their knee height.
pub fn feet_flat(pose: &Pose<'_>, visibility: f64, tolerance: f64) -> Option<bool> {
    let mut flat = true;
    for side in [Side::Left, Side::Right] {
        let ankle = pose.visible(side.ankle(), visibility)?;
        let knee = pose.visible(side.knee(), visibility)?;
        flat &= (ankle.y - knee.y).abs() < tolerance;
    }
    Some(flat)
}

/// Either ankle sits higher than its knee by more than `margin`.
pub fn foot_lifted(pose: &Pose<'_>, visibility: f64, margin: f64) -> Option<bool> {
    let mut lifted = false;
    for side in [Side::Left, Side::Right] {
        let ankle = pose.visible(side.ankle(), visibility)?;
        let knee = pose.visible(side.knee(), visibility)?;
        lifted |= ankle.y < knee.y - margin;
    }
    Some(lifted)
}

/// Vertical midpoint of a left/right pair. Not visibility gated: the
/// primary oscillation signal must stay aligned with every frame.
pub fn pair_midpoint_y(pose: &Pose<'_>, left: P, right: P) -> Option<f64> {
    let l = pose.get(left)?;
    let r = pose.get(right)?;
    Some((l.y + r.y) / 2.0)
}

/// Metrics evaluated on every frame of a repetition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMetrics {
    pub spine_angle: Option<f64>,
    pub feet_flat: Option<bool>,
    pub foot_lifted: Option<bool>,
    pub toe_angle: Option<f64>,
}

impl FrameMetrics {
    pub fn extract(pose: &Pose<'_>, t: &AnalysisThresholds) -> Self {
        Self {
            spine_angle: spine_angle(pose, t.visibility),
            feet_flat: feet_flat(pose, t.visibility, t.feet_flat_tolerance),
            foot_lifted: foot_lifted(pose, t.visibility, t.foot_lift_margin),
            toe_angle: average_toe_angle(pose, t.visibility, t.toe_reference_offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, LANDMARK_COUNT};

    fn pose_with(points: &[(P, f64, f64)], visibility: f64) -> Vec<Landmark> {
        let mut set = vec![Landmark::new(0.0, 0.0, 0.0, 0.0); LANDMARK_COUNT];
        for (which, x, y) in points {
            set[which.index()] = Landmark::new(*x, *y, 0.0, visibility);
        }
        set
    }

    #[test]
    fn ratio_zero_denominator() {
        assert_eq!(Ratio::default().value(), 0.0);
        let mut r = Ratio::default();
        r.record(true);
        r.record(false);
        assert_eq!(r.value(), 0.5);
    }

    #[test]
    fn spine_angle_straight_back() {
        let set = pose_with(
            &[
                (P::LeftShoulder, 0.2, 0.5),
                (P::LeftHip, 0.5, 0.5),
                (P::LeftKnee, 0.8, 0.5),
            ],
            0.9,
        );
        let angle = spine_angle(&Pose::new(&set), 0.3).unwrap();
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn gated_metric_is_none() {
        let set = pose_with(
            &[
                (P::LeftShoulder, 0.2, 0.5),
                (P::LeftHip, 0.5, 0.5),
                (P::LeftKnee, 0.8, 0.5),
            ],
            0.3,
        );
        assert!(spine_angle(&Pose::new(&set), 0.3).is_none());
    }

    #[test]
    fn neck_uses_more_visible_ear() {
        let mut set = pose_with(
            &[
                (P::LeftShoulder, 0.0, 1.0),
                (P::Nose, 1.0, 0.0),
                (P::LeftEar, 0.0, 0.0),
            ],
            0.9,
        );
        // Right ear is collinear with shoulder and nose but less visible.
        set[P::RightEar.index()] = Landmark::new(0.5, 0.5, 0.0, 0.4);
        let angle = neck_angle(&Pose::new(&set), 0.3).unwrap();
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn neck_requires_an_ear() {
        let set = pose_with(&[(P::LeftShoulder, 0.0, 1.0), (P::Nose, 1.0, 0.0)], 0.9);
        assert!(neck_angle(&Pose::new(&set), 0.3).is_none());
    }

    #[test]
    fn toe_pointing_down_is_wide_angle() {
        // Ankle directly above the foot index: toe vector points straight up,
        // reference points straight down.
        let set = pose_with(
            &[
                (P::LeftAnkle, 0.3, 0.7),
                (P::LeftFootIndex, 0.3, 0.8),
                (P::RightAnkle, 0.6, 0.7),
                (P::RightFootIndex, 0.6, 0.8),
            ],
            0.9,
        );
        let angle = average_toe_angle(&Pose::new(&set), 0.3, 0.1).unwrap();
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn feet_flat_and_lifted() {
        let flat = pose_with(
            &[
                (P::LeftAnkle, 0.8, 0.70),
                (P::LeftKnee, 0.6, 0.72),
                (P::RightAnkle, 0.8, 0.71),
                (P::RightKnee, 0.6, 0.70),
            ],
            0.9,
        );
        let pose = Pose::new(&flat);
        assert_eq!(feet_flat(&pose, 0.3, 0.05), Some(true));
        assert_eq!(foot_lifted(&pose, 0.3, 0.05), Some(false));

        let lifted = pose_with(
            &[
                (P::LeftAnkle, 0.8, 0.55),
                (P::LeftKnee, 0.6, 0.72),
                (P::RightAnkle, 0.8, 0.71),
                (P::RightKnee, 0.6, 0.70),
            ],
            0.9,
        );
        let pose = Pose::new(&lifted);
        assert_eq!(feet_flat(&pose, 0.3, 0.05), Some(false));
        assert_eq!(foot_lifted(&pose, 0.3, 0.05), Some(true));
    }

    #[test]
    fn midpoint_ignores_visibility() {
        let set = pose_with(&[(P::LeftHip, 0.4, 0.4), (P::RightHip, 0.6, 0.6)], 0.0);
        let y = pair_midpoint_y(&Pose::new(&set), P::LeftHip, P::RightHip).unwrap();
        assert!((y - 0.5).abs() < 1e-12);
    }
}
