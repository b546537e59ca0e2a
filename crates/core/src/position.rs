//! Single-frame starting position gate.
//!
//! Each criterion is an independent boolean gated on the visibility of the
//! landmarks it needs; an ungated criterion stays `false` (or passes, for
//! the advisory feet-flattened check). Only some criteria decide overall
//! correctness, and the feedback names the first failing criterion in a
//! fixed order.

use serde::{Deserialize, Serialize};

use crate::exercise::ExerciseType;
use crate::feedback::FeedbackLine;
use crate::geometry::midpoint;
use crate::landmark::{Landmark, Pose, PoseLandmark as P};
use crate::lighting::LightingQuality;
use crate::thresholds::PositionThresholds;

/// Average visibility per body region, left and right combined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyVisibility {
    pub shoulders: f64,
    pub wrists: f64,
    pub hips: f64,
    pub knees: f64,
    pub ankles: f64,
}

impl BodyVisibility {
    fn of(pose: &Pose<'_>) -> Self {
        Self {
            shoulders: pose.pair_visibility(P::LeftShoulder, P::RightShoulder),
            wrists: pose.pair_visibility(P::LeftWrist, P::RightWrist),
            hips: pose.pair_visibility(P::LeftHip, P::RightHip),
            knees: pose.pair_visibility(P::LeftKnee, P::RightKnee),
            ankles: pose.pair_visibility(P::LeftAnkle, P::RightAnkle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDetails {
    pub hands_under_shoulders: bool,
    pub knees_under_hips: bool,
    pub back_alignment: bool,
    /// Hip-width feet for quadruped, pointed toes for toe drive.
    pub feet_position_correct: bool,
    /// Quadruped only; `None` when the ankles or knees were not visible.
    pub feet_flattened: Option<bool>,
    /// Toe drive only; starts `true` and is cleared by a visible flat foot.
    pub toe_position: bool,
    pub visibility: BodyVisibility,
    pub lighting_quality: LightingQuality,
}

impl PositionDetails {
    fn empty(exercise: ExerciseType, lighting_quality: LightingQuality) -> Self {
        Self {
            hands_under_shoulders: false,
            knees_under_hips: false,
            back_alignment: false,
            feet_position_correct: false,
            feet_flattened: None,
            toe_position: exercise == ExerciseType::ToeDrive,
            visibility: BodyVisibility::default(),
            lighting_quality,
        }
    }

    fn feet_flattened_or_pass(&self) -> bool {
        self.feet_flattened.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionCheckResult {
    pub is_position_correct: bool,
    pub feedback: String,
    pub position_details: PositionDetails,
}

impl PositionCheckResult {
    fn rejected(feedback: FeedbackLine, position_details: PositionDetails) -> Self {
        Self {
            is_position_correct: false,
            feedback: feedback.render(),
            position_details,
        }
    }
}

/// Both left/right pairs are horizontally stacked within `tolerance`.
fn stacked(pose: &Pose<'_>, upper: [P; 2], lower: [P; 2], t: &PositionThresholds) -> bool {
    if !pose.all_visible(&[upper[0], upper[1], lower[0], lower[1]], t.visibility) {
        return false;
    }
    upper.iter().zip(lower.iter()).all(|(u, l)| {
        match (pose.get(*u), pose.get(*l)) {
            (Some(u), Some(l)) => (u.x - l.x).abs() < t.alignment_tolerance,
            _ => false,
        }
    })
}

fn pair<'a>(pose: &Pose<'a>, left: P, right: P) -> Option<(&'a Landmark, &'a Landmark)> {
    Some((pose.get(left)?, pose.get(right)?))
}

fn back_alignment(pose: &Pose<'_>, t: &PositionThresholds) -> bool {
    let needed = [P::LeftShoulder, P::RightShoulder, P::LeftHip, P::RightHip];
    if !pose.all_visible(&needed, t.visibility) {
        return false;
    }
    match (
        pair(pose, P::LeftShoulder, P::RightShoulder),
        pair(pose, P::LeftHip, P::RightHip),
    ) {
        (Some((ls, rs)), Some((lh, rh))) => {
            let shoulders = midpoint(ls.xy(), rs.xy());
            let hips = midpoint(lh.xy(), rh.xy());
            (shoulders.1 - hips.1).abs() < t.back_alignment_tolerance
        }
        _ => false,
    }
}

/// Quadruped feet: (hip-width apart, tops of the feet flattened).
fn quadruped_feet(pose: &Pose<'_>, t: &PositionThresholds) -> (bool, Option<bool>) {
    let Some((la, ra)) = pair(pose, P::LeftAnkle, P::RightAnkle)
        .filter(|_| pose.all_visible(&[P::LeftAnkle, P::RightAnkle], t.visibility))
    else {
        return (false, None);
    };

    let width = pair(pose, P::LeftHip, P::RightHip).is_some_and(|(lh, rh)| {
        let ankle_sep = (la.x - ra.x).abs();
        let hip_sep = (lh.x - rh.x).abs();
        (ankle_sep - hip_sep).abs() < t.feet_width_tolerance
    });

    let flattened = pose
        .all_visible(&[P::LeftKnee, P::RightKnee], t.visibility)
        .then(|| {
            pair(pose, P::LeftKnee, P::RightKnee).is_some_and(|(lk, rk)| {
                (la.y - lk.y).abs() < t.feet_flat_tolerance
                    && (ra.y - rk.y).abs() < t.feet_flat_tolerance
            })
        });

    (width, flattened)
}

/// Toe drive: both foot indices below their heels. `None` when not visible.
fn toes_pointed(pose: &Pose<'_>, t: &PositionThresholds) -> Option<bool> {
    let needed = [P::LeftFootIndex, P::LeftHeel, P::RightFootIndex, P::RightHeel];
    if !pose.all_visible(&needed, t.visibility) {
        return None;
    }
    let (lf, rf) = pair(pose, P::LeftFootIndex, P::RightFootIndex)?;
    let (lh, rh) = pair(pose, P::LeftHeel, P::RightHeel)?;
    Some(lf.y > lh.y && rf.y > rh.y)
}

/// Check one frame against the exercise's starting position.
///
/// `landmarks` is `None` when the estimator found no body.
pub fn check_position(
    landmarks: Option<&[Landmark]>,
    lighting: LightingQuality,
    exercise: ExerciseType,
    t: &PositionThresholds,
) -> PositionCheckResult {
    let mut details = PositionDetails::empty(exercise, lighting);

    let Some(pose) = landmarks.filter(|l| !l.is_empty()).map(Pose::new) else {
        let feedback = if lighting == LightingQuality::Poor {
            FeedbackLine::warning(
                "Lighting is too dark. Move to a brighter area or turn on more lights.",
            )
        } else {
            FeedbackLine::warning("Pose not detected. Please ensure your full body is visible.")
        };
        return PositionCheckResult::rejected(feedback, details);
    };

    if lighting == LightingQuality::Poor {
        return PositionCheckResult::rejected(
            FeedbackLine::warning(
                "Lighting is too dark. Move to a brighter area for better tracking.",
            ),
            details,
        );
    }

    details.visibility = BodyVisibility::of(&pose);
    details.hands_under_shoulders = stacked(
        &pose,
        [P::LeftShoulder, P::RightShoulder],
        [P::LeftWrist, P::RightWrist],
        t,
    );
    details.knees_under_hips = stacked(
        &pose,
        [P::LeftHip, P::RightHip],
        [P::LeftKnee, P::RightKnee],
        t,
    );
    details.back_alignment = back_alignment(&pose, t);

    match exercise {
        ExerciseType::Quadruped => {
            let (width, flattened) = quadruped_feet(&pose, t);
            details.feet_position_correct = width;
            details.feet_flattened = flattened;
        }
        ExerciseType::ToeDrive => {
            if let Some(pointed) = toes_pointed(&pose, t) {
                details.toe_position = pointed;
                details.feet_position_correct = pointed;
            }
        }
    }

    let is_position_correct = match exercise {
        ExerciseType::Quadruped => {
            details.hands_under_shoulders
                && details.knees_under_hips
                && details.feet_flattened_or_pass()
        }
        ExerciseType::ToeDrive => details.knees_under_hips && details.hands_under_shoulders,
    };

    let feedback = if is_position_correct {
        FeedbackLine::positive("Great starting position! You're ready to begin.")
    } else {
        FeedbackLine::warning(first_correction(&details, exercise))
    };

    PositionCheckResult {
        is_position_correct,
        feedback: feedback.render(),
        position_details: details,
    }
}

fn first_correction(d: &PositionDetails, exercise: ExerciseType) -> &'static str {
    if !d.hands_under_shoulders {
        "Position your hands directly under your shoulders."
    } else if !d.knees_under_hips {
        "Position your knees directly under your hips."
    } else if !d.feet_flattened_or_pass() {
        "Flatten the tops of your feet and ankles against the ground - press them down actively."
    } else if !d.back_alignment {
        "Keep your back flat and parallel to the floor."
    } else if !d.feet_position_correct {
        match exercise {
            ExerciseType::ToeDrive => "Point your toes downward for proper toe drive position.",
            ExerciseType::Quadruped => "Position your feet hip-width apart.",
        }
    } else {
        "Adjust your position to match the guide shown."
    }
}
