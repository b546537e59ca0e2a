//! Empirically tuned thresholds for movement analysis and the position gate.
//!
//! Every magic number used by the analyzers lives here under a name. The
//! `Default` impls reproduce the tuned values exactly.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::{validate_angle_degrees, validate_unit_range};

// ---------------------------------------------------------------------------
// Temporal analysis
// ---------------------------------------------------------------------------

/// Landmarks at or below this visibility are ignored during video analysis.
pub const DEFAULT_TEMPORAL_VISIBILITY: f64 = 0.3;
/// Max |ankle.y - knee.y| for a foot to count as flat.
pub const DEFAULT_FEET_FLAT_TOLERANCE: f64 = 0.05;
/// Ankle higher than the knee by more than this counts as a lifted foot.
pub const DEFAULT_FOOT_LIFT_MARGIN: f64 = 0.05;
/// Spine angle range within one repetition above which it is unstable.
pub const DEFAULT_SPINE_RANGE_MAX_DEG: f64 = 20.0;
/// Minimum share of frames (percent) with flat feet in a repetition.
pub const DEFAULT_FEET_FLAT_MIN_PERCENT: f64 = 80.0;
/// Average toe-to-vertical angle below which toe drive is insufficient.
pub const DEFAULT_TOE_ANGLE_MIN_DEG: f64 = 60.0;
/// Offset of the synthetic point directly below the foot index.
pub const DEFAULT_TOE_REFERENCE_OFFSET: f64 = 0.1;
/// Neck angle below which the head counts as dropped.
pub const DEFAULT_NECK_ANGLE_MIN_DEG: f64 = 140.0;
/// Heel-ankle-toe angle below which the ankle counts as collapsed.
pub const DEFAULT_ANKLE_COLLAPSE_DEG: f64 = 65.0;
/// Ankle depth deviation from baseline that counts as a foot lift.
pub const DEFAULT_FOOT_LIFT_Z_DEVIATION: f64 = 0.15;
/// Number of early visible frames averaged into the foot baselines.
pub const DEFAULT_BASELINE_FRAMES: usize = 3;
/// Foot index drop below baseline that counts as an active toe drive.
pub const DEFAULT_TOE_DRIVE_Y_OFFSET: f64 = 0.015;

/// Foot-lift frames above this fraction fail the stability check.
pub const DEFAULT_FOOT_LIFT_RATIO_MAX: f64 = 0.25;
/// Head-drop frames above this fraction fail the head check.
pub const DEFAULT_HEAD_DROP_RATIO_MAX: f64 = 0.30;
/// Ankle-collapse frames above this fraction fail the ankle check.
pub const DEFAULT_ANKLE_COLLAPSE_RATIO_MAX: f64 = 0.25;
/// Toe-drive frames below this fraction fail the toe-drive check.
pub const DEFAULT_TOE_DRIVE_RATIO_MIN: f64 = 0.08;
/// A body part invisible in more than this share of frames gets a warning.
pub const DEFAULT_INVISIBLE_FRACTION: f64 = 0.5;

/// Feet-flattening score penalty per frame with a lifted foot.
pub const FEET_FLATTENING_PENALTY: i32 = 5;
/// Lowest feet-flattening score reported.
pub const FEET_FLATTENING_FLOOR: i32 = 40;

// ---------------------------------------------------------------------------
// Score floors
// ---------------------------------------------------------------------------

pub const MIN_FORM_QUALITY: u32 = 60;
pub const MIN_POSITIVE_FEEDBACK_PERCENT: u32 = 25;
pub const MIN_REPETITIONS: usize = 1;

/// Valid frames required by the blocking analyze endpoint.
pub const SYNC_MIN_VALID_FRAMES: usize = 5;
/// Valid frames required by a background analysis job.
pub const JOB_MIN_VALID_FRAMES: usize = 10;

// ---------------------------------------------------------------------------
// Static position check
// ---------------------------------------------------------------------------

/// Landmarks at or below this visibility are ignored by the position gate.
pub const DEFAULT_STATIC_VISIBILITY: f64 = 0.5;
/// Max horizontal offset between stacked joints (wrist/shoulder, knee/hip).
pub const DEFAULT_ALIGNMENT_TOLERANCE: f64 = 0.1;
/// Max vertical offset between shoulder and hip midlines.
pub const DEFAULT_BACK_ALIGNMENT_TOLERANCE: f64 = 0.1;
/// Max difference between ankle and hip separation.
pub const DEFAULT_FEET_WIDTH_TOLERANCE: f64 = 0.1;

/// Mean gray level below which lighting is poor.
pub const DEFAULT_DARK_BRIGHTNESS: f64 = 50.0;
/// Mean gray level below which lighting is medium.
pub const DEFAULT_DIM_BRIGHTNESS: f64 = 100.0;
/// Gray-level standard deviation below which lighting is medium.
pub const DEFAULT_LOW_CONTRAST: f64 = 30.0;

/// Thresholds for video (temporal) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    pub visibility: f64,
    pub feet_flat_tolerance: f64,
    pub foot_lift_margin: f64,
    pub spine_range_max_deg: f64,
    pub feet_flat_min_percent: f64,
    pub toe_angle_min_deg: f64,
    pub toe_reference_offset: f64,
    pub neck_angle_min_deg: f64,
    pub ankle_collapse_deg: f64,
    pub foot_lift_z_deviation: f64,
    pub baseline_frames: usize,
    pub toe_drive_y_offset: f64,
    pub foot_lift_ratio_max: f64,
    pub head_drop_ratio_max: f64,
    pub ankle_collapse_ratio_max: f64,
    pub toe_drive_ratio_min: f64,
    pub invisible_fraction: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            visibility: DEFAULT_TEMPORAL_VISIBILITY,
            feet_flat_tolerance: DEFAULT_FEET_FLAT_TOLERANCE,
            foot_lift_margin: DEFAULT_FOOT_LIFT_MARGIN,
            spine_range_max_deg: DEFAULT_SPINE_RANGE_MAX_DEG,
            feet_flat_min_percent: DEFAULT_FEET_FLAT_MIN_PERCENT,
            toe_angle_min_deg: DEFAULT_TOE_ANGLE_MIN_DEG,
            toe_reference_offset: DEFAULT_TOE_REFERENCE_OFFSET,
            neck_angle_min_deg: DEFAULT_NECK_ANGLE_MIN_DEG,
            ankle_collapse_deg: DEFAULT_ANKLE_COLLAPSE_DEG,
            foot_lift_z_deviation: DEFAULT_FOOT_LIFT_Z_DEVIATION,
            baseline_frames: DEFAULT_BASELINE_FRAMES,
            toe_drive_y_offset: DEFAULT_TOE_DRIVE_Y_OFFSET,
            foot_lift_ratio_max: DEFAULT_FOOT_LIFT_RATIO_MAX,
            head_drop_ratio_max: DEFAULT_HEAD_DROP_RATIO_MAX,
            ankle_collapse_ratio_max: DEFAULT_ANKLE_COLLAPSE_RATIO_MAX,
            toe_drive_ratio_min: DEFAULT_TOE_DRIVE_RATIO_MIN,
            invisible_fraction: DEFAULT_INVISIBLE_FRACTION,
        }
    }
}

impl AnalysisThresholds {
    /// Reject overrides that would make the analysis meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_range(self.visibility, "visibility")?;
        validate_unit_range(self.foot_lift_ratio_max, "foot_lift_ratio_max")?;
        validate_unit_range(self.head_drop_ratio_max, "head_drop_ratio_max")?;
        validate_unit_range(self.ankle_collapse_ratio_max, "ankle_collapse_ratio_max")?;
        validate_unit_range(self.toe_drive_ratio_min, "toe_drive_ratio_min")?;
        validate_unit_range(self.invisible_fraction, "invisible_fraction")?;
        validate_angle_degrees(self.spine_range_max_deg, "spine_range_max_deg")?;
        validate_angle_degrees(self.toe_angle_min_deg, "toe_angle_min_deg")?;
        validate_angle_degrees(self.neck_angle_min_deg, "neck_angle_min_deg")?;
        validate_angle_degrees(self.ankle_collapse_deg, "ankle_collapse_deg")?;
        if !(0.0..=100.0).contains(&self.feet_flat_min_percent) {
            return Err(CoreError::Validation(format!(
                "feet_flat_min_percent must be between 0 and 100, got {}",
                self.feet_flat_min_percent
            )));
        }
        if self.baseline_frames == 0 {
            return Err(CoreError::Validation(
                "baseline_frames must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Thresholds for the single-frame position gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionThresholds {
    pub visibility: f64,
    pub alignment_tolerance: f64,
    pub back_alignment_tolerance: f64,
    pub feet_width_tolerance: f64,
    pub feet_flat_tolerance: f64,
    pub dark_brightness: f64,
    pub dim_brightness: f64,
    pub low_contrast: f64,
}

impl Default for PositionThresholds {
    fn default() -> Self {
        Self {
            visibility: DEFAULT_STATIC_VISIBILITY,
            alignment_tolerance: DEFAULT_ALIGNMENT_TOLERANCE,
            back_alignment_tolerance: DEFAULT_BACK_ALIGNMENT_TOLERANCE,
            feet_width_tolerance: DEFAULT_FEET_WIDTH_TOLERANCE,
            feet_flat_tolerance: DEFAULT_FEET_FLAT_TOLERANCE,
            dark_brightness: DEFAULT_DARK_BRIGHTNESS,
            dim_brightness: DEFAULT_DIM_BRIGHTNESS,
            low_contrast: DEFAULT_LOW_CONTRAST,
        }
    }
}

impl PositionThresholds {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_range(self.visibility, "visibility")?;
        if self.dark_brightness > self.dim_brightness {
            return Err(CoreError::Validation(format!(
                "dark_brightness ({}) must be <= dim_brightness ({})",
                self.dark_brightness, self.dim_brightness
            )));
        }
        Ok(())
    }
}
