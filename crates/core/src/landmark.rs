//! Pose landmark model.
//!
//! Landmarks follow the 33-point canonical body ordering used by the pose
//! estimator. Coordinates are normalised to the frame (roughly `[0, 1]`,
//! y grows downwards) and carry a visibility confidence in `[0, 1]`.

use serde::{Deserialize, Serialize};

/// Number of keypoints in a complete landmark set.
pub const LANDMARK_COUNT: usize = 33;

/// A single keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// The (x, y) projection used by all planar angle metrics.
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Linear blend toward `other`; `weight = 0` returns `self`.
    pub fn lerp(&self, other: &Landmark, weight: f64) -> Landmark {
        let keep = 1.0 - weight;
        Landmark {
            x: self.x * keep + other.x * weight,
            y: self.y * keep + other.y * weight,
            z: self.z * keep + other.z * weight,
            visibility: self.visibility * keep + other.visibility * weight,
        }
    }
}

/// Canonical keypoint positions within a landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Borrowed view over one frame's landmark set with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct Pose<'a> {
    landmarks: &'a [Landmark],
}

impl<'a> Pose<'a> {
    pub fn new(landmarks: &'a [Landmark]) -> Self {
        Self { landmarks }
    }

    /// Look up a keypoint. `None` if the set is truncated.
    pub fn get(&self, which: PoseLandmark) -> Option<&'a Landmark> {
        self.landmarks.get(which.index())
    }

    /// Keypoint whose visibility strictly exceeds `threshold`.
    pub fn visible(&self, which: PoseLandmark, threshold: f64) -> Option<&'a Landmark> {
        self.get(which).filter(|lm| lm.visibility > threshold)
    }

    /// True when every listed keypoint is present and above `threshold`.
    pub fn all_visible(&self, which: &[PoseLandmark], threshold: f64) -> bool {
        which.iter().all(|w| self.visible(*w, threshold).is_some())
    }

    /// Mean visibility of a left/right pair; missing points count as 0.
    pub fn pair_visibility(&self, left: PoseLandmark, right: PoseLandmark) -> f64 {
        let l = self.get(left).map_or(0.0, |lm| lm.visibility);
        let r = self.get(right).map_or(0.0, |lm| lm.visibility);
        (l + r) / 2.0
    }
}

/// One sampled video frame and its detected landmarks, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Source frame index within the video.
    pub index: u64,
    /// Seconds from the start of the video (`index / fps`).
    pub timestamp: f64,
    /// `None` when the estimator found no body in this frame.
    pub landmarks: Option<Vec<Landmark>>,
}

impl FrameRecord {
    pub fn new(index: u64, fps: f64, landmarks: Option<Vec<Landmark>>) -> Self {
        let timestamp = if fps > 0.0 { index as f64 / fps } else { 0.0 };
        Self {
            index,
            timestamp,
            landmarks,
        }
    }

    /// A frame with a non-empty landmark set.
    pub fn is_valid(&self) -> bool {
        self.landmarks.as_ref().is_some_and(|l| !l.is_empty())
    }

    pub fn pose(&self) -> Option<Pose<'_>> {
        self.landmarks
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(Pose::new)
    }
}

/// All sampled frames of one video, ordered by frame index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSequence {
    pub fps: f64,
    /// Length of the source video; `0.0` when unknown.
    #[serde(default)]
    pub duration_secs: f64,
    pub frames: Vec<FrameRecord>,
}

impl LandmarkSequence {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            duration_secs: 0.0,
            frames: Vec::new(),
        }
    }

    /// Source duration, falling back to the last sampled timestamp.
    pub fn duration(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            self.frames.last().map_or(0.0, |f| f.timestamp)
        }
    }

    /// Append a frame. Frames whose index does not advance are dropped.
    pub fn push(&mut self, index: u64, landmarks: Option<Vec<Landmark>>) -> bool {
        if self.frames.last().is_some_and(|f| f.index >= index) {
            return false;
        }
        self.frames.push(FrameRecord::new(index, self.fps, landmarks));
        true
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn valid_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_valid()).count()
    }
}
