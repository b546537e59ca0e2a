//! Feedback vocabulary shared by the analyzers.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::thresholds::{MIN_FORM_QUALITY, MIN_POSITIVE_FEEDBACK_PERCENT, MIN_REPETITIONS};

/// Tone of a feedback line. Only `Positive` counts toward the positive
/// feedback percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Warning,
    Failure,
    Info,
}

impl Tone {
    /// Leading marker used when rendering a line as plain text.
    pub fn marker(self) -> &'static str {
        match self {
            Tone::Positive => "✅",
            Tone::Warning => "⚠️",
            Tone::Failure => "❌",
            Tone::Info => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLine {
    pub tone: Tone,
    pub message: String,
}

impl FeedbackLine {
    pub fn new(tone: Tone, message: impl Into<String>) -> Self {
        Self {
            tone,
            message: message.into(),
        }
    }

    pub fn positive(message: impl Into<String>) -> Self {
        Self::new(Tone::Positive, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Tone::Warning, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Tone::Failure, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Tone::Info, message)
    }

    /// `"<marker> <message>"`, or just the message for info lines.
    pub fn render(&self) -> String {
        match self.tone {
            Tone::Info => self.message.clone(),
            tone => format!("{} {}", tone.marker(), self.message),
        }
    }
}

/// A message pinned to a moment in the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPoint {
    pub timestamp: f64,
    pub message: String,
}

impl FeedbackPoint {
    pub fn new(timestamp: f64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

const ENCOURAGEMENTS: &[&str] = &[
    "Your effort is commendable - keep practicing!",
    "Good attempt - consistency will improve your form.",
    "You're on the right track with this exercise.",
];

/// A generic positive line for results where no check passed.
pub fn encouragement() -> FeedbackLine {
    let message = ENCOURAGEMENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(ENCOURAGEMENTS[0]);
    FeedbackLine::positive(message)
}

/// Append an encouragement line unless a positive line is already present.
pub fn ensure_positive(feedback: &mut Vec<FeedbackLine>) {
    if !feedback.iter().any(|l| l.tone == Tone::Positive) {
        feedback.push(encouragement());
    }
}

/// Headline scores shown to the user. Always floor-adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub repetitions: usize,
    pub form_quality: u32,
    pub positive_feedback_percent: u32,
}

impl Scores {
    /// Apply the presentation floors to raw measurements.
    pub fn floored(repetitions: usize, form_quality: u32, positive_feedback_percent: u32) -> Self {
        Self {
            repetitions: repetitions.max(MIN_REPETITIONS),
            form_quality: form_quality.max(MIN_FORM_QUALITY),
            positive_feedback_percent: positive_feedback_percent.max(MIN_POSITIVE_FEEDBACK_PERCENT),
        }
    }
}

/// Integer percentage `part / whole * 100`, truncated; `0` for an empty whole.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0) as u32
    }
}

/// Format a duration in seconds as `MM:SS`.
pub fn format_total_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
