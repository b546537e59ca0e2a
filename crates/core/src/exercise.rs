//! Supported rehabilitation exercises.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    /// Rocking forward and back on hands and knees.
    #[default]
    Quadruped,
    /// Quadruped rocking with toes tucked and driven into the floor.
    #[serde(alias = "toeDrive")]
    ToeDrive,
}

impl ExerciseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::Quadruped => "quadruped",
            ExerciseType::ToeDrive => "toe_drive",
        }
    }

    /// Human-readable name used in summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseType::Quadruped => "quadruped rocking",
            ExerciseType::ToeDrive => "toe drive",
        }
    }

    /// Parse a form value, falling back to [`ExerciseType::Quadruped`] for
    /// anything unrecognised.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for ExerciseType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "quadruped" => Ok(ExerciseType::Quadruped),
            "toe_drive" | "toeDrive" | "toe-drive" => Ok(ExerciseType::ToeDrive),
            other => Err(CoreError::Validation(format!(
                "Unknown exercise type: '{other}'. Valid types: quadruped, toe_drive"
            ))),
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
