//! Form-check domain logic.
//!
//! Pure, I/O-free building blocks for turning pose landmarks into exercise
//! feedback:
//!
//! - [`interpolation`] and [`signal`] clean up the landmark stream and split
//!   it into repetitions.
//! - [`metrics`] and [`geometry`] derive per-frame joint angles and checks.
//! - [`analysis`] composes them into an [`analysis::AnalysisResult`].
//! - [`position`] and [`lighting`] gate a single starting-position frame.
//! - [`job`] is the background analysis state machine.

pub mod analysis;
pub mod error;
pub mod exercise;
pub mod feedback;
pub mod geometry;
pub mod interpolation;
pub mod job;
pub mod landmark;
pub mod lighting;
pub mod metrics;
pub mod position;
pub mod signal;
pub mod threshold_validation;
pub mod thresholds;
pub mod types;

pub use analysis::{analyze, AnalysisResult};
pub use error::CoreError;
pub use exercise::ExerciseType;
pub use landmark::{FrameRecord, Landmark, LandmarkSequence};
