//! In-memory tracking of background video analyses.

mod store;
mod task;

pub use store::{JobProgress, JobStore};
pub use task::spawn_analysis;
