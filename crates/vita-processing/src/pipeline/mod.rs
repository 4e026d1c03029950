//! Pipeline orchestration: load, clean, resolve, derive.

mod builder;
mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, PrepStage, ProgressReporter, ProgressUpdate};
