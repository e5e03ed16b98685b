//! Pipeline module.
//!
//! This module provides the analysis pipeline and its progress reporting.

mod builder;
mod executor;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use executor::{AnalysisExecutor, EXPLORATION_LIMIT};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
