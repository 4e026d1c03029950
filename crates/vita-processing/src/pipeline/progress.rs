//! Progress reporting for the preparation pipeline.
//!
//! A page load is one synchronous read-clean-derive pass; there is no
//! cancellation, only stage progress for callers that render a loading
//! state.

use serde::{Deserialize, Serialize};

/// Stages of the preparation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepStage {
    /// Reading the source file
    Loading,
    /// Normalizing headers, coercing types, imputing
    Cleaning,
    /// Resolving semantic roles to headers
    ResolvingColumns,
    /// Normalizing indicators and computing composite indices
    DerivingIndices,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PrepStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Table",
            Self::Cleaning => "Cleaning Table",
            Self::ResolvingColumns => "Resolving Columns",
            Self::DerivingIndices => "Deriving Indices",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Typical weight of this stage in the overall pipeline (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.30,
            Self::Cleaning => 0.40,
            Self::ResolvingColumns => 0.05,
            Self::DerivingIndices => 0.25,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.30,
            Self::ResolvingColumns => 0.70,
            Self::DerivingIndices => 0.75,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress update with overall and stage-local completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PrepStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PrepStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PrepStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PrepStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Progress reporter wrapping a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
