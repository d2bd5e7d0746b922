//! Error types for the pipeline.

use std::path::PathBuf;
use thiserror::Error;

use super::state::FailureReason;
use crate::compositor::CompositorError;
use crate::downloader::BatchError;
use crate::gate::GateError;
use crate::grid::ValidationError;

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request rejected before any side effect.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The access gate failed to decide.
    #[error("Access gate error: {0}")]
    Gate(#[source] GateError),

    /// The run workspace could not be prepared.
    #[error("Failed to prepare workspace {path}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Downloads settled short of the full grid.
    #[error("Downloaded {actual} of {expected} tiles")]
    InsufficientTiles { expected: usize, actual: usize },

    #[error(transparent)]
    Compositor(#[from] CompositorError),

    /// The run was cancelled between phases.
    #[error("Pipeline run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Self::Validation(ValidationError::DomainRejected(_)) => FailureReason::DomainRejected,
            Self::Validation(e) => FailureReason::Validation {
                message: e.to_string(),
            },
            Self::Gate(e) => FailureReason::GateUnavailable {
                message: e.to_string(),
            },
            Self::Workspace { .. } => FailureReason::Workspace {
                message: self.to_string(),
            },
            Self::Batch(BatchError::AllFailed { attempted }) => FailureReason::AllFailed {
                attempted: *attempted,
            },
            Self::Batch(BatchError::Cancelled) | Self::Cancelled => FailureReason::Cancelled,
            Self::InsufficientTiles { expected, actual } => FailureReason::InsufficientTiles {
                expected: *expected,
                actual: *actual,
            },
            Self::Compositor(e) => FailureReason::Compositor {
                message: e.to_string(),
            },
        }
    }
}
