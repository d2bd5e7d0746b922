//! Pipeline state machine types.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::compositor::CompositeImage;

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// Request parameters were invalid.
    Validation { message: String },
    /// The access gate refused the domain.
    DomainRejected,
    /// The access gate could not make a decision.
    GateUnavailable { message: String },
    /// Preparing the scratch workspace failed.
    Workspace { message: String },
    /// Not a single tile was downloaded.
    AllFailed { attempted: usize },
    /// Some tiles were downloaded, but not the full grid.
    InsufficientTiles { expected: usize, actual: usize },
    /// Decoding, placing or encoding failed.
    Compositor { message: String },
    /// The run was cancelled by its caller.
    Cancelled,
}

impl FailureReason {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::DomainRejected => "domain_rejected",
            Self::GateUnavailable { .. } => "gate_unavailable",
            Self::Workspace { .. } => "workspace",
            Self::AllFailed { .. } => "all_failed",
            Self::InsufficientTiles { .. } => "insufficient_tiles",
            Self::Compositor { .. } => "compositor",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Lifecycle of one pipeline run.
///
/// `Idle -> Preparing -> Downloading -> Verifying -> Composing -> Done`, with
/// an exit to `Failed` from any state. Observers see `Idle` first, as soon as
/// a run is entered and before the domain gate is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Preparing,
    Downloading,
    Verifying,
    Composing,
    Done,
    Failed { reason: FailureReason },
}

impl PipelineState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Composing => "composing",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Observer invoked on every state transition.
pub type StateCallback = Arc<dyn Fn(&PipelineState) + Send + Sync>;

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub composite: CompositeImage,
    pub tiles_downloaded: usize,
    pub tiles_failed: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Done.is_terminal());
        assert!(PipelineState::Failed {
            reason: FailureReason::Cancelled
        }
        .is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
        assert!(!PipelineState::Composing.is_terminal());
    }

    #[test]
    fn test_failed_state_serialization() {
        let state = PipelineState::Failed {
            reason: FailureReason::InsufficientTiles {
                expected: 25,
                actual: 23,
            },
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"]["type"], "insufficient_tiles");
        assert_eq!(json["reason"]["actual"], 23);
    }
}
