//! Pipeline orchestration.
//!
//! A run moves through `Idle -> Preparing -> Downloading -> Verifying ->
//! Composing -> Done`, exiting to `Failed` from any state. The downloader
//! tolerates partial failure; this layer requires the full `n²` tiles before
//! anything is composited.

mod context;
mod error;
mod orchestrator;
mod state;

pub use context::{prune_failed_runs, sweep_abandoned_runs, RunContext};
pub use error::PipelineError;
pub use orchestrator::MosaicPipeline;
pub use state::{FailureReason, PipelineReport, PipelineState, StateCallback};
