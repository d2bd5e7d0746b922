//! Pipeline orchestrator: gate, prepare, download, verify, compose.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::context::RunContext;
use super::error::PipelineError;
use super::state::{PipelineReport, PipelineState, StateCallback};
use crate::compositor::{CompositeImage, Compositor};
use crate::downloader::BatchDownloader;
use crate::fetcher::TileFetcher;
use crate::gate::{DomainGate, GateError};
use crate::grid::{compute_tile_coordinates, GridRequest, ValidationError};
use crate::metrics::{PIPELINE_DURATION, PIPELINE_RUNS};

/// Drives one grid request through the full pipeline.
///
/// The pipeline holds no per-run state; everything a run touches lives in
/// its [`RunContext`], so one instance can serve concurrent runs.
pub struct MosaicPipeline {
    gate: Arc<dyn DomainGate>,
    downloader: BatchDownloader,
    compositor: Arc<dyn Compositor>,
    on_state: Option<StateCallback>,
}

struct Composed {
    composite: CompositeImage,
    tiles_downloaded: usize,
    tiles_failed: usize,
}

impl MosaicPipeline {
    pub fn new(
        gate: Arc<dyn DomainGate>,
        fetcher: Arc<dyn TileFetcher>,
        compositor: Arc<dyn Compositor>,
        scheme: impl Into<String>,
    ) -> Self {
        Self {
            gate,
            downloader: BatchDownloader::new(fetcher, scheme),
            compositor,
            on_state: None,
        }
    }

    /// Registers an observer for state transitions.
    pub fn with_state_callback(mut self, callback: StateCallback) -> Self {
        self.on_state = Some(callback);
        self
    }

    /// Runs `request` inside `context`, cancellable through the context's token.
    ///
    /// On success the composite is at `context.output_path()`. On failure the
    /// workspace is left as is for inspection.
    pub async fn run(
        &self,
        request: &GridRequest,
        context: &RunContext,
    ) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        self.transition(context, PipelineState::Idle);
        info!(
            run_id = %context.run_id(),
            domain = %request.domain,
            layer = %request.layer,
            x = request.center.x,
            y = request.center.y,
            n = request.grid_size.get(),
            "Pipeline run started"
        );

        let result = self.execute(request, context).await;
        let elapsed = started.elapsed();

        match result {
            Ok(composed) => {
                self.transition(context, PipelineState::Done);
                PIPELINE_RUNS.with_label_values(&["done"]).inc();
                PIPELINE_DURATION
                    .with_label_values(&["done"])
                    .observe(elapsed.as_secs_f64());
                info!(
                    run_id = %context.run_id(),
                    width = composed.composite.width,
                    height = composed.composite.height,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Pipeline run finished"
                );
                Ok(PipelineReport {
                    run_id: context.run_id(),
                    composite: composed.composite,
                    tiles_downloaded: composed.tiles_downloaded,
                    tiles_failed: composed.tiles_failed,
                    elapsed,
                })
            }
            Err(err) => {
                let reason = err.failure_reason();
                PIPELINE_RUNS.with_label_values(&[reason.label()]).inc();
                PIPELINE_DURATION
                    .with_label_values(&[reason.label()])
                    .observe(elapsed.as_secs_f64());
                error!(
                    run_id = %context.run_id(),
                    reason = reason.label(),
                    error = %err,
                    "Pipeline run failed"
                );
                self.transition(context, PipelineState::Failed { reason });
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        request: &GridRequest,
        context: &RunContext,
    ) -> Result<Composed, PipelineError> {
        self.check_gate(&request.domain).await?;

        self.transition(context, PipelineState::Preparing);
        let workspace = context.workspace();
        context
            .prepare()
            .await
            .map_err(|source| PipelineError::Workspace {
                path: workspace.clone(),
                source,
            })?;

        self.transition(context, PipelineState::Downloading);
        let coordinates = compute_tile_coordinates(request.center, request.grid_size);
        let batch = self
            .downloader
            .download_all(
                &coordinates,
                &request.domain,
                &request.layer,
                &workspace,
                context.cancel_token(),
            )
            .await?;

        self.transition(context, PipelineState::Verifying);
        let expected = request.grid_size.tile_count();
        if batch.success_count() != expected {
            return Err(PipelineError::InsufficientTiles {
                expected,
                actual: batch.success_count(),
            });
        }
        if context.cancel_token().is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.transition(context, PipelineState::Composing);
        let tiles_downloaded = batch.success_count();
        let tiles_failed = batch.failure_count();
        let composite = self
            .compositor
            .compose(batch.tiles, request.grid_size, &context.output_path())
            .await?;

        Ok(Composed {
            composite,
            tiles_downloaded,
            tiles_failed,
        })
    }

    async fn check_gate(&self, domain: &str) -> Result<(), PipelineError> {
        match self.gate.check(domain).await {
            Ok(()) => {
                debug!(domain, gate = self.gate.method_name(), "Domain accepted");
                Ok(())
            }
            Err(GateError::Denied(_)) => {
                Err(ValidationError::DomainRejected(domain.to_string()).into())
            }
            Err(e) => Err(PipelineError::Gate(e)),
        }
    }

    fn transition(&self, context: &RunContext, state: PipelineState) {
        debug!(run_id = %context.run_id(), state = state.name(), "Pipeline state changed");
        if let Some(callback) = &self.on_state {
            callback(&state);
        }
    }
}
