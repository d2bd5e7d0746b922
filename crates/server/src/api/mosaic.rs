//! Composite image API handler.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dynmap_core::{
    config::{RequestDefaults, WorkspaceConfig},
    prune_failed_runs, BatchError, Center, FailureReason, GridRequest, PipelineError, RunContext,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for a composite image
#[derive(Debug, Default, Deserialize)]
pub struct MosaicParams {
    /// Tile server host (required)
    pub domain: Option<String>,
    /// Tile type selector
    pub mtype: Option<String>,
    /// Centre x in world coordinates
    pub x: Option<i64>,
    /// Centre y in world coordinates
    pub y: Option<i64>,
    /// Tiles per side (odd, 1-9)
    pub n: Option<i64>,
}

impl MosaicParams {
    /// Fills omitted parameters from `defaults` and validates the result.
    pub fn into_request(self, defaults: &RequestDefaults) -> Result<GridRequest, ValidationError> {
        GridRequest::new(
            self.domain.unwrap_or_default(),
            self.mtype.unwrap_or_else(|| defaults.layer.clone()),
            Center::new(
                self.x.unwrap_or(defaults.center_x),
                self.y.unwrap_or(defaults.center_y),
            ),
            self.n.unwrap_or(defaults.grid_size),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MosaicErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<MosaicErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(MosaicErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// HTTP status for a failed pipeline run.
fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Validation(ValidationError::DomainRejected(_)) => StatusCode::FORBIDDEN,
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::Batch(BatchError::AllFailed { .. })
        | PipelineError::InsufficientTiles { .. } => StatusCode::BAD_GATEWAY,
        // Only reachable when the server itself is shutting the run down.
        PipelineError::Batch(BatchError::Cancelled) | PipelineError::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PipelineError::Gate(_) | PipelineError::Workspace { .. } | PipelineError::Compositor(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/mosaic, GET /api/dynmap2img
///
/// Downloads the tile grid around (`x`, `y`) from `domain` and returns it as
/// one JPEG.
pub async fn get_mosaic(
    State(state): State<Arc<AppState>>,
    params: Result<Query<MosaicParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let config = state.config();

    let request = params
        .into_request(&config.defaults)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let context = RunContext::new(&config.workspace.root);
    // Dropping the handler future (client gone) cancels every outstanding fetch.
    let _cancel_on_drop = context.cancel_token().clone().drop_guard();

    // The run owns its directory until it finishes, even if this handler is
    // dropped first, so cleanup never races a compose still writing output.
    let bytes = tokio::spawn(execute_run(state.clone(), request, context))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Pipeline task failed: {}", e),
            )
        })??;

    let cache_control = format!("public, max-age={}", config.output.cache_max_age_secs);
    let cache_control = HeaderValue::from_str(&cache_control)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CACHE_CONTROL, cache_control),
        ],
        bytes,
    )
        .into_response())
}

/// Runs the pipeline and settles the run directory: removed after success
/// or cancellation, otherwise retained and pruned per the workspace config.
async fn execute_run(
    state: Arc<AppState>,
    request: GridRequest,
    context: RunContext,
) -> Result<Vec<u8>, ApiError> {
    let workspace = &state.config().workspace;

    let report = match state.pipeline().run(&request, &context).await {
        Ok(report) => report,
        Err(err) => {
            let cancelled = matches!(err.failure_reason(), FailureReason::Cancelled);
            if workspace.retain_failed && !cancelled {
                retain_failed_run(&context, &err, workspace).await;
            } else {
                remove_run_dir(&context).await;
            }
            return Err(api_error(status_for(&err), &err));
        }
    };

    let bytes = tokio::fs::read(&report.composite.path).await;
    remove_run_dir(&context).await;
    let bytes = bytes.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read composite image: {}", e),
        )
    })?;

    debug!(
        run_id = %report.run_id,
        bytes = bytes.len(),
        "Serving composite image"
    );
    Ok(bytes)
}

async fn retain_failed_run(
    context: &RunContext,
    err: &PipelineError,
    workspace: &WorkspaceConfig,
) {
    match context.mark_failed(&err.to_string()).await {
        Ok(()) => {}
        // Rejected before a directory was created; nothing to keep.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(
                run_id = %context.run_id(),
                error = %e,
                "Failed to mark run directory; removing it"
            );
            remove_run_dir(context).await;
            return;
        }
    }

    let keep = workspace.max_retained_failures;
    match prune_failed_runs(&workspace.root, keep).await {
        Ok(0) => {}
        Ok(removed) => debug!(removed, keep, "Pruned retained failed runs"),
        Err(e) => warn!(error = %e, "Failed to prune retained failed runs"),
    }
}

async fn remove_run_dir(context: &RunContext) {
    if let Err(e) = context.cleanup().await {
        warn!(
            run_id = %context.run_id(),
            path = %context.run_dir().display(),
            error = %e,
            "Failed to remove run directory"
        );
    }
}
