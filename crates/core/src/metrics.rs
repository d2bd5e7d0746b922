//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tile fetches (per outcome)
//! - Pipeline runs (count and duration per outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Downloader Metrics
// =============================================================================

/// Tile fetches total by result.
pub static TILE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dynmap_tile_fetches_total", "Total tile fetch attempts"),
        &["result"], // "success", "bad_status", "network", "write", "timeout", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Pipeline runs total by result.
pub static PIPELINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dynmap_pipeline_runs_total", "Total pipeline runs"),
        &["result"], // "done" or a failure reason
    )
    .unwrap()
});

/// Pipeline run duration in seconds.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "dynmap_pipeline_duration_seconds",
            "Duration of a full pipeline run",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Register all core metrics with a registry.
pub fn register_core_metrics(registry: &prometheus::Registry) {
    registry.register(Box::new(TILE_FETCHES.clone())).ok();
    registry.register(Box::new(PIPELINE_RUNS.clone())).ok();
    registry.register(Box::new(PIPELINE_DURATION.clone())).ok();
}
