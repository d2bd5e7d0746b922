pub mod compositor;
pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod gate;
pub mod grid;
pub mod metrics;
pub mod pipeline;
pub mod testing;

pub use compositor::{CompositeImage, Compositor, CompositorError, ImageCompositor, TileLayout};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, GateMethod,
    SanitizedConfig,
};
pub use downloader::{BatchDownloader, BatchError, BatchResult};
pub use fetcher::{FetchError, HttpTileFetcher, TileFetcher, TileFile};
pub use gate::{create_gate, DomainGate, GateError, OpenGate, Sha256DomainGate};
pub use grid::{
    compute_tile_coordinates, Center, GridRequest, GridSize, TileCoordinate, ValidationError,
};
pub use pipeline::{
    prune_failed_runs, sweep_abandoned_runs, FailureReason, MosaicPipeline, PipelineError,
    PipelineReport, PipelineState, RunContext,
};
