//! Batch downloading of a full tile grid.
//!
//! The downloader collects every outcome and tolerates partial failure; the
//! pipeline on top of it decides whether the collected set is complete enough
//! to composite.

mod batch;
mod types;
mod url;

pub use batch::BatchDownloader;
pub use types::{BatchError, BatchResult, DownloadOutcome, TileFailure};
pub use url::TileUrlBuilder;
