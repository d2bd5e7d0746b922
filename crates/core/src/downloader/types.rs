//! Types for the downloader module.

use thiserror::Error;

use crate::fetcher::{FetchError, TileFile};
use crate::grid::TileCoordinate;

/// Batch-level failures.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Not a single tile could be downloaded.
    #[error("All {attempted} tile downloads failed")]
    AllFailed { attempted: usize },

    /// The batch was cancelled before every tile settled.
    #[error("Tile batch cancelled")]
    Cancelled,
}

/// A tile that could not be downloaded.
#[derive(Debug)]
pub struct TileFailure {
    pub coordinate: TileCoordinate,
    pub url: String,
    pub error: FetchError,
}

/// Settled result of a single tile download.
#[derive(Debug)]
pub enum DownloadOutcome {
    Success(TileFile),
    Failure(TileFailure),
}

/// Aggregated outcome of a batch, in row-major order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub tiles: Vec<TileFile>,
    pub failures: Vec<TileFailure>,
}

impl BatchResult {
    pub fn success_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn attempted(&self) -> usize {
        self.tiles.len() + self.failures.len()
    }
}

impl FromIterator<DownloadOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = DownloadOutcome>>(iter: I) -> Self {
        let mut result = BatchResult::default();
        for outcome in iter {
            match outcome {
                DownloadOutcome::Success(tile) => result.tiles.push(tile),
                DownloadOutcome::Failure(failure) => result.failures.push(failure),
            }
        }
        result
    }
}
