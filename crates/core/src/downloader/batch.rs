//! Concurrent tile batch downloader.

use chrono::Utc;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{BatchError, BatchResult, DownloadOutcome, TileFailure};
use super::url::TileUrlBuilder;
use crate::fetcher::{tile_slot, TileFetcher, TileFile};
use crate::grid::TileCoordinate;
use crate::metrics::TILE_FETCHES;

/// Issues every tile fetch at once and waits for all of them to settle.
///
/// A failed tile never cancels its siblings. The batch only fails as a whole
/// when no tile succeeded or when it is cancelled; deciding whether a partial
/// result is good enough is left to the caller.
pub struct BatchDownloader {
    fetcher: Arc<dyn TileFetcher>,
    scheme: String,
}

impl BatchDownloader {
    pub fn new(fetcher: Arc<dyn TileFetcher>, scheme: impl Into<String>) -> Self {
        Self {
            fetcher,
            scheme: scheme.into(),
        }
    }

    /// Downloads all `coordinates` of `layer` from `domain` into `workspace`.
    pub async fn download_all(
        &self,
        coordinates: &[TileCoordinate],
        domain: &str,
        layer: &str,
        workspace: &Path,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, BatchError> {
        let urls = TileUrlBuilder::new(&self.scheme, domain, layer, Utc::now().timestamp_millis());
        // Child token so cancelling the batch never cancels the caller.
        let batch_token = cancel.child_token();

        debug!(
            tiles = coordinates.len(),
            timestamp = urls.timestamp(),
            fetcher = self.fetcher.name(),
            "Starting tile batch"
        );

        let fetches = coordinates.iter().map(|coordinate| {
            let url = urls.url_for(coordinate);
            let destination = tile_slot(workspace, coordinate);
            let token = &batch_token;

            async move {
                debug!(row = coordinate.row, col = coordinate.col, url = %url, "Fetching tile");
                match self.fetcher.fetch(&url, &destination, token).await {
                    Ok(size_bytes) => {
                        TILE_FETCHES.with_label_values(&["success"]).inc();
                        DownloadOutcome::Success(TileFile::new(coordinate, destination, size_bytes))
                    }
                    Err(error) => {
                        TILE_FETCHES.with_label_values(&[error.kind()]).inc();
                        DownloadOutcome::Failure(TileFailure {
                            coordinate: *coordinate,
                            url,
                            error,
                        })
                    }
                }
            }
        });

        let result: BatchResult = join_all(fetches).await.into_iter().collect();

        if cancel.is_cancelled() {
            info!(
                succeeded = result.success_count(),
                "Tile batch cancelled before completion"
            );
            return Err(BatchError::Cancelled);
        }

        info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "Tile batch settled"
        );

        for failure in &result.failures {
            warn!(
                row = failure.coordinate.row,
                col = failure.coordinate.col,
                url = %failure.url,
                error = %failure.error,
                "Tile download failed"
            );
        }

        if result.success_count() == 0 {
            return Err(BatchError::AllFailed {
                attempted: result.attempted(),
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{compute_tile_coordinates, Center, GridSize};
    use crate::testing::MockTileFetcher;
    use tempfile::TempDir;

    fn coordinates(n: i64) -> Vec<TileCoordinate> {
        compute_tile_coordinates(Center::new(-12, 8), GridSize::new(n).unwrap())
    }

    #[tokio::test]
    async fn test_all_tiles_succeed() {
        let fetcher = Arc::new(MockTileFetcher::new());
        let downloader = BatchDownloader::new(fetcher.clone(), "https");
        let dir = TempDir::new().unwrap();
        let coords = coordinates(3);

        let result = downloader
            .download_all(&coords, "example.test", "t", dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.success_count(), 9);
        assert_eq!(result.failure_count(), 0);
        assert_eq!(fetcher.call_count().await, 9);
        for (tile, coord) in result.tiles.iter().zip(&coords) {
            assert_eq!(tile.position(), (coord.row, coord.col));
            assert!(tile.path.exists());
        }
    }

    #[tokio::test]
    async fn test_partial_failure_is_tolerated() {
        let fetcher = Arc::new(MockTileFetcher::new());
        let coords = coordinates(5);
        fetcher.fail_tile(coords[3].world_x, coords[3].world_y).await;
        fetcher.fail_tile(coords[17].world_x, coords[17].world_y).await;
        fetcher.fail_tile(coords[24].world_x, coords[24].world_y).await;

        let downloader = BatchDownloader::new(fetcher.clone(), "https");
        let dir = TempDir::new().unwrap();

        let result = downloader
            .download_all(&coords, "example.test", "t", dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.success_count(), 22);
        assert_eq!(result.failure_count(), 3);
        assert_eq!(fetcher.call_count().await, 25);
        let failed: Vec<_> = result
            .failures
            .iter()
            .map(|f| (f.coordinate.row, f.coordinate.col))
            .collect();
        assert_eq!(failed, vec![(0, 3), (3, 2), (4, 4)]);
    }

    #[tokio::test]
    async fn test_only_one_success_is_still_ok() {
        let fetcher = Arc::new(MockTileFetcher::new());
        let coords = coordinates(3);
        for coord in &coords[1..] {
            fetcher.fail_tile(coord.world_x, coord.world_y).await;
        }

        let downloader = BatchDownloader::new(fetcher, "https");
        let dir = TempDir::new().unwrap();

        let result = downloader
            .download_all(&coords, "example.test", "t", dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 8);
    }

    #[tokio::test]
    async fn test_all_failed_raises() {
        let fetcher = Arc::new(MockTileFetcher::new());
        fetcher.fail_all().await;
        let downloader = BatchDownloader::new(fetcher.clone(), "https");
        let dir = TempDir::new().unwrap();

        let result = downloader
            .download_all(&coordinates(3), "example.test", "t", dir.path(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(BatchError::AllFailed { attempted: 9 })));
        assert_eq!(fetcher.call_count().await, 9);
    }

    #[tokio::test]
    async fn test_urls_share_one_timestamp() {
        let fetcher = Arc::new(MockTileFetcher::new());
        let downloader = BatchDownloader::new(fetcher.clone(), "https");
        let dir = TempDir::new().unwrap();

        downloader
            .download_all(&coordinates(3), "example.test", "t", dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        let urls = fetcher.requested_urls().await;
        assert_eq!(urls.len(), 9);
        let stamps: std::collections::HashSet<_> = urls
            .iter()
            .map(|u| u.rsplit("timestamp=").next().unwrap().to_string())
            .collect();
        assert_eq!(stamps.len(), 1);
        assert!(urls
            .iter()
            .all(|u| u.starts_with("https://example.test/tiles/world/t/-1_0/zz_")));
        assert!(urls.iter().any(|u| u.contains("zz_-16_4.jpg")));
    }

    #[tokio::test]
    async fn test_cancelled_batch_reports_cancellation() {
        let fetcher = Arc::new(MockTileFetcher::new());
        fetcher
            .set_fetch_delay(std::time::Duration::from_secs(30))
            .await;
        let downloader = BatchDownloader::new(fetcher.clone(), "https");
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = downloader
            .download_all(&coordinates(3), "example.test", "t", dir.path(), &token)
            .await;

        assert!(matches!(result, Err(BatchError::Cancelled)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
