//! Mock tile fetcher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::fixtures::encode_png_tile;
use crate::fetcher::{FetchError, TileFetcher};

/// Mock implementation of the TileFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Record every requested URL
/// - Fail individual tiles by world coordinate, or every tile
/// - Delay fetches to exercise cancellation
/// - Write a solid PNG tile of configurable size on success
///
/// # Example
///
/// ```rust,ignore
/// use dynmap_core::testing::MockTileFetcher;
///
/// let fetcher = MockTileFetcher::new();
/// fetcher.fail_tile(-16, 4).await;
///
/// // Run a batch...
///
/// assert_eq!(fetcher.call_count().await, 25);
/// ```
#[derive(Debug)]
pub struct MockTileFetcher {
    /// Every URL passed to `fetch`, in call order.
    requests: Arc<RwLock<Vec<String>>>,
    /// World coordinates whose fetch fails.
    failing: Arc<RwLock<HashSet<(i64, i64)>>>,
    /// If true, every fetch fails.
    fail_all: Arc<RwLock<bool>>,
    /// Status returned for failing tiles.
    failure_status: Arc<RwLock<u16>>,
    /// Simulated network latency.
    delay: Arc<RwLock<Option<Duration>>>,
    /// Dimensions of the tiles written on success.
    tile_size: Arc<RwLock<(u32, u32)>>,
    /// Fill colour of the tiles written on success.
    tile_color: Arc<RwLock<[u8; 3]>>,
}

impl Default for MockTileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTileFetcher {
    /// Create a new mock fetcher that serves 256x256 tiles.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            fail_all: Arc::new(RwLock::new(false)),
            failure_status: Arc::new(RwLock::new(404)),
            delay: Arc::new(RwLock::new(None)),
            tile_size: Arc::new(RwLock::new((256, 256))),
            tile_color: Arc::new(RwLock::new([40, 120, 200])),
        }
    }

    /// Make the tile at world `(x, y)` fail.
    pub async fn fail_tile(&self, world_x: i64, world_y: i64) {
        self.failing.write().await.insert((world_x, world_y));
    }

    /// Make every fetch fail.
    pub async fn fail_all(&self) {
        *self.fail_all.write().await = true;
    }

    /// Set the HTTP status reported for failing tiles.
    pub async fn set_failure_status(&self, status: u16) {
        *self.failure_status.write().await = status;
    }

    /// Delay each fetch by `delay`, honouring cancellation while waiting.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Set the dimensions of generated tiles.
    pub async fn set_tile_size(&self, width: u32, height: u32) {
        *self.tile_size.write().await = (width, height);
    }

    /// Set the fill colour of generated tiles.
    pub async fn set_tile_color(&self, color: [u8; 3]) {
        *self.tile_color.write().await = color;
    }

    /// Get the number of fetches performed.
    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Get all requested URLs.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    async fn should_fail(&self, url: &str) -> bool {
        if *self.fail_all.read().await {
            return true;
        }
        match world_coordinates(url) {
            Some(position) => self.failing.read().await.contains(&position),
            None => false,
        }
    }
}

#[async_trait]
impl TileFetcher for MockTileFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        self.requests.write().await.push(url.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        if self.should_fail(url).await {
            return Err(FetchError::BadStatus(*self.failure_status.read().await));
        }

        let (width, height) = *self.tile_size.read().await;
        let color = *self.tile_color.read().await;
        let bytes = encode_png_tile(width, height, color);

        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|e| FetchError::write(destination, e))?;

        Ok(bytes.len() as u64)
    }
}

/// Parses `(x, y)` from a `.../zz_{x}_{y}.jpg?...` tile URL.
fn world_coordinates(url: &str) -> Option<(i64, i64)> {
    let name = url.split('?').next()?.rsplit('/').next()?;
    let stem = name.strip_prefix("zz_")?.strip_suffix(".jpg")?;
    let (x, y) = stem.split_once('_')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_world_coordinates_parse_negative_values() {
        assert_eq!(
            world_coordinates("https://a.test/tiles/world/t/-1_0/zz_-16_4.jpg?timestamp=1"),
            Some((-16, 4))
        );
        assert_eq!(world_coordinates("https://a.test/other.png"), None);
    }

    #[tokio::test]
    async fn test_success_writes_tile() {
        let fetcher = MockTileFetcher::new();
        fetcher.set_tile_size(4, 4).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("tile.jpg");

        let size = fetcher
            .fetch("https://a.test/zz_0_0.jpg", &dest, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(size, std::fs::metadata(&dest).unwrap().len());
        assert_eq!(image::open(&dest).unwrap().width(), 4);
    }

    #[tokio::test]
    async fn test_failing_tile() {
        let fetcher = MockTileFetcher::new();
        fetcher.fail_tile(-4, 8).await;
        fetcher.set_failure_status(500).await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("tile.jpg");

        let result = fetcher
            .fetch("https://a.test/zz_-4_8.jpg?timestamp=1", &dest, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(FetchError::BadStatus(500))));
        assert!(!dest.exists());
        assert_eq!(fetcher.call_count().await, 1);
    }
}
