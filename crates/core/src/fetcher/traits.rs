//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::error::FetchError;

/// Downloads a single tile into a local slot.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `destination` and returns the number of bytes written.
    ///
    /// On any error, including cancellation, no file is left at `destination`.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError>;
}
