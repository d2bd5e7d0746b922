//! Trait definitions for the compositor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::CompositorError;
use super::types::CompositeImage;
use crate::fetcher::TileFile;
use crate::grid::GridSize;

/// Assembles a full grid of tiles into one encoded image.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Returns the name of this compositor implementation.
    fn name(&self) -> &str;

    /// Composites exactly `grid_size²` tiles and writes the result to `output`.
    ///
    /// Any previous file at `output` is replaced only once the new image has
    /// been fully encoded.
    async fn compose(
        &self,
        tiles: Vec<TileFile>,
        grid_size: GridSize,
        output: &Path,
    ) -> Result<CompositeImage, CompositorError>;
}
