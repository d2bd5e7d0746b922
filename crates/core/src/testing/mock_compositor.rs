//! Mock compositor for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::compositor::{CompositeImage, Compositor, CompositorError};
use crate::fetcher::TileFile;
use crate::grid::GridSize;

/// A recorded compose call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedComposition {
    pub tiles: Vec<TileFile>,
    pub grid_size: GridSize,
}

/// Mock implementation of the Compositor trait.
///
/// Records every call and writes a small placeholder file to the output
/// path instead of encoding a real image. Reported dimensions assume
/// 256x256 tiles.
#[derive(Debug)]
pub struct MockCompositor {
    compositions: Arc<RwLock<Vec<RecordedComposition>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<CompositorError>>>,
}

impl Default for MockCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompositor {
    /// Bytes written to the output path on success.
    pub const PLACEHOLDER: &'static [u8] = b"mock-composite";

    /// Create a new mock compositor.
    pub fn new() -> Self {
        Self {
            compositions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the number of compose calls.
    pub async fn call_count(&self) -> usize {
        self.compositions.read().await.len()
    }

    /// Get all recorded compose calls.
    pub async fn recorded_compositions(&self) -> Vec<RecordedComposition> {
        self.compositions.read().await.clone()
    }

    /// Make the next compose call fail.
    pub async fn set_next_error(&self, error: CompositorError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Compositor for MockCompositor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn compose(
        &self,
        tiles: Vec<TileFile>,
        grid_size: GridSize,
        output: &Path,
    ) -> Result<CompositeImage, CompositorError> {
        self.compositions.write().await.push(RecordedComposition {
            tiles: tiles.clone(),
            grid_size,
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        tokio::fs::write(output, Self::PLACEHOLDER)
            .await
            .map_err(|e| CompositorError::encode_failed(e.to_string()))?;

        let n = grid_size.get();
        Ok(CompositeImage {
            path: output.to_path_buf(),
            width: 256 * n,
            height: 256 * n,
            tile_width: 256,
            tile_height: 256,
            tile_count: tiles.len(),
        })
    }
}
