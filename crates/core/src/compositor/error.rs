//! Error types for the compositor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compositing a grid.
#[derive(Debug, Error)]
pub enum CompositorError {
    /// Number of tiles does not match the grid.
    #[error("Expected {expected} tiles, got {actual}")]
    WrongTileCount { expected: usize, actual: usize },

    /// Two tiles claim the same cell, or a tile lies outside the grid.
    #[error("Tile position ({row}, {col}) is duplicated or outside the grid")]
    InvalidPosition { row: u32, col: u32 },

    /// Width or height of the first tile could not be determined.
    #[error("Could not determine tile dimensions from {path}")]
    UnknownDimensions { path: PathBuf },

    /// A tile's dimensions differ from those of the first tile.
    #[error("Tile {path} is {width}x{height}, expected {expected_width}x{expected_height}")]
    MismatchedTile {
        path: PathBuf,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// A tile could not be decoded.
    #[error("Failed to decode tile {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    /// Compositing or encoding the canvas failed.
    #[error("Failed to encode composite image: {reason}")]
    EncodeFailed { reason: String },
}

impl CompositorError {
    /// Creates an encode failed error.
    pub fn encode_failed(reason: impl Into<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
        }
    }
}
