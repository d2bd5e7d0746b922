//! Types for the fetcher module.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::grid::TileCoordinate;

/// A tile downloaded into the run workspace, tagged with its grid position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileFile {
    pub row: u32,
    pub col: u32,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl TileFile {
    pub fn new(coordinate: &TileCoordinate, path: PathBuf, size_bytes: u64) -> Self {
        Self {
            row: coordinate.row,
            col: coordinate.col,
            path,
            size_bytes,
        }
    }

    /// Grid position as `(row, col)`.
    pub fn position(&self) -> (u32, u32) {
        (self.row, self.col)
    }
}

/// File name of the tile at `(row, col)`, zero-padded so names sort row-major.
pub fn tile_file_name(row: u32, col: u32) -> String {
    format!("image{:02}{:02}.jpg", row, col)
}

/// Path of the tile slot for a coordinate inside a workspace.
pub fn tile_slot(workspace: &Path, coordinate: &TileCoordinate) -> PathBuf {
    workspace.join(tile_file_name(coordinate.row, coordinate.col))
}
