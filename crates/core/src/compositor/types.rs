//! Types for the compositor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a grid cell maps to a pixel offset on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileLayout {
    /// Row `i` goes down, column `j` goes right: `(j * w, i * h)`.
    #[default]
    RowMajor,
    /// Dynmap orientation: row `i` goes right, column `j` goes up:
    /// `(i * w, (n - 1 - j) * h)`.
    Dynmap,
}

impl TileLayout {
    /// Pixel offset `(left, top)` of the tile at `(row, col)` in an `n`-wide grid.
    pub fn offset(
        self,
        row: u32,
        col: u32,
        n: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> (u32, u32) {
        match self {
            Self::RowMajor => (col * tile_width, row * tile_height),
            Self::Dynmap => (row * tile_width, (n - 1 - col) * tile_height),
        }
    }
}

/// The encoded composite written by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_offsets() {
        let layout = TileLayout::RowMajor;
        assert_eq!(layout.offset(0, 0, 3, 256, 128), (0, 0));
        assert_eq!(layout.offset(0, 2, 3, 256, 128), (512, 0));
        assert_eq!(layout.offset(2, 1, 3, 256, 128), (256, 256));
    }

    #[test]
    fn test_dynmap_offsets() {
        let layout = TileLayout::Dynmap;
        // First tile (lowest world x and y) lands bottom-left.
        assert_eq!(layout.offset(0, 0, 3, 256, 256), (0, 512));
        assert_eq!(layout.offset(0, 2, 3, 256, 256), (0, 0));
        assert_eq!(layout.offset(2, 0, 3, 256, 256), (512, 512));
    }

    #[test]
    fn test_layout_serde() {
        let layout: TileLayout = serde_json::from_str("\"dynmap\"").unwrap();
        assert_eq!(layout, TileLayout::Dynmap);
        assert_eq!(
            serde_json::to_string(&TileLayout::RowMajor).unwrap(),
            "\"row_major\""
        );
    }
}
