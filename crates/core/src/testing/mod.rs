//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the network and the image codec so the pipeline can
//! be driven end to end without a tile server.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynmap_core::testing::{MockCompositor, MockTileFetcher};
//!
//! let fetcher = Arc::new(MockTileFetcher::new());
//! let compositor = Arc::new(MockCompositor::new());
//!
//! fetcher.fail_tile(-12, 8).await;
//! // Build a MosaicPipeline with them...
//! ```

mod mock_compositor;
mod mock_fetcher;

pub use mock_compositor::{MockCompositor, RecordedComposition};
pub use mock_fetcher::MockTileFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::Path;

    use crate::grid::GridRequest;

    /// Default request used across tests: `example.test`, layer `t`, centre (-12, 8).
    pub fn grid_request(grid_size: i64) -> GridRequest {
        GridRequest::new("example.test", "t", crate::grid::Center::new(-12, 8), grid_size)
            .expect("valid fixture request")
    }

    /// A distinct colour per grid cell, far enough apart to survive JPEG.
    pub fn color_for(row: u32, col: u32) -> [u8; 3] {
        [
            (30 + row * 60) as u8,
            (30 + col * 60) as u8,
            (60 + (row + col) * 40) as u8,
        ]
    }

    /// Encode a solid-colour PNG tile.
    pub fn encode_png_tile(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb(color));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .expect("png encoding of an in-memory buffer");
        bytes.into_inner()
    }

    /// Write a solid-colour PNG tile to `path`.
    pub fn write_png_tile(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        std::fs::write(path, encode_png_tile(width, height, color)).expect("write fixture tile");
    }

    /// Assert two colours match within JPEG tolerance.
    pub fn assert_color_near(actual: [u8; 3], expected: [u8; 3]) {
        let close = actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 12);
        assert!(close, "colour {:?} is not close to {:?}", actual, expected);
    }
}
