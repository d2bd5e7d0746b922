//! Compositor module for assembling downloaded tiles into one image.
//!
//! Tiles are placed by their `(row, col)` metadata rather than by file name,
//! so ordering never depends on a naming convention.
//!
//! # Example
//!
//! ```ignore
//! use dynmap_core::compositor::{Compositor, ImageCompositor, TileLayout};
//!
//! let compositor = ImageCompositor::new(90, TileLayout::RowMajor);
//! let composite = compositor.compose(tiles, grid_size, &output_path).await?;
//! println!("{}x{}", composite.width, composite.height);
//! ```

mod error;
mod image_compositor;
mod traits;
mod types;

pub use error::CompositorError;
pub use image_compositor::ImageCompositor;
pub use traits::Compositor;
pub use types::{CompositeImage, TileLayout};
