//! Fetcher module for downloading single tiles.
//!
//! [`TileFetcher`] is the seam between the batch downloader and the network.
//! [`HttpTileFetcher`] streams each response body directly into its workspace
//! slot, enforces a per-tile timeout and honours a cancellation token. Every
//! failure path removes the partially written file.

mod error;
mod http;
mod traits;
mod types;

pub use error::FetchError;
pub use http::HttpTileFetcher;
pub use traits::TileFetcher;
pub use types::{tile_file_name, tile_slot, TileFile};
