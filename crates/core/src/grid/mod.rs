//! Grid geometry: request validation and tile coordinate mapping.

mod mapper;
mod types;

pub use mapper::{compute_tile_coordinates, TILE_STRIDE};
pub use types::{Center, GridRequest, GridSize, TileCoordinate, ValidationError};
