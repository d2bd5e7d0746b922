//! Grid cell to world coordinate mapping.

use super::types::{Center, GridSize, TileCoordinate};

/// World units between two adjacent tiles.
pub const TILE_STRIDE: i64 = 4;

/// Computes the `n * n` tile coordinates around `center`, row-major.
///
/// Row `i` and column `j` map to `(base_x + 4i, base_y + 4j)` where the base
/// is the center shifted by `4 * floor(n / 2)` on both axes, so `(0, 0)` is the
/// cell with the smallest world coordinates.
pub fn compute_tile_coordinates(center: Center, grid_size: GridSize) -> Vec<TileCoordinate> {
    let n = grid_size.get();
    let offset = TILE_STRIDE * grid_size.half() as i64;
    let base_x = center.x - offset;
    let base_y = center.y - offset;

    (0..n)
        .flat_map(|row| {
            (0..n).map(move |col| TileCoordinate {
                row,
                col,
                world_x: base_x + TILE_STRIDE * row as i64,
                world_y: base_y + TILE_STRIDE * col as i64,
            })
        })
        .collect()
}
