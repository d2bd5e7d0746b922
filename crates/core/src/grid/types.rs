//! Types describing a tile grid request.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while validating a request, before any I/O happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Grid size is even, non-positive or too large.
    #[error("Grid size must be odd and satisfy 0 < n < 10, got {0}")]
    InvalidGridSize(i64),

    /// Domain parameter is empty.
    #[error("Domain must not be empty")]
    EmptyDomain,

    /// Layer parameter contains characters that cannot appear in a tile path.
    #[error("Invalid layer: {0}")]
    InvalidLayer(String),

    /// Domain was rejected by the access gate.
    #[error("Domain rejected by access gate: {0}")]
    DomainRejected(String),
}

/// Odd number of tiles per side of the grid, in `1..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridSize(u32);

impl GridSize {
    /// Largest accepted grid size.
    pub const MAX: u32 = 9;

    pub fn new(n: i64) -> Result<Self, ValidationError> {
        if n > 0 && n < 10 && n % 2 == 1 {
            Ok(Self(n as u32))
        } else {
            Err(ValidationError::InvalidGridSize(n))
        }
    }

    /// Tiles per side.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(self) -> usize {
        (self.0 * self.0) as usize
    }

    /// Distance in tiles from the center to an edge.
    pub fn half(self) -> u32 {
        self.0 / 2
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Center of the grid in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Center {
    pub x: i64,
    pub y: i64,
}

impl Center {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// One cell of the grid: its position and the world coordinate it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoordinate {
    pub row: u32,
    pub col: u32,
    pub world_x: i64,
    pub world_y: i64,
}

/// A validated request for one composite image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRequest {
    pub domain: String,
    pub layer: String,
    pub center: Center,
    pub grid_size: GridSize,
}

impl GridRequest {
    /// Builds a request, rejecting invalid grid sizes and empty domains.
    pub fn new(
        domain: impl Into<String>,
        layer: impl Into<String>,
        center: Center,
        grid_size: i64,
    ) -> Result<Self, ValidationError> {
        let grid_size = GridSize::new(grid_size)?;

        let domain = domain.into();
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(ValidationError::EmptyDomain);
        }

        let layer = layer.into();
        if layer.is_empty() || layer.contains(['/', '?', '#']) {
            return Err(ValidationError::InvalidLayer(layer));
        }

        Ok(Self {
            domain: domain.to_string(),
            layer,
            center,
            grid_size,
        })
    }
}
