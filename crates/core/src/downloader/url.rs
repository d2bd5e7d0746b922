//! Dynmap tile URL construction.

use crate::grid::TileCoordinate;

/// Builds tile URLs for one batch.
///
/// The timestamp is captured once so every tile of a run shares the same
/// cache-busting value.
#[derive(Debug, Clone)]
pub struct TileUrlBuilder {
    scheme: String,
    domain: String,
    layer: String,
    timestamp: i64,
}

impl TileUrlBuilder {
    pub fn new(scheme: &str, domain: &str, layer: &str, timestamp: i64) -> Self {
        Self {
            scheme: scheme.to_string(),
            domain: domain.to_string(),
            layer: layer.to_string(),
            timestamp,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn url_for(&self, coordinate: &TileCoordinate) -> String {
        format!(
            "{}://{}/tiles/world/{}/-1_0/zz_{}_{}.jpg?timestamp={}",
            self.scheme,
            self.domain,
            self.layer,
            coordinate.world_x,
            coordinate.world_y,
            self.timestamp
        )
    }
}
