//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while downloading one tile.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Tile server answered with a non-2xx status.
    #[error("Tile server returned HTTP {0}")]
    BadStatus(u16),

    /// Connection, TLS or body transfer failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Writing the tile to the workspace failed.
    #[error("Failed to write tile to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download did not finish within the per-tile timeout.
    #[error("Tile download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The download was aborted by its batch.
    #[error("Tile download cancelled")]
    Cancelled,
}

impl FetchError {
    /// Creates a write error for the given destination.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadStatus(_) => "bad_status",
            Self::Network(_) => "network",
            Self::Write { .. } => "write",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::BadStatus(404).to_string(),
            "Tile server returned HTTP 404"
        );
        assert_eq!(
            FetchError::Timeout { timeout_secs: 30 }.to_string(),
            "Tile download timed out after 30 seconds"
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FetchError::BadStatus(500).kind(), "bad_status");
        assert_eq!(FetchError::Network("reset".into()).kind(), "network");
        assert_eq!(
            FetchError::write("/tmp/x", std::io::Error::other("disk full")).kind(),
            "write"
        );
        assert_eq!(FetchError::Cancelled.kind(), "cancelled");
    }
}
