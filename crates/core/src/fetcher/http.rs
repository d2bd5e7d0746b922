//! HTTP tile fetcher backed by reqwest.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::FetchError;
use super::traits::TileFetcher;
use crate::config::FetchConfig;

/// Streams tiles from an HTTP(S) server straight to disk.
pub struct HttpTileFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpTileFetcher {
    /// Create a new fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Overrides the per-tile timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Performs the request and copies the body chunk by chunk.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| FetchError::write(destination, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::write(destination, e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| FetchError::write(destination, e))?;

        Ok(written)
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        // Losing either race drops the download future, which aborts the request.
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.download(url, destination)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }),
                }
            }
        };

        match &result {
            Ok(bytes) => debug!(url, bytes, "Tile downloaded"),
            Err(e) => {
                debug!(url, error = %e, "Tile download failed, removing partial file");
                remove_partial(destination).await;
            }
        }

        result
    }
}

async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial tile"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    fn fetcher() -> HttpTileFetcher {
        HttpTileFetcher::new(&FetchConfig::default()).unwrap()
    }

    /// Accepts connections and never answers.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/tile.jpg", addr)
    }

    #[tokio::test]
    async fn test_successful_fetch_writes_exact_bytes() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![7u8; 10_000];
        let mock = server
            .mock("GET", "/tiles/world/t/-1_0/zz_0_0.jpg")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image0000.jpg");
        let url = format!("{}/tiles/world/t/-1_0/zz_0_0.jpg", server.url());

        let written = fetcher()
            .fetch(&url, &dest, &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_bad_status_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image0000.jpg");
        let url = format!("{}/missing.jpg", server.url());

        let result = fetcher().fetch(&url, &dest, &CancellationToken::new()).await;

        assert!(matches!(result, Err(FetchError::BadStatus(404))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image0000.jpg");
        let url = format!("http://{}/tile.jpg", addr);

        let result = fetcher().fetch(&url, &dest, &CancellationToken::new()).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_write_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tile.jpg")
            .with_status(200)
            .with_body("data")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("image0000.jpg");
        let url = format!("{}/tile.jpg", server.url());

        let result = fetcher().fetch(&url, &dest, &CancellationToken::new()).await;

        assert!(matches!(result, Err(FetchError::Write { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_timeout_aborts_and_cleans_up() {
        let url = silent_server().await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image0000.jpg");

        let fetcher = fetcher().with_timeout(Duration::from_millis(100));
        let result = fetcher.fetch(&url, &dest, &CancellationToken::new()).await;

        assert!(matches!(result, Err(FetchError::Timeout { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        let url = silent_server().await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("image0000.jpg");
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = fetcher().fetch(&url, &dest, &token).await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_name() {
        assert_eq!(fetcher().name(), "http");
    }
}
