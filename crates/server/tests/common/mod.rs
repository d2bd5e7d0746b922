//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock tile fetcher injected, so full requests can be exercised
//! without a tile server. Compositing uses the real image compositor.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use dynmap_core::{
    config::{
        FetchConfig, GateConfig, OutputConfig, RequestDefaults, ServerConfig, WorkspaceConfig,
    },
    create_gate, Config, DomainGate, GateMethod, ImageCompositor, MosaicPipeline,
    testing::MockTileFetcher,
};
use dynmap_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use dynmap_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_mosaic() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.get("/api/v1/mosaic?domain=example.test&n=3").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock tile fetcher - fail tiles, inspect requested URLs
    pub fetcher: Arc<MockTileFetcher>,
    /// Temporary workspace root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` for non-JSON responses
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with an open gate.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fetcher = Arc::new(MockTileFetcher::new());

        let config = Config {
            gate: test_config.gate,
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            fetch: FetchConfig::default(),
            workspace: WorkspaceConfig {
                root: temp_dir.path().to_path_buf(),
                retain_failed: test_config.retain_failed,
                max_retained_failures: test_config.max_retained_failures,
            },
            output: OutputConfig::default(),
            defaults: RequestDefaults::default(),
        };

        let gate: Arc<dyn DomainGate> = Arc::from(create_gate(&config.gate).expect("Failed to create gate"));
        let compositor = Arc::new(ImageCompositor::new(
            config.output.quality,
            config.output.layout,
        ));
        let pipeline = MosaicPipeline::new(
            gate,
            fetcher.clone(),
            compositor,
            config.fetch.scheme.clone(),
        );

        let state = Arc::new(AppState::new(config, pipeline));
        let router = create_router(state);

        Self {
            router,
            fetcher,
            temp_dir,
        }
    }

    /// Number of run directories left under the workspace root.
    #[allow(dead_code)]
    pub fn run_dir_count(&self) -> usize {
        self.run_dirs().len()
    }

    /// Run directories left under the workspace root.
    #[allow(dead_code)]
    pub fn run_dirs(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .expect("Failed to read workspace root")
            .map(|entry| entry.expect("Failed to read dir entry").path())
            .collect()
    }

    /// Wait until the workspace root holds `count` run directories.
    #[allow(dead_code)]
    pub async fn wait_for_run_dirs(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.run_dir_count() == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.run_dir_count() == count
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub gate: GateConfig,
    pub retain_failed: bool,
    pub max_retained_failures: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig {
                method: GateMethod::None,
                secret: None,
                expected_digest: None,
            },
            retain_failed: true,
            max_retained_failures: WorkspaceConfig::default().max_retained_failures,
        }
    }
}

impl TestConfig {
    /// Create config with a sha256 gate that only admits `domain`.
    #[allow(dead_code)]
    pub fn with_gate_for(domain: &str, secret: &str) -> Self {
        let digest = dynmap_core::Sha256DomainGate::new(secret.to_string(), String::new())
            .digest_for(domain);
        Self {
            gate: GateConfig {
                method: GateMethod::Sha256,
                secret: Some(secret.to_string()),
                expected_digest: Some(digest),
            },
            ..Default::default()
        }
    }

    /// Create config that keeps at most `keep` failed runs.
    #[allow(dead_code)]
    pub fn retaining_at_most(keep: usize) -> Self {
        Self {
            max_retained_failures: keep,
            ..Default::default()
        }
    }

    /// Create config that removes failed runs.
    #[allow(dead_code)]
    pub fn discarding_failed_runs() -> Self {
        Self {
            retain_failed: false,
            ..Default::default()
        }
    }
}
