use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::compositor::TileLayout;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gate: GateConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Domain gate configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    pub method: GateMethod,
    /// Salt appended to the domain before hashing.
    #[serde(default)]
    pub secret: Option<String>,
    /// Lowercase hex SHA-256 of `domain + secret`.
    #[serde(default)]
    pub expected_digest: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateMethod {
    None,
    Sha256,
}

/// Tile fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// URL scheme used for tile requests.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Per-tile timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User-Agent sent with every tile request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("dynmap2img/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Scratch workspace configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Directory under which every run gets its own subdirectory.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
    /// Keep the tiles of a failed run on disk.
    #[serde(default = "default_true")]
    pub retain_failed: bool,
    /// Upper bound on retained failed runs; older ones are pruned.
    #[serde(default = "default_max_retained_failures")]
    pub max_retained_failures: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            retain_failed: true,
            max_retained_failures: default_max_retained_failures(),
        }
    }
}

fn default_max_retained_failures() -> usize {
    16
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("dynmap2img")
}

fn default_true() -> bool {
    true
}

/// Output image configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// JPEG quality (1-100).
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// `max-age` of the public Cache-Control directive.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u32,
    #[serde(default)]
    pub layout: TileLayout,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            cache_max_age_secs: default_cache_max_age(),
            layout: TileLayout::default(),
        }
    }
}

fn default_quality() -> u8 {
    90
}

fn default_cache_max_age() -> u32 {
    60
}

/// Values used when a request omits a parameter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestDefaults {
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default = "default_center_x")]
    pub center_x: i64,
    #[serde(default = "default_center_y")]
    pub center_y: i64,
    #[serde(default = "default_grid_size")]
    pub grid_size: i64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            layer: default_layer(),
            center_x: default_center_x(),
            center_y: default_center_y(),
            grid_size: default_grid_size(),
        }
    }
}

fn default_layer() -> String {
    "t".to_string()
}

fn default_center_x() -> i64 {
    -12
}

fn default_center_y() -> i64 {
    8
}

fn default_grid_size() -> i64 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub gate: SanitizedGateConfig,
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub workspace: WorkspaceConfig,
    pub output: OutputConfig,
    pub defaults: RequestDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGateConfig {
    pub method: String,
    pub secret_configured: bool,
    pub digest_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            gate: SanitizedGateConfig {
                method: match config.gate.method {
                    GateMethod::None => "none".to_string(),
                    GateMethod::Sha256 => "sha256".to_string(),
                },
                secret_configured: config.gate.secret.is_some(),
                digest_configured: config.gate.expected_digest.is_some(),
            },
            server: config.server.clone(),
            fetch: config.fetch.clone(),
            workspace: config.workspace.clone(),
            output: config.output.clone(),
            defaults: config.defaults.clone(),
        }
    }
}
