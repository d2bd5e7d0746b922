use super::{
    types::{Config, GateMethod},
    ConfigError,
};
use crate::grid::GridSize;

/// Validate configuration
/// Currently validates:
/// - Gate section exists (enforced by serde) and is complete for its method
/// - Server port is not 0
/// - Fetch timeout is positive
/// - Output quality is within 1..=100
/// - Default grid size is a valid odd size
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.timeout_secs must be greater than 0".to_string(),
        ));
    }

    if !(1..=100).contains(&config.output.quality) {
        return Err(ConfigError::ValidationError(format!(
            "output.quality must be between 1 and 100, got {}",
            config.output.quality
        )));
    }

    GridSize::new(config.defaults.grid_size)
        .map_err(|e| ConfigError::ValidationError(format!("defaults.grid_size: {}", e)))?;

    if config.gate.method == GateMethod::Sha256 {
        if config.gate.secret.is_none() {
            return Err(ConfigError::ValidationError(
                "gate.secret must be set when using the sha256 gate".to_string(),
            ));
        }
        let digest = config.gate.expected_digest.as_deref().unwrap_or_default();
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::ValidationError(
                "gate.expected_digest must be a 64 character hex SHA-256 digest".to_string(),
            ));
        }
    }

    Ok(())
}
