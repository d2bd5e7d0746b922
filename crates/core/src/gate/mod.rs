mod open;
mod sha256;
mod traits;

pub use open::*;
pub use sha256::*;
pub use traits::*;

use crate::config::GateConfig;

/// Factory function to create a domain gate from config
pub fn create_gate(config: &GateConfig) -> Result<Box<dyn DomainGate>, GateError> {
    use crate::config::GateMethod;

    match config.method {
        GateMethod::None => Ok(Box::new(OpenGate::new())),
        GateMethod::Sha256 => {
            let secret = config.secret.clone().ok_or_else(|| {
                GateError::ConfigurationError(
                    "secret must be set when using the sha256 gate".to_string(),
                )
            })?;
            let expected_digest = config.expected_digest.clone().ok_or_else(|| {
                GateError::ConfigurationError(
                    "expected_digest must be set when using the sha256 gate".to_string(),
                )
            })?;
            Ok(Box::new(Sha256DomainGate::new(secret, expected_digest)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateMethod;

    #[test]
    fn test_create_gate_none() {
        let config = GateConfig {
            method: GateMethod::None,
            secret: None,
            expected_digest: None,
        };
        let gate = create_gate(&config).unwrap();
        assert_eq!(gate.method_name(), "none");
    }

    #[test]
    fn test_create_gate_sha256() {
        let config = GateConfig {
            method: GateMethod::Sha256,
            secret: Some("pepper".to_string()),
            expected_digest: Some("a".repeat(64)),
        };
        let gate = create_gate(&config).unwrap();
        assert_eq!(gate.method_name(), "sha256");
    }

    #[test]
    fn test_create_gate_sha256_missing_secret() {
        let config = GateConfig {
            method: GateMethod::Sha256,
            secret: None,
            expected_digest: Some("a".repeat(64)),
        };
        let result = create_gate(&config);
        assert!(matches!(result, Err(GateError::ConfigurationError(_))));
    }
}
