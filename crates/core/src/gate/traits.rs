use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Domain not allowed: {0}")]
    Denied(String),

    #[error("Gate unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Authorization predicate deciding which tile server domains may be proxied.
#[async_trait]
pub trait DomainGate: Send + Sync {
    /// Accept or reject a domain.
    async fn check(&self, domain: &str) -> Result<(), GateError>;

    /// Name of this gate implementation
    fn method_name(&self) -> &'static str;
}
