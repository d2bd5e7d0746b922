use async_trait::async_trait;

use super::{DomainGate, GateError};

/// Gate that accepts every domain.
/// Must be explicitly configured - the system won't default to this
pub struct OpenGate;

impl OpenGate {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DomainGate for OpenGate {
    async fn check(&self, _domain: &str) -> Result<(), GateError> {
        Ok(())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
