//! Shared-secret domain gate.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{DomainGate, GateError};

/// Accepts a domain when `sha256(domain + secret)` equals a configured digest.
///
/// This is a shared-secret check that keeps casual callers from pointing the
/// service at arbitrary hosts, not an authentication scheme.
pub struct Sha256DomainGate {
    secret: String,
    expected_digest: String,
}

impl Sha256DomainGate {
    pub fn new(secret: String, expected_digest: String) -> Self {
        Self {
            secret,
            expected_digest: expected_digest.to_ascii_lowercase(),
        }
    }

    /// Hex digest of `domain` salted with the secret.
    pub fn digest_for(&self, domain: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        hasher.update(self.secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl DomainGate for Sha256DomainGate {
    async fn check(&self, domain: &str) -> Result<(), GateError> {
        let digest = self.digest_for(domain);

        if constant_time_eq(digest.as_bytes(), self.expected_digest.as_bytes()) {
            Ok(())
        } else {
            Err(GateError::Denied(domain.to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "sha256"
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
