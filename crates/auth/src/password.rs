//! bcrypt password credentials.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

/// An opaque bcrypt hash. Never rendered in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl PasswordHash {
    /// Hash `plain` with the given bcrypt cost (4..=31). CPU bound: run off the async executor.
    pub fn hash(plain: &str, cost: u32) -> Result<Self, PasswordError> {
        Ok(Self(bcrypt::hash(plain, cost)?))
    }

    /// Wrap a hash that was produced elsewhere.
    pub fn from_hashed(hashed: impl Into<String>) -> Self {
        Self(hashed.into())
    }

    /// Constant-time comparison via bcrypt; a malformed stored hash never verifies.
    pub fn verify(&self, plain: &str) -> bool {
        bcrypt::verify(plain, &self.0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_original_password() {
        let hash = PasswordHash::hash("s3cret", 4).unwrap();
        assert!(hash.verify("s3cret"));
        assert!(!hash.verify("S3cret"));
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = PasswordHash::hash("s3cret", 4).unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!PasswordHash::from_hashed("not-bcrypt").verify("anything"));
    }
}
