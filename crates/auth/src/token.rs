//! HS256 session tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use smartstock_core::AccountId;

use crate::claims::{TokenClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError>;
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct Hs256Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for Hs256Tokens {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Tokens").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl Hs256Tokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(
        &self,
        account_id: AccountId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenValidationError> {
        let claims = TokenClaims {
            sub: account_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))
    }
}

impl JwtValidator for Hs256Tokens {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenValidationError> {
        // The time window is checked against the caller-supplied clock below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now.timestamp())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_within_ttl() {
        let tokens = Hs256Tokens::new(b"test-secret", Duration::minutes(10));
        let id = AccountId::new();
        let now = Utc::now();

        let token = tokens.issue(id, "alice", now).unwrap();
        let claims = tokens.validate(&token, now + Duration::minutes(5)).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = Hs256Tokens::new(b"test-secret", Duration::minutes(10));
        let now = Utc::now();
        let token = tokens.issue(AccountId::new(), "alice", now).unwrap();

        let err = tokens.validate(&token, now + Duration::minutes(11)).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256Tokens::new(b"one", Duration::minutes(10))
            .issue(AccountId::new(), "alice", now)
            .unwrap();

        let err = Hs256Tokens::new(b"two", Duration::minutes(10))
            .validate(&token, now)
            .unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }
}
