use serde::{Deserialize, Serialize};
use thiserror::Error;

use smartstock_core::AccountId;

/// Claims carried by a session token.
///
/// Identity only: capabilities are absent and always re-read from
/// the account store. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: AccountId,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Validate the time window of already-decoded claims against `now` (epoch seconds).
pub fn validate_claims(claims: &TokenClaims, now: i64) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: AccountId::new(),
            username: "alice".into(),
            iat,
            exp,
        }
    }

    #[test]
    fn window_is_half_open() {
        let c = claims(100, 200);
        assert!(validate_claims(&c, 100).is_ok());
        assert!(validate_claims(&c, 199).is_ok());
        assert_eq!(validate_claims(&c, 200), Err(TokenValidationError::Expired));
        assert_eq!(validate_claims(&c, 99), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(200, 200), 200),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
