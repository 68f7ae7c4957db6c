//! Access token inspection
//!
//! The client never holds the signing key. It only reads the payload to
//! notice an expired token before the backend rejects it.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is expired")]
    Expired,
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// The payload fields the client cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

/// Decode the payload without checking the signature
pub fn inspect(token: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Malformed(e.to_string()))
}

/// Check a token's `exp` against `now`.
///
/// Tokens that are not JWTs carry no expiry the client can read and pass.
pub fn check_expiry(token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
    match inspect(token) {
        Ok(claims) if claims.is_expired_at(now) => Err(TokenError::Expired),
        Ok(_) | Err(TokenError::Malformed(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(exp: i64) -> String {
        let claims = TokenClaims {
            sub: Some("u-1".into()),
            exp: Some(exp),
            email: Some("dana@build.co.il".into()),
            ..Default::default()
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-only")).unwrap()
    }

    #[test]
    fn test_inspect_reads_payload_without_key() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let claims = inspect(&token(exp)).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("u-1"));
        assert_eq!(claims.exp, Some(exp));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let past = (now - Duration::minutes(5)).timestamp();
        let future = (now + Duration::minutes(5)).timestamp();
        assert_eq!(check_expiry(&token(past), now), Err(TokenError::Expired));
        assert_eq!(check_expiry(&token(future), now), Ok(()));
    }

    #[test]
    fn test_opaque_token_passes() {
        assert!(inspect("opaque-session-token").is_err());
        assert_eq!(check_expiry("opaque-session-token", Utc::now()), Ok(()));
    }
}
