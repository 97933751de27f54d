use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hrms_core::UserId;

/// Identity-token claims (transport-agnostic).
///
/// The identity provider only vouches for *who* the caller is; role and
/// company are always read from the caller's own user row, never from the
/// token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user id.
    pub sub: UserId,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate JWT claims against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Verifies a bearer token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HMAC-SHA256 token validator (shared-secret identity provider).
pub struct Hs256JwtValidator {
    key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    fn claims_at(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            issued_at: now - Duration::seconds(5),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn accepts_token_signed_with_shared_secret() {
        let now = Utc::now();
        let claims = claims_at(now);
        let token = mint("s3cret", &claims);

        let out = Hs256JwtValidator::new("s3cret").validate(&token, now).unwrap();
        assert_eq!(out.sub, claims.sub);
    }

    #[test]
    fn audience_claim_is_ignored() {
        let now = Utc::now();
        let claims = claims_at(now);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({
                "sub": claims.sub,
                "iat": claims.issued_at.timestamp(),
                "exp": claims.expires_at.timestamp(),
                "aud": "authenticated",
            }),
            &EncodingKey::from_secret(b"s3cret"),
        )
        .expect("failed to encode jwt");

        let out = Hs256JwtValidator::new("s3cret").validate(&token, now).unwrap();
        assert_eq!(out.sub, claims.sub);
    }

    #[test]
    fn rejects_foreign_signature() {
        let now = Utc::now();
        let token = mint("other", &claims_at(now));
        let err = Hs256JwtValidator::new("s3cret").validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let token = mint("s3cret", &claims_at(now));
        let later = now + Duration::hours(1);
        assert_eq!(
            Hs256JwtValidator::new("s3cret").validate(&token, later).unwrap_err(),
            TokenValidationError::Expired
        );
    }

    #[test]
    fn validate_claims_checks_window() {
        let now = Utc::now();
        let mut c = claims_at(now);
        c.expires_at = c.issued_at;
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::InvalidTimeWindow));

        let c = claims_at(now + Duration::minutes(1));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }
}
