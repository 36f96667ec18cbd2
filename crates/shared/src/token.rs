//! Session token signing and validation.
//!
//! A session token is issued once at sign-in, after the OAuth provider
//! has verified the user. It carries the verified profile only; the
//! durable user id is attached per request by the session enricher.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session token expiration in seconds.
    pub session_expiry_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            session_expiry_secs: 2_592_000,
        }
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is invalid.
    #[error("invalid token")]
    Invalid,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the OAuth-verified email address.
    pub sub: String,
    /// Display name from the OAuth profile.
    pub name: String,
    /// Avatar URL from the OAuth profile, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
}

impl SessionClaims {
    /// Creates claims for the given profile, expiring at `expires_at`.
    #[must_use]
    pub fn new(
        email: &str,
        name: &str,
        picture: Option<String>,
        expires_at: chrono::DateTime<Utc>,
    ) -> Self {
        Self {
            sub: email.to_string(),
            name: name.to_string(),
            picture,
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        }
    }

    /// Returns the email the session is keyed by.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.sub
    }
}

/// Service for issuing and validating session tokens.
#[derive(Clone)]
pub struct SessionTokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SessionTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl SessionTokenService {
    /// Creates a new token service with the given configuration.
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a session token for a verified OAuth profile.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EncodingError` if token generation fails.
    pub fn issue(
        &self,
        email: &str,
        name: &str,
        picture: Option<String>,
    ) -> Result<String, TokenError> {
        let expires_at = Utc::now()
            + Duration::seconds(i64::try_from(self.config.session_expiry_secs).unwrap_or(i64::MAX));
        let claims = SessionClaims::new(email, name, picture, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a session token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` if the token has expired.
    /// Returns `TokenError::DecodingError` if the token is malformed.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let validation = Validation::default();

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::DecodingError(e.to_string()),
            })
    }

    /// Returns the session expiration in seconds.
    #[must_use]
    pub const fn session_expires_in(&self) -> u64 {
        self.config.session_expiry_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> SessionTokenService {
        SessionTokenService::new(TokenConfig {
            secret: "test-secret-key-for-testing".to_string(),
            session_expiry_secs: 3600,
        })
    }

    #[test]
    fn test_issue_token() {
        let service = create_test_service();
        let token = service
            .issue("reader@example.com", "Reader", None)
            .unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn test_validate_token_roundtrip() {
        let service = create_test_service();
        let token = service
            .issue(
                "author@example.com",
                "Author",
                Some("https://cdn.example.com/a.png".to_string()),
            )
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.email(), "author@example.com");
        assert_eq!(claims.name, "Author");
        assert_eq!(
            claims.picture.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = create_test_service();
        let verifier = SessionTokenService::new(TokenConfig {
            secret: "a-different-secret".to_string(),
            session_expiry_secs: 3600,
        });

        let token = issuer.issue("reader@example.com", "Reader", None).unwrap();
        assert!(verifier.validate(&token).is_err());
    }
}
