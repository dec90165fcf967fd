//! Session tokens and password hashing.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different
//! secrets. Claims: `{ userId, kind, iat, exp, jti }`. Access tokens live
//! 15 minutes, refresh tokens 7 days. Only the SHA-256 of a refresh token is
//! ever persisted.

pub mod guard;
pub mod password;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use password::{PasswordError, hash_password, verify_password};

/// Environment variable holding the access-token secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
/// Environment variable holding the refresh-token secret.
pub const REFRESH_SECRET_ENV: &str = "REFRESH_SECRET";

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("expected a {expected} token, got a {actual} token")]
    WrongKind { expected: TokenKind, actual: TokenKind },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// Signing secrets and lifetimes for session tokens.
#[derive(Clone)]
pub struct JwtConfig {
    access_secret: String,
    refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtConfig {
    /// Default access-token lifetime.
    pub const ACCESS_TTL_MINUTES: i64 = 15;
    /// Default refresh-token lifetime.
    pub const REFRESH_TTL_DAYS: i64 = 7;

    /// Create a config with the default lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(Self::ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(Self::REFRESH_TTL_DAYS),
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so two tokens issued in the same second differ.
    pub jti: Uuid,
}

impl Claims {
    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a 15-minute access token for `user_id`.
pub fn issue_access_token(config: &JwtConfig, user_id: Uuid) -> Result<IssuedToken, TokenError> {
    issue_token_at(config, TokenKind::Access, user_id, Utc::now())
}

/// Issue a 7-day refresh token for `user_id`.
pub fn issue_refresh_token(config: &JwtConfig, user_id: Uuid) -> Result<IssuedToken, TokenError> {
    issue_token_at(config, TokenKind::Refresh, user_id, Utc::now())
}

fn issue_token_at(
    config: &JwtConfig,
    kind: TokenKind,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<IssuedToken, TokenError> {
    let expires_at = now + config.ttl(kind);
    let claims = Claims {
        user_id,
        kind,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4(),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret(kind)),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

/// Verify an access token and return its claims.
pub fn verify_access_token(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    verify_token(config, TokenKind::Access, token)
}

/// Verify a refresh token's signature and expiry and return its claims.
///
/// This does not consult the database; callers must also check that the
/// token is still stored.
pub fn verify_refresh_token(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    verify_token(config, TokenKind::Refresh, token)
}

fn verify_token(config: &JwtConfig, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret(kind)),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    if data.claims.kind != kind {
        return Err(TokenError::WrongKind {
            expected: kind,
            actual: data.claims.kind,
        });
    }
    Ok(data.claims)
}

/// SHA-256 of a refresh token, hex-encoded. This is the stored form.
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
