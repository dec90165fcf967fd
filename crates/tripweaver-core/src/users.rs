//! User accounts and sessions.
//!
//! A session is a pair of JWTs. The access token is stateless; the refresh
//! token is also recorded (as a SHA-256 hash) so logout can revoke it.

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use tripweaver_db::models::User;
use tripweaver_db::queries::{refresh_tokens as token_queries, users as user_queries};

use crate::auth::{self, JwtConfig};

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Access denied")]
    Forbidden,

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Tokens handed out on login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && domain.split('.').all(|part| !part.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account. The password is stored as an Argon2 hash.
pub async fn register(
    pool: &PgPool,
    email: &str,
    username: &str,
    password: &str,
) -> Result<User, UserServiceError> {
    let email = normalize_email(email);
    let username = username.trim();

    if !is_valid_email(&email) {
        return Err(UserServiceError::InvalidInput("Invalid email address".to_string()));
    }
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(UserServiceError::InvalidInput(format!(
            "Username must be at least {MIN_USERNAME_CHARS} characters long"
        )));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(UserServiceError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters long"
        )));
    }

    let plain = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&plain))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")?;

    let user = user_queries::insert_user(pool, &email, username, &password_hash)
        .await?
        .ok_or(UserServiceError::EmailTaken)?;

    tracing::info!(user_id = %user.id, "registered user");
    Ok(user)
}

/// Check credentials and start a session.
pub async fn login(
    pool: &PgPool,
    jwt: &JwtConfig,
    email: &str,
    password: &str,
) -> Result<TokenPair, UserServiceError> {
    let user = user_queries::get_user_by_email(pool, &normalize_email(email))
        .await?
        .ok_or(UserServiceError::InvalidCredentials)?;

    let plain = password.to_string();
    let phc = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || auth::verify_password(&plain, &phc))
        .await
        .context("password verification task failed")?
        .context("failed to verify password")?;
    if !matches {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(UserServiceError::InvalidCredentials);
    }

    let access = auth::issue_access_token(jwt, user.id).context("failed to issue access token")?;
    let refresh =
        auth::issue_refresh_token(jwt, user.id).context("failed to issue refresh token")?;

    token_queries::insert_refresh_token(
        pool,
        user.id,
        &auth::hash_refresh_token(&refresh.token),
        refresh.expires_at,
    )
    .await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(TokenPair {
        access_token: access.token,
        refresh_token: refresh.token,
    })
}

/// Exchange a live refresh token for a new access token.
pub async fn refresh(
    pool: &PgPool,
    jwt: &JwtConfig,
    refresh_token: &str,
) -> Result<String, UserServiceError> {
    let claims = auth::verify_refresh_token(jwt, refresh_token).map_err(|e| {
        tracing::debug!(error = %e, "refresh token rejected");
        UserServiceError::InvalidRefreshToken
    })?;

    let stored =
        token_queries::get_refresh_token_by_hash(pool, &auth::hash_refresh_token(refresh_token))
            .await?
            .ok_or(UserServiceError::InvalidRefreshToken)?;

    if stored.is_expired_at(Utc::now()) || stored.user_id != claims.user_id {
        return Err(UserServiceError::InvalidRefreshToken);
    }

    let access =
        auth::issue_access_token(jwt, claims.user_id).context("failed to issue access token")?;
    Ok(access.token)
}

/// Revoke a refresh token.
pub async fn logout(pool: &PgPool, refresh_token: &str) -> Result<(), UserServiceError> {
    let deleted =
        token_queries::delete_refresh_token_by_hash(pool, &auth::hash_refresh_token(refresh_token))
            .await?;
    if !deleted {
        return Err(UserServiceError::InvalidRefreshToken);
    }
    Ok(())
}

/// Delete an account. Users may only delete themselves.
pub async fn delete_user(
    pool: &PgPool,
    acting_user: Uuid,
    target_user: Uuid,
) -> Result<(), UserServiceError> {
    if acting_user != target_user {
        return Err(UserServiceError::Forbidden);
    }
    if !user_queries::delete_user(pool, target_user).await? {
        return Err(UserServiceError::NotFound);
    }
    tracing::info!(user_id = %target_user, "deleted user");
    Ok(())
}

/// Remove refresh tokens whose expiry has passed.
pub async fn purge_expired_refresh_tokens(pool: &PgPool) -> anyhow::Result<u64> {
    let purged = token_queries::delete_expired_refresh_tokens(pool, Utc::now()).await?;
    if purged > 0 {
        tracing::info!(purged, "purged expired refresh tokens");
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.co"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email("example.com"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "a", "refreshToken": "r"}));
    }
}
