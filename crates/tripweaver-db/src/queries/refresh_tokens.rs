//! Database query functions for the `refresh_tokens` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RefreshToken;

/// Store the hash of a newly issued refresh token.
pub async fn insert_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken> {
    let row = sqlx::query_as::<_, RefreshToken>(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(pool)
    .await
    .context("failed to insert refresh token")?;

    Ok(row)
}

/// Look up a stored refresh token by its hash.
pub async fn get_refresh_token_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>> {
    let row =
        sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(pool)
            .await
            .context("failed to fetch refresh token")?;

    Ok(row)
}

/// Delete a stored refresh token. Returns `false` if no row matched.
pub async fn delete_refresh_token_by_hash(pool: &PgPool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await
        .context("failed to delete refresh token")?;

    Ok(result.rows_affected() > 0)
}

/// Delete every refresh token whose expiry is at or before `now`.
///
/// Returns the number of rows removed.
pub async fn delete_expired_refresh_tokens(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await
        .context("failed to delete expired refresh tokens")?;

    Ok(result.rows_affected())
}

/// Count the refresh tokens stored for a user.
pub async fn count_refresh_tokens_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .context("failed to count refresh tokens")?;

    Ok(count)
}
