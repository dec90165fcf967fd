//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Insert a new user.
///
/// Returns `None` when the email is already registered.
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, username, password_hash) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO NOTHING \
         RETURNING *",
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .context("failed to insert user")?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by email address (exact match).
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Delete a user and everything that only they own.
///
/// Refresh tokens and trip participations cascade. Trips left without any
/// participant are deleted in the same transaction. Returns `false` if the
/// user did not exist.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let trip_ids: Vec<(Uuid,)> =
        sqlx::query_as("SELECT trip_id FROM trip_participants WHERE user_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .context("failed to list trips of user")?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("failed to delete user")?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    let trip_ids: Vec<Uuid> = trip_ids.into_iter().map(|(trip_id,)| trip_id).collect();
    if !trip_ids.is_empty() {
        let orphaned = sqlx::query(
            "DELETE FROM trips t \
             WHERE t.id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM trip_participants p WHERE p.trip_id = t.id)",
        )
        .bind(&trip_ids)
        .execute(&mut *tx)
        .await
        .context("failed to delete orphaned trips")?;

        tracing::debug!(
            user_id = %id,
            trips = orphaned.rows_affected(),
            "deleted trips left without participants"
        );
    }

    tx.commit().await.context("failed to commit transaction")?;

    Ok(true)
}
