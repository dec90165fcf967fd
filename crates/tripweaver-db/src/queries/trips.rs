//! Database query functions for the `trips`, `trip_participants`,
//! `trip_days` and `events` tables.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Event, Participant, Trip, TripDay};

/// Parameters for inserting one event. Days are passed as ordered slices of
/// these; the slice index becomes the stored `position`.
#[derive(Debug, Clone, Copy)]
pub struct NewEvent<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub address: &'a str,
    pub country: &'a str,
    pub city: &'a str,
    pub tickets: &'a str,
}

/// Insert a trip, link `owner` as its first participant, and insert all of
/// its days and events in a single transaction.
pub async fn insert_trip_with_days(
    pool: &PgPool,
    owner: Uuid,
    start_date: DateTime<Utc>,
    days: &[Vec<NewEvent<'_>>],
) -> Result<Trip> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (start_date) VALUES ($1) RETURNING *",
    )
    .bind(start_date)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert trip")?;

    sqlx::query("INSERT INTO trip_participants (trip_id, user_id) VALUES ($1, $2)")
        .bind(trip.id)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .context("failed to link trip participant")?;

    insert_days(&mut *tx, trip.id, days).await?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(trip)
}

async fn insert_days(
    conn: &mut PgConnection,
    trip_id: Uuid,
    days: &[Vec<NewEvent<'_>>],
) -> Result<()> {
    for (day_pos, events) in days.iter().enumerate() {
        let (day_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO trip_days (trip_id, position) VALUES ($1, $2) RETURNING id",
        )
        .bind(trip_id)
        .bind(day_pos as i32)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to insert day {day_pos}"))?;

        for (event_pos, event) in events.iter().enumerate() {
            sqlx::query(
                "INSERT INTO events \
                 (trip_day_id, position, title, description, address, country, city, tickets) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(day_id)
            .bind(event_pos as i32)
            .bind(event.title)
            .bind(event.description)
            .bind(event.address)
            .bind(event.country)
            .bind(event.city)
            .bind(event.tickets)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to insert event {event_pos} of day {day_pos}"))?;
        }
    }
    Ok(())
}

/// Fetch a trip header by ID.
pub async fn get_trip(pool: &PgPool, id: Uuid) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip")?;

    Ok(trip)
}

/// Days of a trip in order.
pub async fn get_trip_days(pool: &PgPool, trip_id: Uuid) -> Result<Vec<TripDay>> {
    let days = sqlx::query_as::<_, TripDay>(
        "SELECT * FROM trip_days WHERE trip_id = $1 ORDER BY position ASC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list trip days")?;

    Ok(days)
}

/// All events of a trip, ordered by day and then by position within the day.
pub async fn get_trip_events(pool: &PgPool, trip_id: Uuid) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT e.* FROM events e \
         JOIN trip_days d ON d.id = e.trip_day_id \
         WHERE d.trip_id = $1 \
         ORDER BY d.position ASC, e.position ASC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list trip events")?;

    Ok(events)
}

/// Users taking part in a trip, in the order they joined.
pub async fn get_trip_participants(pool: &PgPool, trip_id: Uuid) -> Result<Vec<Participant>> {
    let participants = sqlx::query_as::<_, Participant>(
        "SELECT u.id, u.email, u.username FROM trip_participants p \
         JOIN users u ON u.id = p.user_id \
         WHERE p.trip_id = $1 \
         ORDER BY p.joined_at ASC, u.username ASC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list trip participants")?;

    Ok(participants)
}

/// Trips a user takes part in, soonest start first.
pub async fn list_trips_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(
        "SELECT t.* FROM trips t \
         JOIN trip_participants p ON p.trip_id = t.id \
         WHERE p.user_id = $1 \
         ORDER BY t.start_date ASC, t.created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list trips for user")?;

    Ok(trips)
}

/// Whether `user_id` is a participant of `trip_id`.
pub async fn is_participant(pool: &PgPool, trip_id: Uuid, user_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM trip_participants WHERE trip_id = $1 AND user_id = $2)",
    )
    .bind(trip_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("failed to check trip participant")?;

    Ok(exists)
}

/// Apply a partial update to a trip in one transaction.
///
/// `start_date` replaces the start date when given. `days` replaces every
/// day and event of the trip when given. Returns the updated header, or
/// `None` if the trip does not exist.
pub async fn update_trip(
    pool: &PgPool,
    trip_id: Uuid,
    start_date: Option<DateTime<Utc>>,
    days: Option<&[Vec<NewEvent<'_>>]>,
) -> Result<Option<Trip>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let trip = sqlx::query_as::<_, Trip>(
        "UPDATE trips \
         SET start_date = COALESCE($2, start_date), updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(start_date)
    .fetch_optional(&mut *tx)
    .await
    .context("failed to update trip")?;

    let Some(trip) = trip else {
        return Ok(None);
    };

    if let Some(days) = days {
        sqlx::query("DELETE FROM trip_days WHERE trip_id = $1")
            .bind(trip_id)
            .execute(&mut *tx)
            .await
            .context("failed to clear trip days")?;
        insert_days(&mut *tx, trip_id, days).await?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    Ok(Some(trip))
}

/// Delete a trip with its days and events. Returns `false` if no row matched.
pub async fn delete_trip(pool: &PgPool, trip_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(trip_id)
        .execute(pool)
        .await
        .context("failed to delete trip")?;

    Ok(result.rows_affected() > 0)
}
