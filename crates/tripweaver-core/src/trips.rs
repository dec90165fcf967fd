//! Saved trips.
//!
//! Every operation is scoped to the calling user: a trip the caller does not
//! take part in behaves exactly like a trip that does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use tripweaver_db::models::{Event, Participant, Trip, TripDay};
use tripweaver_db::queries::{trips as trip_queries, users as user_queries};

use crate::itinerary::{ItineraryError, TripDayDraft, as_new_days, validate_days};

#[derive(Debug, thiserror::Error)]
pub enum TripServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Trip not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ItineraryError> for TripServiceError {
    fn from(err: ItineraryError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// A new trip as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub start_date: DateTime<Utc>,
    pub days: Vec<TripDayDraft>,
}

/// Fields to change on an existing trip. `days` replaces every day.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub days: Option<Vec<TripDayDraft>>,
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.days.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDayView {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub position: i32,
    pub events: Vec<Event>,
}

/// A trip with its days, events and participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub days: Vec<TripDayView>,
    pub participants: Vec<Participant>,
}

impl TripView {
    /// Nest `events` under their days. Both inputs are expected in position
    /// order; events keep their relative order.
    fn assemble(
        trip: Trip,
        days: Vec<TripDay>,
        events: Vec<Event>,
        participants: Vec<Participant>,
    ) -> Self {
        let mut days: Vec<TripDayView> = days
            .into_iter()
            .map(|day| TripDayView {
                id: day.id,
                trip_id: day.trip_id,
                position: day.position,
                events: Vec::new(),
            })
            .collect();

        for event in events {
            if let Some(day) = days.iter_mut().find(|d| d.id == event.trip_day_id) {
                day.events.push(event);
            }
        }

        Self {
            id: trip.id,
            start_date: trip.start_date,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
            days,
            participants,
        }
    }
}

async fn load_view(pool: &PgPool, trip: Trip) -> anyhow::Result<TripView> {
    let days = trip_queries::get_trip_days(pool, trip.id).await?;
    let events = trip_queries::get_trip_events(pool, trip.id).await?;
    let participants = trip_queries::get_trip_participants(pool, trip.id).await?;
    Ok(TripView::assemble(trip, days, events, participants))
}

async fn require_participant(
    pool: &PgPool,
    user_id: Uuid,
    trip_id: Uuid,
) -> Result<(), TripServiceError> {
    if trip_queries::is_participant(pool, trip_id, user_id).await? {
        Ok(())
    } else {
        Err(TripServiceError::NotFound)
    }
}

/// Store a trip with the caller as its first participant.
pub async fn save_trip(
    pool: &PgPool,
    user_id: Uuid,
    draft: &TripDraft,
) -> Result<TripView, TripServiceError> {
    validate_days(&draft.days)?;

    if user_queries::get_user(pool, user_id).await?.is_none() {
        return Err(TripServiceError::UserNotFound);
    }

    let trip = trip_queries::insert_trip_with_days(
        pool,
        user_id,
        draft.start_date,
        &as_new_days(&draft.days),
    )
    .await?;

    tracing::info!(trip_id = %trip.id, %user_id, days = draft.days.len(), "saved trip");
    Ok(load_view(pool, trip).await?)
}

pub async fn get_trip(
    pool: &PgPool,
    user_id: Uuid,
    trip_id: Uuid,
) -> Result<TripView, TripServiceError> {
    require_participant(pool, user_id, trip_id).await?;
    let trip = trip_queries::get_trip(pool, trip_id)
        .await?
        .ok_or(TripServiceError::NotFound)?;
    Ok(load_view(pool, trip).await?)
}

/// Every trip the user takes part in, earliest start first.
pub async fn list_trips(pool: &PgPool, user_id: Uuid) -> Result<Vec<TripView>, TripServiceError> {
    let trips = trip_queries::list_trips_for_user(pool, user_id).await?;
    let mut views = Vec::with_capacity(trips.len());
    for trip in trips {
        views.push(load_view(pool, trip).await?);
    }
    Ok(views)
}

pub async fn update_trip(
    pool: &PgPool,
    user_id: Uuid,
    trip_id: Uuid,
    update: &TripUpdate,
) -> Result<TripView, TripServiceError> {
    if update.is_empty() {
        return Err(TripServiceError::InvalidInput(
            "Nothing to update: provide startDate or days".to_string(),
        ));
    }
    if let Some(days) = &update.days {
        validate_days(days)?;
    }

    require_participant(pool, user_id, trip_id).await?;

    let new_days = update.days.as_deref().map(as_new_days);
    let trip = trip_queries::update_trip(pool, trip_id, update.start_date, new_days.as_deref())
        .await?
        .ok_or(TripServiceError::NotFound)?;

    tracing::info!(%trip_id, %user_id, "updated trip");
    Ok(load_view(pool, trip).await?)
}

pub async fn delete_trip(
    pool: &PgPool,
    user_id: Uuid,
    trip_id: Uuid,
) -> Result<(), TripServiceError> {
    require_participant(pool, user_id, trip_id).await?;
    if !trip_queries::delete_trip(pool, trip_id).await? {
        return Err(TripServiceError::NotFound);
    }
    tracing::info!(%trip_id, %user_id, "deleted trip");
    Ok(())
}
