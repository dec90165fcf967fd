//! `/trips/*` handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tripweaver_core::generate::GenerateError;
use tripweaver_core::itinerary::{ItineraryRequest, TripDayDraft};
use tripweaver_core::trips::{self, TripDraft, TripUpdate, TripView};

use super::auth::AuthUser;
use super::{AppError, AppState, MessageBody};

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub days: Option<Vec<TripDayDraft>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    fn failure(status: StatusCode, error: impl Into<String>) -> Response {
        let body = Self {
            days: None,
            error: Some(error.into()),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveTripRequest {
    pub trip: Option<TripDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    pub updated_trip: Option<TripUpdate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTripResponse {
    pub saved_trip: TripView,
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub trip: TripView,
}

#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub trips: Vec<TripView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTripResponse {
    pub updated_trip: TripView,
}

/// Unknown and malformed ids look the same to the caller.
fn parse_trip_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Trip not found"))
}

pub async fn generate(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<ItineraryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return GenerateResponse::failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    tracing::info!(
        %user_id,
        days = request.number_of_days,
        country = %request.country,
        city = %request.city,
        "generate trip request received"
    );

    match state.generator.generate(&request).await {
        Ok(days) => {
            let body = GenerateResponse {
                days: Some(days),
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(GenerateError::InvalidRequest(e)) => {
            GenerateResponse::failure(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            tracing::error!(%user_id, error = %e, "trip generation failed");
            GenerateResponse::failure(StatusCode::BAD_GATEWAY, "Failed to generate trip")
        }
    }
}

pub async fn save(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<SaveTripRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedTripResponse>), AppError> {
    let Json(body) = payload?;
    let draft = body
        .trip
        .ok_or_else(|| AppError::bad_request("Trip data is required"))?;
    let saved_trip = trips::save_trip(&state.pool, user_id, &draft).await?;
    Ok((StatusCode::CREATED, Json(SavedTripResponse { saved_trip })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<TripsResponse>, AppError> {
    let trips = trips::list_trips(&state.pool, user_id).await?;
    Ok(Json(TripsResponse { trips }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripResponse>, AppError> {
    let trip = trips::get_trip(&state.pool, user_id, parse_trip_id(&trip_id)?).await?;
    Ok(Json(TripResponse { trip }))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(trip_id): Path<String>,
    payload: Result<Json<UpdateTripRequest>, JsonRejection>,
) -> Result<Json<UpdatedTripResponse>, AppError> {
    let trip_id = parse_trip_id(&trip_id)?;
    let Json(body) = payload?;
    let update = body
        .updated_trip
        .ok_or_else(|| AppError::bad_request("Updated trip data is required"))?;
    let updated_trip = trips::update_trip(&state.pool, user_id, trip_id, &update).await?;
    Ok(Json(UpdatedTripResponse { updated_trip }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<MessageBody>, AppError> {
    trips::delete_trip(&state.pool, user_id, parse_trip_id(&trip_id)?).await?;
    Ok(Json(MessageBody::new("Trip deleted successfully")))
}
