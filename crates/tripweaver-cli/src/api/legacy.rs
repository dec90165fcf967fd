//! `POST /generate_trip`, guarded by HTTP Basic auth with the shared API
//! password. Answers with the bare day array.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use tripweaver_core::auth::guard;
use tripweaver_core::generate::GenerateError;
use tripweaver_core::itinerary::{ItineraryRequest, TripDayDraft};

use super::{AppError, AppState};

pub const BASIC_REALM: &str = "Basic realm=\"tripweaver\"";

pub async fn require_api_password(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_password.as_deref() else {
        return AppError::not_found("Not found").into_response();
    };
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match guard::require_api_password(expected, header_value) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            let mut resp = AppError::unauthorized(e.to_string()).into_response();
            resp.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_REALM));
            resp
        }
    }
}

pub async fn generate_trip(
    State(state): State<AppState>,
    payload: Result<Json<ItineraryRequest>, JsonRejection>,
) -> Result<Json<Vec<TripDayDraft>>, AppError> {
    let Json(request) = payload?;
    match state.generator.generate(&request).await {
        Ok(days) => Ok(Json(days)),
        Err(GenerateError::InvalidRequest(e)) => Err(AppError::bad_request(e.to_string())),
        Err(e) => {
            tracing::error!(error = %e, "legacy trip generation failed");
            Err(AppError::new(
                StatusCode::BAD_GATEWAY,
                "Failed to generate trip",
            ))
        }
    }
}
