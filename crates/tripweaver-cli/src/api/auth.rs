//! Bearer-token middleware for the user and trip routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use tripweaver_core::auth::guard;

use super::{AppError, AppState};

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user_id = guard::require_user(&state.jwt, header_value).map_err(|e| {
        tracing::debug!(path = %req.uri().path(), error = ?e, "rejected bearer token");
        AppError::unauthorized(e.to_string())
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
