//! `/users/*` handlers. Responses use the `{success, data, error}` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tripweaver_core::users::{self, TokenPair};

use super::auth::AuthUser;
use super::{AppError, AppState, Envelope, EnvelopeError, MessageBody};

type EnvelopeResult<T> = Result<(StatusCode, Json<Envelope<T>>), EnvelopeError>;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenBody {
    pub access_token: String,
}

fn ok<T: Serialize>(status: StatusCode, data: T) -> EnvelopeResult<T> {
    Ok((status, Json(Envelope::ok(data))))
}

fn require_refresh_token(body: &RefreshRequest) -> Result<(), EnvelopeError> {
    if body.refresh_token.trim().is_empty() {
        return Err(AppError::bad_request("refreshToken is required").into());
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> EnvelopeResult<MessageBody> {
    let Json(body) = payload?;
    users::register(&state.pool, &body.email, &body.username, &body.password).await?;
    ok(StatusCode::CREATED, MessageBody::new("User registered successfully"))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> EnvelopeResult<TokenPair> {
    let Json(body) = payload?;
    let tokens = users::login(&state.pool, &state.jwt, &body.email, &body.password).await?;
    ok(StatusCode::OK, tokens)
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> EnvelopeResult<AccessTokenBody> {
    let Json(body) = payload?;
    require_refresh_token(&body)?;
    let access_token = users::refresh(&state.pool, &state.jwt, &body.refresh_token).await?;
    ok(StatusCode::OK, AccessTokenBody { access_token })
}

pub async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> EnvelopeResult<MessageBody> {
    let Json(body) = payload?;
    require_refresh_token(&body)?;
    users::logout(&state.pool, &body.refresh_token).await?;
    ok(StatusCode::OK, MessageBody::new("Logged out successfully"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthUser(acting)): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> EnvelopeResult<MessageBody> {
    // A malformed id cannot name an existing user.
    let target =
        Uuid::parse_str(&user_id).map_err(|_| AppError::not_found("User not found"))?;
    users::delete_user(&state.pool, acting, target).await?;
    ok(StatusCode::OK, MessageBody::new("User deleted successfully"))
}
