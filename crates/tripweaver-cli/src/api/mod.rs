//! HTTP handlers and the types they share.

pub mod auth;
pub mod legacy;
pub mod trips;
pub mod users;

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::PgPool;

use tripweaver_core::auth::JwtConfig;
use tripweaver_core::generate::TripGenerator;
use tripweaver_core::trips::TripServiceError;
use tripweaver_core::users::UserServiceError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt: Arc<JwtConfig>,
    pub generator: Arc<TripGenerator>,
    /// Password for the legacy Basic-auth route; the route is absent when unset.
    pub api_password: Option<Arc<str>>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    /// Log the cause and hide it from the client.
    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidInput(_) => Self::bad_request(err.to_string()),
            UserServiceError::EmailTaken => Self::conflict(err.to_string()),
            UserServiceError::InvalidCredentials | UserServiceError::InvalidRefreshToken => {
                Self::unauthorized(err.to_string())
            }
            UserServiceError::Forbidden => Self::forbidden(err.to_string()),
            UserServiceError::NotFound => Self::not_found(err.to_string()),
            UserServiceError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<TripServiceError> for AppError {
    fn from(err: TripServiceError) -> Self {
        match err {
            TripServiceError::InvalidInput(_) => Self::bad_request(err.to_string()),
            TripServiceError::NotFound | TripServiceError::UserNotFound => {
                Self::not_found(err.to_string())
            }
            TripServiceError::Internal(e) => Self::internal(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope used by the user routes
// ---------------------------------------------------------------------------

/// `{ "success": bool, "data": T | null, "error": string | null }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// An [`AppError`] rendered inside the envelope instead of as `{ "error" }`.
#[derive(Debug)]
pub struct EnvelopeError(pub AppError);

impl From<AppError> for EnvelopeError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<UserServiceError> for EnvelopeError {
    fn from(err: UserServiceError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for EnvelopeError {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection.into())
    }
}

impl IntoResponse for EnvelopeError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            success: false,
            data: None,
            error: Some(self.0.message),
        };
        (self.0.status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn app_error_body() {
        let resp = AppError::not_found("Trip not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, serde_json::json!({"error": "Trip not found"}));
    }

    #[tokio::test]
    async fn envelope_error_body() {
        let resp = EnvelopeError::from(UserServiceError::InvalidCredentials).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"success": false, "data": null, "error": "Invalid credentials"})
        );
    }

    #[tokio::test]
    async fn internal_errors_are_opaque() {
        let err = AppError::from(UserServiceError::Internal(anyhow::anyhow!("db is on fire")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn service_error_statuses() {
        assert_eq!(AppError::from(UserServiceError::EmailTaken).status, StatusCode::CONFLICT);
        assert_eq!(AppError::from(UserServiceError::Forbidden).status, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(TripServiceError::UserNotFound).message,
            "User not found"
        );
        assert_eq!(
            AppError::from(TripServiceError::InvalidInput("bad".into())).status,
            StatusCode::BAD_REQUEST
        );
    }
}
