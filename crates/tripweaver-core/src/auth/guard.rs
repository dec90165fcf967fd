//! Request guards: bearer access tokens for user routes, and the shared API
//! password (HTTP Basic) for the legacy generation route.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{JwtConfig, TokenError, verify_access_token};

/// Errors from guard checks. Their messages are the ones sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken(#[source] TokenError),

    #[error("Access denied")]
    AccessDenied,
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for any other
/// scheme or an empty token.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticate a request from its `Authorization` header, returning the
/// user the access token was issued to.
pub fn require_user(config: &JwtConfig, header_value: Option<&str>) -> Result<Uuid, GuardError> {
    let header_value = header_value.ok_or(GuardError::MissingToken)?;
    let token = parse_bearer(header_value).ok_or(GuardError::MissingToken)?;
    let claims = verify_access_token(config, token).map_err(GuardError::InvalidToken)?;
    Ok(claims.user_id)
}

/// Decode an `Authorization: Basic <base64>` header into `(user, password)`.
pub fn parse_basic(header_value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Check HTTP Basic credentials against the shared API password.
///
/// The user name is ignored; only the password has to match.
pub fn require_api_password(expected: &str, header_value: Option<&str>) -> Result<(), GuardError> {
    let (_, pass) = header_value
        .and_then(parse_basic)
        .ok_or(GuardError::AccessDenied)?;
    if constant_time_eq(pass.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(GuardError::AccessDenied)
    }
}

fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        // Keep the timing of a length mismatch close to a full compare.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}
