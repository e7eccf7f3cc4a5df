//! Shared-secret bearer authentication for intake routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use drapely_core::error::CoreError;
use drapely_core::hashing::sha256_hex;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the configured API key.
///
/// When no `API_KEY` is configured every request passes; the server logs a
/// warning about that once at startup.
///
/// ```ignore
/// async fn submit(_auth: ApiKeyAuth, Json(body): Json<Body>) -> AppResult<..> { .. }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiKeyAuth;

impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.tryon_config.api_key.as_deref() else {
            return Ok(ApiKeyAuth);
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        if !keys_match(token, expected) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid API key".into(),
            )));
        }

        Ok(ApiKeyAuth)
    }
}

/// Compare two keys without an early exit on the first differing byte.
///
/// Both sides are hashed first so the comparison length is fixed.
pub fn keys_match(presented: &str, expected: &str) -> bool {
    let a = sha256_hex(presented.as_bytes());
    let b = sha256_hex(expected.as_bytes());
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
