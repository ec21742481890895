use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{app_state::AppState, routes::ApiError};

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor that only succeeds when the request carries
/// `Authorization: Bearer <token>` matching the configured [`AdminToken`].
///
/// Rejects with 401 Unauthorized otherwise, so handlers taking an `Admin`
/// argument never run for anonymous callers. An empty header counts as
/// missing and the scheme is matched case-sensitively.
///
/// [`AdminToken`]: super::AdminToken
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized("unauthorized: missing authorization header"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(BEARER_PREFIX));

        match token {
            Some(token) if state.admin_token.matches(token) => Ok(Admin),
            _ => {
                tracing::warn!("Rejected admin request with invalid credentials");
                Err(ApiError::unauthorized("unauthorized: invalid password"))
            }
        }
    }
}
