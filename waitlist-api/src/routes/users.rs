use std::{sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::Admin,
    config::RateLimitSettings,
    domain::{CanonicalEmail, StoredUser},
    routes::ApiError,
};

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
#[error("invalid rate limit: requests_per_minute and burst_size must be positive")]
pub struct RateLimitError;

/// Signup and admin listing routes. Only signups are rate limited, keyed on
/// the client IP (forwarding headers first, then the peer address).
pub fn router(rate_limit: &RateLimitSettings) -> Result<Router<AppState>, RateLimitError> {
    if rate_limit.requests_per_minute == 0 {
        return Err(RateLimitError);
    }
    let replenish_ms = (60_000 / rate_limit.requests_per_minute).max(1);

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms)
            .burst_size(rate_limit.burst_size)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or(RateLimitError)?,
    );

    let limiter = governor_config.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            tracing::debug!("Rate limiter tracking {} clients", limiter.len());
        }
    });

    Ok(Router::new()
        .route(
            "/users",
            post(create_user).layer(GovernorLayer {
                config: governor_config,
            }),
        )
        .route("/users", get(list_users)))
}

#[derive(Debug, Deserialize)]
struct SignupBody {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[instrument(name = "POST /users", skip_all)]
async fn create_user(
    State(app_state): State<AppState>,
    body: Result<Json<SignupBody>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body?;

    let email = CanonicalEmail::parse(body.email.as_deref().unwrap_or_default()).map_err(|err| {
        tracing::info!(reason = err.reason(), "Rejected signup");
        err
    })?;

    let user = app_state.user_repo.create_user(&email).await?;
    tracing::info!(user_id = user.id, "User created");

    Ok(Json(MessageResponse {
        message: "user created",
    }))
}

#[instrument(name = "GET /users", skip_all)]
async fn list_users(
    _admin: Admin,
    State(app_state): State<AppState>,
) -> Result<Json<Vec<StoredUser>>, ApiError> {
    let users = app_state.user_repo.list_users().await?;

    Ok(Json(users))
}
