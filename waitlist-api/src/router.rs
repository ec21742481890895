use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    config::{ApplicationSettings, RateLimitSettings},
    routes::{self, users::RateLimitError},
};

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error("invalid CORS origin '{0}'")]
    InvalidOrigin(String),
}

pub fn create(
    app_state: AppState,
    application: &ApplicationSettings,
    rate_limit: &RateLimitSettings,
) -> Result<Router<()>, RouterError> {
    let app = Router::new()
        .route("/ping", get(ping))
        .merge(routes::users::router(rate_limit)?);

    let cors = cors_layer(&application.allowed_origins)?;

    Ok(app
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default())))
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, RouterError> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| RouterError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
        .allow_origin(AllowOrigin::list(origins)))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{auth::AdminToken, repositories::MockUserRepository};

    const ORIGIN: &str = "https://dorado-waitlist.vercel.app";

    fn app() -> Router {
        let state = AppState::new(MockUserRepository::new(), AdminToken::new("token"));
        let application = ApplicationSettings {
            port: 8080,
            host: "127.0.0.1".to_string(),
            allowed_origins: vec![ORIGIN.to_string()],
        };
        let rate_limit = RateLimitSettings {
            requests_per_minute: 10,
            burst_size: 10,
        };

        create(state, &application, &rate_limit).unwrap()
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let response = app()
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "pong");
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/users")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "43200");
    }

    #[tokio::test]
    async fn other_origins_get_no_cors_headers() {
        let request = Request::get("/ping")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn invalid_origin_is_a_configuration_error() {
        let state = AppState::new(MockUserRepository::new(), AdminToken::new("token"));
        let application = ApplicationSettings {
            port: 8080,
            host: "127.0.0.1".to_string(),
            allowed_origins: vec!["bad\norigin".to_string()],
        };
        let rate_limit = RateLimitSettings {
            requests_per_minute: 10,
            burst_size: 10,
        };

        let result = create(state, &application, &rate_limit);
        assert!(matches!(result, Err(RouterError::InvalidOrigin(_))));
    }

    #[tokio::test]
    async fn zero_burst_is_a_configuration_error() {
        let state = AppState::new(MockUserRepository::new(), AdminToken::new("token"));
        let application = ApplicationSettings {
            port: 8080,
            host: "127.0.0.1".to_string(),
            allowed_origins: vec![ORIGIN.to_string()],
        };
        let rate_limit = RateLimitSettings {
            requests_per_minute: 10,
            burst_size: 0,
        };

        let result = create(state, &application, &rate_limit);
        assert!(matches!(result, Err(RouterError::RateLimit(_))));
    }
}
