//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use passkey_core::RelyingPartyConfig;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::{Config, ConfigError};
use crate::handlers::{health, ready};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::webauthn::{
    finish_authentication, finish_registration, start_authentication, start_registration,
};

/// Create the application router with default config and in-memory storage (for testing)
pub fn create_router(rp_config: RelyingPartyConfig) -> Router {
    base_router(&Config::default(), AppState::in_memory(rp_config))
        .layer(TraceLayer::new_for_http())
}

/// GET /api-docs/openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router with custom configuration
///
/// Fails when rate limiting is enabled with settings the limiter rejects.
pub fn create_router_with_config(config: &Config, state: AppState) -> Result<Router, ConfigError> {
    let router = base_router(config, state);

    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting: DISABLED");
        return Ok(router.layer(TraceLayer::new_for_http()));
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(config.rate_limit_per_sec)
        .burst_size(config.rate_limit_burst)
        .finish()
        .ok_or(ConfigError::RateLimit {
            per_sec: config.rate_limit_per_sec,
            burst: config.rate_limit_burst,
        })?;

    tracing::info!(
        "Rate limiting: {} req/s (burst: {})",
        config.rate_limit_per_sec,
        config.rate_limit_burst
    );
    Ok(router
        .layer(GovernorLayer::new(Arc::new(governor_conf)))
        .layer(TraceLayer::new_for_http()))
}

fn base_router(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // Request body limit
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_kb * 1024);

    // Request timeout
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    Router::new()
        .route("/webauthn/register/start", post(start_registration))
        .route("/webauthn/register/finish", post(finish_registration))
        .route("/webauthn/authenticate/start", post(start_authentication))
        .route("/webauthn/authenticate/finish", post(finish_authentication))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api-docs/openapi.json", get(openapi_json))
        .with_state(state)
        .layer(cors)
        .layer(body_limit)
        .layer(timeout)
}
