//! Route configuration and setup.
//!
//! The webhook is served at `/` (the function root) and at
//! [`STORAGE_HOOK_PATH`](crate::constants::STORAGE_HOOK_PATH); health checks live in [health](health).
//! `OPTIONS` on any route is answered by the CORS layer before routing.

mod health;

use crate::constants::{CORS_ALLOWED_HEADERS, MAX_WEBHOOK_BODY_BYTES, STORAGE_HOOK_PATH};
use crate::handlers::storage_event::handle_storage_event;
use crate::state::AppState;
use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use soundcheck_core::Config;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let request_timeout = config.request_timeout();
    tracing::info!(
        request_timeout_secs = request_timeout.as_secs(),
        "Request timeout layer enabled"
    );

    let app = Router::new()
        .route("/", post(handle_storage_event))
        .route(STORAGE_HOOK_PATH, post(handle_storage_event))
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .layer(RequestBodyLimitLayer::new(MAX_WEBHOOK_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let allow_origin: AllowOrigin = if config.cors_origins().iter().any(|o| o == "*") {
        Any.into()
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        origins.into()
    };

    let allow_headers: Vec<HeaderName> = CORS_ALLOWED_HEADERS
        .into_iter()
        .map(HeaderName::from_static)
        .collect();

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(allow_headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with_origins(origins: &str) -> Config {
        let vars = HashMap::from([
            ("DATABASE_URL", "postgresql://localhost/catalog".to_string()),
            ("CORS_ORIGINS", origins.to_string()),
        ]);
        Config::from_source(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_cors_accepts_origin_list() {
        assert!(setup_cors(&config_with_origins("https://app.example.com, https://admin.example.com")).is_ok());
    }

    #[test]
    fn test_cors_rejects_invalid_origin() {
        assert!(setup_cors(&config_with_origins("https://ok.example.com,bad\norigin")).is_err());
    }
}
