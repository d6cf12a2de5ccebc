//! Axum router configuration

use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::limits::rate_limit_middleware;
use crate::metrics::metrics_handler;
use crate::state::AppState;

use super::handlers::{health_check, list_series, series_detail, version_check};
use super::middleware::request_logger;
use super::relay::relay_handler;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser players send Range headers cross-origin; they must be
    // explicitly allowed for the relay to be usable from the UI.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS, Method::HEAD])
        .allow_headers([
            header::ACCEPT,
            header::RANGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
        ])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
        ])
        .max_age(Duration::from_secs(3600));

    // Static browsing UI at the root
    let ui = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    let mut router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/metrics", get(metrics_handler))
        // Catalog listing API
        .route("/api/series", get(list_series))
        .route("/api/series/{id}", get(series_detail))
        // Video relay, gated by the rate limiter before any upstream work
        .route(
            "/video-proxy",
            get(relay_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            )),
        )
        // Browsing UI
        .fallback_service(ui)
        // Middleware
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        router = router.layer(cors);
    }

    // State
    router.with_state(state)
}
