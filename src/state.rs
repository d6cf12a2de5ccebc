//! Application state management
//!
//! Holds the immutable catalog snapshot, the shared upstream HTTP client,
//! the rate limiter and the metrics collector. Everything except the
//! limiter and metrics counters is read-only after startup.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::CatalogIndex;
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::limits::RateLimiter;
use crate::metrics::Metrics;

/// Application state shared across all handlers
pub struct AppState {
    /// Immutable catalog snapshot built once at startup
    pub catalog: Arc<CatalogIndex>,

    /// Shared client for upstream requests. Redirects are disabled here;
    /// the relay chases them itself so it can bound the hop count.
    pub http: reqwest::Client,

    /// Admission gate for the relay endpoint
    pub limiter: RateLimiter,

    /// Metrics collector, shared with the relay's body stream
    pub metrics: Arc<Metrics>,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create a new AppState with the given configuration and catalog.
    pub fn new(config: ServerConfig, catalog: CatalogIndex) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.relay.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.relay.idle_read_timeout_secs))
            .build()
            .map_err(|e| ServerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            catalog: Arc::new(catalog),
            http,
            limiter: RateLimiter::new(&config.rate_limit),
            metrics: Arc::new(Metrics::new()),
            config,
        })
    }

    /// Create AppState with default configuration and an empty catalog.
    #[cfg(test)]
    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default(), CatalogIndex::default()).unwrap()
    }
}
