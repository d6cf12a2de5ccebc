//! Rate limiting middleware
//!
//! Fixed-window admission gate keyed by client IP, checked before the relay
//! does any upstream work.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::state::AppState;

/// Denial message sent to the client as a structured JSON body.
const LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// One client's current window.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window rate limiter state
#[derive(Debug)]
pub struct RateLimiter {
    /// Per-IP windows
    windows: RwLock<HashMap<IpAddr, Window>>,
    /// Requests allowed per window
    max_requests: u32,
    /// Window length
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
        }
    }

    /// Check if a request from this IP is allowed, counting it if so.
    pub fn is_allowed(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write();

        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        // Expired window: start a fresh one
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count < self.max_requests {
            window.count += 1;
            true
        } else {
            false
        }
    }

    /// Drop windows that expired before `now - window`.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
    }

    /// Number of tracked client windows.
    pub fn tracked_clients(&self) -> usize {
        self.windows.read().len()
    }
}

/// Rate limiting middleware for the relay endpoint.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    if !state.limiter.is_allowed(ip) {
        state.metrics.record_rate_limited();
        tracing::warn!("Rate limit exceeded for {}", ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "status": "error",
                "message": LIMIT_MESSAGE,
            })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Client IP from the connection info, port discarded so that parallel
/// connections from one host share a window.
fn client_ip(request: &Request<Body>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
