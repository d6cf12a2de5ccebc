//! Streaming video relay
//!
//! Transparent same-origin forwarder for range-based media playback.
//! Inbound `/video-proxy?url=...` requests are re-issued upstream with the
//! client's `Range` header, redirects are chased hop by hop (bounded), and
//! the terminal response body is streamed back without buffering.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::metrics::Metrics;
use crate::state::AppState;

/// Fallback when upstream omits Content-Type. Preserved from the original
/// behavior; the relay never sniffs type from the path.
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Relay error taxonomy. Upstream detail is logged, never sent to the
/// client: bodies stay empty so the contract is uniform.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing, empty, malformed or non-http(s) target URL.
    #[error("invalid or missing target URL")]
    InvalidRequest,

    /// Hop cap reached; the upstream is looping or misbehaving.
    #[error("redirect limit of {0} hop(s) exceeded")]
    TooManyRedirects(usize),

    /// Upstream sent a redirect with an unusable Location header.
    #[error("upstream sent an unusable redirect location")]
    BadRedirect,

    /// Connect, timeout or transport failure talking to the origin.
    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),
}

impl RelayError {
    fn metric_label(&self) -> &'static str {
        match self {
            RelayError::InvalidRequest => "invalid_request",
            RelayError::TooManyRedirects(_) => "too_many_redirects",
            RelayError::BadRedirect => "bad_redirect",
            RelayError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::InvalidRequest => StatusCode::BAD_REQUEST,
            RelayError::TooManyRedirects(_)
            | RelayError::BadRedirect
            | RelayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        status.into_response()
    }
}

/// Query parameters for the relay endpoint.
#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    /// Percent-encoded absolute target URL. Axum decodes it once.
    pub url: Option<String>,
}

/// Handle `GET /video-proxy?url=...`.
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RelayQuery>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    state.metrics.record_request("/video-proxy");

    let target = match parse_target(query.url.as_deref()) {
        Ok(url) => url,
        Err(err) => {
            state.metrics.record_error(err.metric_label());
            tracing::debug!("Rejected relay request: {:?}", query.url);
            return Err(err);
        }
    };

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match relay(&state, target.clone(), range.as_deref()).await {
        Ok(response) => Ok(response),
        Err(err) => {
            state.metrics.record_error(err.metric_label());
            tracing::warn!("Relay to {} failed: {}", target, err);
            Err(err)
        }
    }
}

/// Chase the redirect chain and return the terminal streamed response.
///
/// Exactly one upstream connection is active at a time: the previous hop's
/// response is dropped before the next hop's request is sent.
async fn relay(
    state: &AppState,
    mut target: Url,
    range: Option<&str>,
) -> Result<Response, RelayError> {
    let max_hops = state.config.relay.max_redirects;

    for hop in 1..=max_hops {
        let mut request = state
            .http
            .get(target.clone())
            .header(header::USER_AGENT, &state.config.relay.user_agent)
            .header(header::ACCEPT, "*/*")
            // Keep byte ranges and Content-Length exact end-to-end
            .header(header::ACCEPT_ENCODING, "identity");

        if let Some(range) = range {
            request = request.header(header::RANGE, range);
        }

        let upstream = request.send().await?;

        if let Some(location) = redirect_location(upstream.status(), upstream.headers()) {
            drop(upstream);
            target = resolve_location(&target, &location).ok_or(RelayError::BadRedirect)?;
            tracing::debug!("Redirect hop {} -> {}", hop, target);
            continue;
        }

        tracing::debug!(
            "Streaming {} from {} after {} hop(s)",
            upstream.status(),
            target,
            hop
        );
        state.metrics.record_relay(hop);
        return Ok(content_response(upstream, state.metrics.clone()));
    }

    Err(RelayError::TooManyRedirects(max_hops))
}

/// Validate and parse the raw `url` query value.
fn parse_target(raw: Option<&str>) -> Result<Url, RelayError> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or(RelayError::InvalidRequest)?;
    let url = Url::parse(raw).map_err(|_| RelayError::InvalidRequest)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RelayError::InvalidRequest),
    }
}

/// A redirect we chase: 301/302/307/308 carrying a readable Location.
/// Anything else, including a redirect status without Location, is
/// terminal content and is copied through.
fn redirect_location(status: StatusCode, headers: &HeaderMap) -> Option<String> {
    if !is_redirect_status(status) {
        return None;
    }
    headers
        .get(header::LOCATION)?
        .to_str()
        .ok()
        .map(str::to_owned)
}

fn is_redirect_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 307 | 308)
}

/// Resolve a Location value (possibly relative) against the current hop's
/// URL, accepting only http(s) targets.
fn resolve_location(base: &Url, location: &str) -> Option<Url> {
    let resolved = base.join(location).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Build the inbound response for a terminal upstream response: status
/// copied verbatim, media headers passed through, body streamed.
fn content_response(upstream: reqwest::Response, metrics: Arc<Metrics>) -> Response {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let content_length = upstream.headers().get(header::CONTENT_LENGTH).cloned();
    let content_range = upstream.headers().get(header::CONTENT_RANGE).cloned();

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        // Forced so browser players attempt range requests even when the
        // upstream does not advertise support
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    if let Some(range) = content_range {
        builder = builder.header(header::CONTENT_RANGE, range);
    }

    let upstream_url = upstream.url().clone();
    let stream = upstream
        .bytes_stream()
        .inspect_ok(move |chunk| metrics.record_relay_bytes(chunk.len() as u64))
        .map_err(move |e| {
            // Headers are already flushed; a read error here can only cut
            // the body short, never change the status. Log and terminate.
            tracing::warn!("Upstream read error from {}: {}", upstream_url, e);
            std::io::Error::other(e)
        });

    match builder.body(Body::from_stream(stream)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build relay response: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
