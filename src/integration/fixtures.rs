//! Mock upstream origin for relay tests

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Synthetic 1000-byte media payload with recognizable content.
pub fn payload() -> Bytes {
    let mut data = Vec::with_capacity(1000);
    for i in 0..1000u32 {
        data.push((i % 251) as u8);
    }
    Bytes::from(data)
}

/// Counters the mock origin updates as it serves traffic.
#[derive(Default)]
struct UpstreamState {
    requests: AtomicUsize,
    disconnects: AtomicUsize,
    bytes_sent: AtomicUsize,
}

/// A mock upstream origin counting the traffic it serves.
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<UpstreamState>,
}

impl MockUpstream {
    /// Bind on an ephemeral port and serve the mock routes.
    pub async fn spawn() -> Self {
        let state = Arc::new(UpstreamState::default());

        let app = Router::new()
            .route("/ok", get(serve_full))
            .route("/untyped", get(serve_untyped))
            .route("/range", get(serve_range))
            .route("/endless", get(serve_endless))
            .route("/redirect-absolute", get(redirect_absolute))
            .route("/redirect-relative", get(redirect_relative))
            .route("/loop", get(redirect_loop))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests the upstream has seen so far.
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Number of response bodies dropped before completion.
    pub fn disconnect_count(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    /// Body bytes handed to the server so far.
    pub fn bytes_sent(&self) -> usize {
        self.state.bytes_sent.load(Ordering::SeqCst)
    }
}

async fn serve_full(State(state): State<Arc<UpstreamState>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/webm")
        .header(header::CONTENT_LENGTH, "1000")
        .body(Body::from(payload()))
        .unwrap()
}

/// Full body with no Content-Type, to exercise the relay's default.
async fn serve_untyped(State(state): State<Arc<UpstreamState>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    Response::builder()
        .status(StatusCode::OK)
        .body(Body::from(payload()))
        .unwrap()
}

/// Partial-content endpoint honoring `Range: bytes=start-end`.
async fn serve_range(State(state): State<Arc<UpstreamState>>, headers: HeaderMap) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range);

    match range {
        Some((start, end)) if end < 1000 => {
            let body = payload().slice(start..=end);
            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, "video/mp4")
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/1000", start, end),
                )
                .header(header::CONTENT_LENGTH, body.len().to_string())
                .body(Body::from(body))
                .unwrap()
        }
        _ => serve_full(State(state)).await,
    }
}

fn parse_range(value: &str) -> Option<(usize, usize)> {
    let range_spec = value.strip_prefix("bytes=")?;
    let (start, end) = range_spec.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// Fires when the server drops an unfinished body stream, which is how a
/// downstream disconnect shows up on this side of the connection.
struct StreamSensor {
    state: Arc<UpstreamState>,
}

impl Drop for StreamSensor {
    fn drop(&mut self) {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Never-ending body, produced in 64 KiB chunks for as long as the
/// connection stays open. Chunks are counted as they are handed to the
/// server, so production stays observable.
async fn serve_endless(State(state): State<Arc<UpstreamState>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    static CHUNK: [u8; 65536] = [0; 65536];
    let sensor = StreamSensor {
        state: state.clone(),
    };
    let stream = futures_util::stream::unfold(sensor, |sensor| async move {
        sensor.state.bytes_sent.fetch_add(CHUNK.len(), Ordering::SeqCst);
        Some((Ok::<_, std::io::Error>(Bytes::from_static(&CHUNK)), sensor))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .body(Body::from_stream(stream))
        .unwrap()
}

async fn redirect_absolute(
    State(state): State<Arc<UpstreamState>>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    // Host header tells us our own address for an absolute Location
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("http://{}/ok", host))],
    )
        .into_response()
}

async fn redirect_relative(State(state): State<Arc<UpstreamState>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FOUND, [(header::LOCATION, "/ok")]).into_response()
}

async fn redirect_loop(State(state): State<Arc<UpstreamState>>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FOUND, [(header::LOCATION, "/loop")]).into_response()
}
