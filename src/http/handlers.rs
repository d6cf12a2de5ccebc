//! Catalog API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{Series, SeriesSummary};
use crate::state::AppState;

/// Custom error response for catalog operations
#[derive(Debug)]
pub enum HttpError {
    SeriesNotFound(String),
    InvalidQuery(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::SeriesNotFound(m) => (StatusCode::NOT_FOUND, m),
            HttpError::InvalidQuery(m) => (StatusCode::BAD_REQUEST, m),
        };

        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Version information endpoint
pub async fn version_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "series_count": state.catalog.len(),
    }))
}

/// Query parameters for series listing
#[derive(Debug, Deserialize)]
pub struct SeriesListQuery {
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size (capped at 100)
    pub per_page: Option<usize>,
    /// Case-insensitive title filter
    pub q: Option<String>,
}

/// Paginated series listing response
#[derive(Debug, Serialize)]
pub struct SeriesListResponse {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub items: Vec<SeriesSummary>,
}

/// List series with optional search and pagination
/// GET /api/series?page=&per_page=&q=
pub async fn list_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesListQuery>,
) -> Result<Json<SeriesListResponse>, HttpError> {
    state.metrics.record_request("/api/series");

    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(HttpError::InvalidQuery("page is 1-based".to_string()));
    }
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let matches = state.catalog.search(query.q.as_deref());
    let total = matches.len();
    let total_pages = total.div_ceil(per_page);

    // Saturating: page is client-supplied and may be arbitrarily large
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    let items = matches.into_iter().skip(offset).take(per_page).collect();

    Ok(Json(SeriesListResponse {
        page,
        per_page,
        total,
        total_pages,
        items,
    }))
}

/// Full series detail with seasons and episodes
/// GET /api/series/{id}
pub async fn series_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Series>, HttpError> {
    state.metrics.record_request("/api/series/{id}");

    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| HttpError::SeriesNotFound(format!("Unknown series: {}", id)))
}
