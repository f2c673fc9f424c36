//! Request handlers for the dashboard and fetcher endpoints.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use super::templates;
use super::AppState;
use crate::models::{InsightOutcome, PerformanceReport, ScoreSeries};
use crate::repository::StoreError;
use crate::services::insight::parse_body;
use crate::services::{InsightRequestError, PerformanceError, ScoreScale};

/// JSON error body: `{message, detail}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            message,
            detail: detail.into(),
        }
    }

    fn missing_url() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Missing url parameter",
            "the `url` query parameter is required",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"message": self.message, "detail": self.detail})),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "Storage read failed");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read insights",
            e.to_string(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::new(e.status(), "Invalid query string", e.body_text())
    }
}

impl From<InsightRequestError> for ApiError {
    fn from(e: InsightRequestError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "Failed to process request", e.to_string())
    }
}

impl From<PerformanceError> for ApiError {
    fn from(e: PerformanceError) -> Self {
        let status = match e {
            PerformanceError::InvalidUrl => StatusCode::BAD_REQUEST,
            PerformanceError::PageSpeed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, "Failed to fetch PageSpeed Insights", e.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
    /// `fraction` for raw scores; anything else means percent.
    pub scale: Option<String>,
}

impl UrlParams {
    fn required_url(&self) -> Result<&str, ApiError> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(ApiError::missing_url)
    }

    fn scale(&self) -> ScoreScale {
        match self.scale.as_deref() {
            Some("fraction") => ScoreScale::Fraction,
            _ => ScoreScale::Percent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UrlsResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub results: Vec<InsightOutcome>,
}

/// GET / - URL listing with chart.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    info!("Rendering index");
    let urls = state.dashboard.list_urls().await?;
    Ok(Html(templates::index_page(&urls)))
}

/// GET /urls - distinct URLs, sorted.
pub async fn list_urls(State(state): State<AppState>) -> Result<Json<UrlsResponse>, ApiError> {
    info!("Listing URLs");
    let urls = state.dashboard.list_urls().await?;
    Ok(Json(UrlsResponse { urls }))
}

/// GET /data?url= - mobile and desktop series, oldest first.
pub async fn url_data(
    State(state): State<AppState>,
    query: Result<Query<UrlParams>, QueryRejection>,
) -> Result<Json<ScoreSeries>, ApiError> {
    let Query(params) = query?;
    let url = params.required_url()?;
    info!(url = %url, "Fetching score series");
    let series = state.dashboard.series(url, params.scale()).await?;
    Ok(Json(series))
}

/// GET /url?url= - record table for one URL, newest first.
pub async fn url_details(
    State(state): State<AppState>,
    query: Result<Query<UrlParams>, QueryRejection>,
) -> Result<Html<String>, ApiError> {
    let Query(params) = query?;
    let url = params.required_url()?;
    info!(url = %url, "Rendering details");
    let records = state.dashboard.records(url).await?;
    Ok(Html(templates::url_detail_page(url, &records)))
}

/// POST /insights - analyse `{urls: [...]}` and record the outcomes.
pub async fn run_insights(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InsightsResponse>, ApiError> {
    info!(bytes = body.len(), "Received insight request");
    let urls = parse_body(&body)?;
    let results = state.insights.process(&urls).await?;
    Ok(Json(InsightsResponse { results }))
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub url: Option<String>,
}

/// GET /run?url= - mobile and desktop PageSpeed report.
pub async fn run_performance(
    State(state): State<AppState>,
    query: Result<Query<RunParams>, QueryRejection>,
) -> Result<Json<PerformanceReport>, ApiError> {
    let Query(params) = query?;
    info!(url = ?params.url, "Received performance request");
    let report = state.performance.report(params.url.as_deref()).await?;
    Ok(Json(report))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// GET /static/style.css
pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], templates::CSS)
}
