// ABOUTME: HTTP routes: GET / liveness text and GET /scrape?url=... returning extracted fields.
// ABOUTME: Maps scrape error codes to status codes with a {"error": ...} JSON body.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pricetag_scout::{Client, ErrorCode, ScrapeError};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<Client>,
}

/// Query pairs in request order. Repeated keys are kept; `url` reads the first.
#[derive(Debug, Default)]
pub struct ScrapeQuery {
    pairs: Vec<(String, String)>,
}

impl ScrapeQuery {
    pub fn url(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == "url")
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            status,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid query string")
            .with_detail(rejection.body_text())
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        let detail = err.source.as_ref().map(ToString::to_string);
        let api = match err.code {
            ErrorCode::UnsupportedPlatform => ApiError::new(StatusCode::OK, "Unsupported URL"),
            ErrorCode::InvalidUrl => ApiError::new(StatusCode::BAD_REQUEST, "Invalid URL"),
            ErrorCode::Fetch => ApiError::new(StatusCode::BAD_GATEWAY, "Failed to fetch page"),
            ErrorCode::Timeout => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Timed out fetching page")
            }
            ErrorCode::Extract => {
                tracing::error!(error = %err, "extraction failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Extraction failed")
            }
        };
        match detail {
            Some(detail) => api.with_detail(detail),
            None => api,
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/scrape", get(scrape))
        .layer(build_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    "Scraper API Running"
}

async fn scrape(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(pairs) = query?;
    let query = ScrapeQuery { pairs };
    let Some(url) = query.url().filter(|u| !u.trim().is_empty()) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "URL missing"));
    };

    let result = state.client.scrape(url).await?;
    Ok(Json(result.fields).into_response())
}
