mod competitors;
mod market;
mod monitoring;
mod ranking;
mod reviews;
mod shop;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use salonscope_core::{CompetitorRecord, DataMode, Profile, DEFAULT_SERVICE};
use salonscope_scraper::is_listing_url;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::TtlCache;
use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};
use crate::scheduler::MonitorRegistry;
use crate::sourcing::{Sourced, Sourcing};

/// Monitoring backend selected by the deployment profile.
#[derive(Clone)]
pub enum Monitoring {
    Scheduled(Arc<MonitorRegistry>),
    /// Endpoints answer but nothing is ever scheduled.
    Inert,
}

impl Monitoring {
    fn profile(&self) -> Profile {
        match self {
            Monitoring::Scheduled(_) => Profile::Full,
            Monitoring::Inert => Profile::Lite,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sourcing: Arc<Sourcing>,
    /// Competitor listings keyed by `{area}_{service}`.
    pub competitors: Arc<TtlCache<Sourced<Vec<CompetitorRecord>>>>,
    pub cache_ttl: Duration,
    pub monitoring: Monitoring,
}

impl AppState {
    #[must_use]
    pub fn new(sourcing: Arc<Sourcing>, monitoring: Monitoring, cache_ttl: Duration) -> Self {
        Self {
            sourcing,
            competitors: Arc::new(TtlCache::new()),
            cache_ttl,
            monitoring,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthData {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_tasks: Option<usize>,
    mode: DataMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ServiceIndex {
    name: &'static str,
    version: &'static str,
    mode: DataMode,
    profile: Profile,
    description: &'static str,
    endpoints: &'static [&'static str],
}

const ENDPOINTS: &[&str] = &[
    "POST /api/competitors/track",
    "POST /api/shop/details",
    "POST /api/reviews/fetch",
    "POST /api/ranking/check",
    "POST /api/ranking/bulk-check",
    "POST /api/market/analysis",
    "POST /api/scrape-url",
    "POST /api/monitoring/start",
    "POST /api/monitoring/stop",
    "GET  /api/monitoring/results/{taskId}",
    "GET  /health",
];

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "method_not_allowed" => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Unwraps a JSON body, turning any extractor rejection into a 400.
pub(super) fn parse_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        ApiError::new(request_id, "bad_request", rejection.body_text())
    })
}

/// Non-blank, trimmed value of a required field.
pub(super) fn required<'a>(
    request_id: &str,
    value: Option<&'a str>,
    field: &str,
) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "validation_error",
                format!("{field} is required"),
            )
        })
}

/// Body shared by competitor tracking and market analysis.
#[derive(Debug, Deserialize)]
pub(super) struct AreaRequest {
    area: Option<String>,
    service: Option<String>,
}

impl AreaRequest {
    /// `(area, service)`, with the service falling back to the default
    /// category when absent or blank.
    pub(super) fn validate(&self, request_id: &str) -> Result<(&str, &str), ApiError> {
        let area = required(request_id, self.area.as_deref(), "area")?;
        let service = self
            .service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVICE);
        Ok((area, service))
    }
}

/// Body for the single-URL endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct UrlRequest {
    url: Option<String>,
}

impl UrlRequest {
    pub(super) fn validate(&self, request_id: &str) -> Result<&str, ApiError> {
        let url = required(request_id, self.url.as_deref(), "url")?;
        if !is_listing_url(url) {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "url must point to beauty.hotpepper.jp",
            ));
        }
        Ok(url)
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/competitors/track", post(competitors::track_competitors))
        .route("/api/shop/details", post(shop::get_shop_details))
        .route("/api/scrape-url", post(shop::scrape_url))
        .route("/api/reviews/fetch", post(reviews::fetch_reviews))
        .route("/api/ranking/check", post(ranking::check_ranking))
        .route("/api/ranking/bulk-check", post(ranking::bulk_check_ranking))
        .route("/api/market/analysis", post(market::analyze_market))
        .route("/api/monitoring/start", post(monitoring::start_monitoring))
        .route("/api/monitoring/stop", post(monitoring::stop_monitoring))
        .route(
            "/api/monitoring/results/{task_id}",
            get(monitoring::get_monitoring_results),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthData> {
    let mode = state.sourcing.effective_mode();
    let data = match &state.monitoring {
        Monitoring::Scheduled(registry) => HealthData {
            status: "ok",
            version: None,
            timestamp: Utc::now(),
            active_tasks: Some(registry.active_tasks().await),
            mode,
            message: None,
        },
        Monitoring::Inert => HealthData {
            status: "ok",
            version: Some("lite"),
            timestamp: Utc::now(),
            active_tasks: None,
            mode,
            message: Some("lite profile: monitoring endpoints are inert"),
        },
    };
    Json(data)
}

async fn index(State(state): State<AppState>) -> Json<ServiceIndex> {
    Json(ServiceIndex {
        name: "salonscope",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.sourcing.effective_mode(),
        profile: state.monitoring.profile(),
        description: "Competitor, review, ranking and market data for salon listings",
        endpoints: ENDPOINTS,
    })
}

async fn not_found(Extension(req_id): Extension<RequestId>) -> ApiError {
    ApiError::new(req_id.0, "not_found", "no such endpoint")
}

async fn method_not_allowed(Extension(req_id): Extension<RequestId>) -> ApiError {
    ApiError::new(
        req_id.0,
        "method_not_allowed",
        "method not allowed for this endpoint",
    )
}
