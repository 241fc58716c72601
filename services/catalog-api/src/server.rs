//! HTTP server exposing catalog queries as JSON.
//!
//! Provides endpoints for:
//! - Date range queries by channel
//! - Whole-month listings
//! - Index cache statistics

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use catalog::{CacheStats, CatalogService};
use catalog_common::{CatalogError, Channel, IndexRecord, MonthKey, PixelRange, ValueScale};

// ============================================================================
// Response Types
// ============================================================================

/// One listed image, enough for a front end to render and load it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub display_timestamp: String,
    pub filename: String,
    pub timestamp: String,
    pub covers_north: bool,
    pub covers_south: bool,
    pub range: PixelRange,
    pub scale: ValueScale,
}

impl From<&IndexRecord> for CatalogEntry {
    fn from(record: &IndexRecord) -> Self {
        Self {
            display_timestamp: record.display_timestamp(),
            filename: record.filename().to_string(),
            timestamp: record.timestamp().to_string(),
            covers_north: record.covers_north(),
            covers_south: record.covers_south(),
            range: record.range().clone(),
            scale: record.scale().clone(),
        }
    }
}

pub fn to_entries(records: &[Arc<IndexRecord>]) -> Vec<CatalogEntry> {
    records.iter().map(|r| CatalogEntry::from(r.as_ref())).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub start: String,
    pub end: String,
    pub channel: Channel,
    pub count: usize,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthResponse {
    pub month: MonthKey,
    pub channel: Option<Channel>,
    pub count: usize,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub cached_months: Vec<MonthKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub start: String,
    pub end: String,
    pub channel: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub channel: Option<String>,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub service: Arc<CatalogService>,
}

// ============================================================================
// Router
// ============================================================================

/// Create the catalog API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/months/:month", get(month_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /catalog?start=YYYYMMDD&end=YYYYMMDD&channel=IR1
async fn catalog_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Query(params): Query<CatalogParams>,
) -> Response {
    let channel = match params.channel.parse::<Channel>() {
        Ok(c) => c,
        Err(e) => return bad_request("InvalidChannel", e.to_string()),
    };

    match state
        .service
        .query(&params.start, &params.end, channel)
        .await
    {
        Ok(records) => Json(CatalogResponse {
            start: params.start,
            end: params.end,
            channel,
            count: records.len(),
            entries: to_entries(&records),
        })
        .into_response(),
        Err(e) => catalog_error(e),
    }
}

/// GET /months/{YYYYMM}?channel=VIS
async fn month_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Path(month): Path<String>,
    Query(params): Query<MonthParams>,
) -> Response {
    let month = match month.parse::<MonthKey>() {
        Ok(m) => m,
        Err(e) => return bad_request("InvalidMonth", e.to_string()),
    };
    let channel = match params.channel.as_deref().map(str::parse::<Channel>).transpose() {
        Ok(c) => c,
        Err(e) => return bad_request("InvalidChannel", e.to_string()),
    };

    match state.service.month(month, channel).await {
        Ok(records) => Json(MonthResponse {
            month,
            channel,
            count: records.len(),
            entries: to_entries(&records),
        })
        .into_response(),
        Err(e) => catalog_error(e),
    }
}

/// GET /stats - Index cache statistics
async fn stats_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    let cache = state.service.cache();
    Json(StatsResponse {
        cache: cache.stats().await,
        cached_months: cache.cached_months().await,
    })
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "catalog-api"
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn bad_request(error: &str, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
        .into_response()
}

fn catalog_error(err: CatalogError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %err, "Catalog request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

/// Run the HTTP server.
pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting catalog API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use catalog::{DateRangeValidator, IndexCache, MemoryIndexSource};
    use catalog_common::parse_calendar_date;
    use tower::ServiceExt;

    fn router() -> (Arc<MemoryIndexSource>, Router) {
        let source = Arc::new(MemoryIndexSource::new());
        source.insert(
            "201501".parse().unwrap(),
            "201501010600.IR1.FULL.png\tX\t[0,0,100,100]\t[0,255]\n\
             201501010000.IR1.NORTH.png\tX\t[0,0,100,50]\t[0,255]\n\
             201501010000.VIS.FULL.png\tX\t[0,0,100,100]\t[0,255]\n",
        );
        let service = CatalogService::new(
            Arc::new(IndexCache::new(source.clone())),
            DateRangeValidator::new(parse_calendar_date("20141119").unwrap()),
            2,
        );
        let state = Arc::new(ServerState {
            service: Arc::new(service),
        });
        (source, create_router(state))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_entry_from_record() {
        let record = IndexRecord::new(
            catalog_common::ImageFilename::parse("201601312350.VIS.SOUTH.png").unwrap(),
            PixelRange {
                x1: "0".into(),
                y1: "0".into(),
                x2: "10".into(),
                y2: "10".into(),
            },
            ValueScale {
                min: "0".into(),
                max: "1".into(),
            },
        );
        let entry = CatalogEntry::from(&record);
        assert_eq!(entry.display_timestamp, "2016-01-31T23:50Z");
        assert!(entry.covers_south);
        assert!(!entry.covers_north);
    }

    #[tokio::test]
    async fn test_catalog_endpoint() {
        let (_, app) = router();
        let (status, body) = get(app, "/catalog?start=20150101&end=20150102&channel=ir1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["channel"], "IR1");
        assert_eq!(body["entries"][0]["filename"], "201501010000.IR1.NORTH.png");
        assert_eq!(body["entries"][0]["display_timestamp"], "2015-01-01T00:00Z");
        assert_eq!(body["entries"][1]["filename"], "201501010600.IR1.FULL.png");
    }

    #[tokio::test]
    async fn test_catalog_endpoint_validation_error() {
        let (source, app) = router();
        let (status, body) = get(app, "/catalog?start=20141118&end=20150102&channel=VIS").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "RangeError");
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_catalog_endpoint_bad_channel() {
        let (_, app) = router();
        let (status, body) = get(app, "/catalog?start=20150101&end=20150102&channel=IR9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidChannel");
    }

    #[tokio::test]
    async fn test_month_endpoint() {
        let (_, app) = router();
        let (status, body) = get(app, "/months/201501?channel=VIS").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["month"], "201501");
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_month_endpoint_missing_upstream() {
        let (_, app) = router();
        let (status, body) = get(app, "/months/201502").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "FetchError");
    }

    #[tokio::test]
    async fn test_month_endpoint_outside_archive() {
        let (source, app) = router();
        let (status, body) = get(app.clone(), "/months/201410").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "RangeError");

        let (status, _) = get(app, "/months/999912").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_month_endpoint_bad_month() {
        let (_, app) = router();
        let (status, body) = get(app, "/months/201513").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidMonth");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (_, app) = router();
        let (_, _) = get(app.clone(), "/months/201501").await;
        let (status, body) = get(app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache"]["fetches"], 1);
        assert_eq!(body["cache"]["records"], 3);
        assert_eq!(body["cached_months"][0], "201501");
    }
}
