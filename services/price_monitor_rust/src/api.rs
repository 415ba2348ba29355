//! HTTP read API over the aggregated prices

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use price_monitor_core::monitoring::{PipelineStats, PipelineStatsSnapshot};
use price_monitor_core::{PriceEvent, PriceHistoryEntry, PriceService, StatEntry};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

pub struct ApiState {
    pub prices: Arc<PriceService>,
    pub pipeline: Arc<PipelineStats>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(prices: Arc<PriceService>, pipeline: Arc<PipelineStats>) -> Self {
        Self {
            prices,
            pipeline,
            started_at: Instant::now(),
        }
    }
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/prices", get(get_prices))
        .route("/stats", get(get_stats))
        .route("/history/:product_name", get(get_history))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub pipeline: PipelineStatsSnapshot,
}

async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        uptime_secs: state.started_at.elapsed().as_secs(),
        pipeline: state.pipeline.snapshot(),
    })
}

async fn get_prices(State(state): State<Arc<ApiState>>) -> Json<HashMap<String, PriceEvent>> {
    Json(state.prices.latest_prices())
}

/// Stored stats plus the derived mean
#[derive(Debug, Serialize)]
pub struct StatsView {
    pub count: u64,
    pub sum: i64,
    pub min: i32,
    pub max: i32,
    pub avg: f64,
}

impl From<StatEntry> for StatsView {
    fn from(entry: StatEntry) -> Self {
        Self {
            count: entry.count,
            sum: entry.sum,
            min: entry.min,
            max: entry.max,
            avg: entry.average(),
        }
    }
}

async fn get_stats(State(state): State<Arc<ApiState>>) -> Json<HashMap<String, StatsView>> {
    let stats = state
        .prices
        .stats()
        .into_iter()
        .map(|(name, entry)| (name, StatsView::from(entry)))
        .collect();
    Json(stats)
}

async fn get_history(
    State(state): State<Arc<ApiState>>,
    Path(product_name): Path<String>,
) -> Result<Json<Vec<PriceHistoryEntry>>, (StatusCode, Json<Value>)> {
    match state.prices.history(&product_name).await {
        Ok(history) => Ok(Json(history)),
        Err(e) => {
            error!("Error getting history for {}: {:#}", product_name, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to retrieve price history" })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use price_monitor_core::db::MemoryPriceStore;
    use tower::ServiceExt;

    async fn seeded() -> (Router, Arc<MemoryPriceStore>) {
        let store = Arc::new(MemoryPriceStore::new());
        let pipeline = Arc::new(PipelineStats::new());
        let prices = Arc::new(PriceService::new(store.clone(), pipeline.clone()));

        for price in [10, 20, 30] {
            prices
                .update_with_price(PriceEvent::new("store1", "apple", price))
                .await;
        }

        let state = Arc::new(ApiState::new(prices, pipeline));
        (create_router(state), store)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = seeded().await;
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        assert!(body["uptime_secs"].is_u64());
        assert_eq!(body["pipeline"]["events_aggregated"], 3);
    }

    #[tokio::test]
    async fn test_prices_returns_latest() {
        let (app, _) = seeded().await;
        let (status, body) = get_json(app, "/prices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["apple"]["price"], 30);
        assert_eq!(body["apple"]["storeName"], "store1");
    }

    #[tokio::test]
    async fn test_stats_include_average() {
        let (app, _) = seeded().await;
        let (status, body) = get_json(app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["apple"]["count"], 3);
        assert_eq!(body["apple"]["sum"], 60);
        assert_eq!(body["apple"]["min"], 10);
        assert_eq!(body["apple"]["max"], 30);
        assert_eq!(body["apple"]["avg"], 20.0);
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let (app, _) = seeded().await;
        let (status, body) = get_json(app, "/history/apple").await;
        assert_eq!(status, StatusCode::OK);
        let prices: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["price"].as_i64().unwrap())
            .collect();
        assert_eq!(prices, vec![30, 20, 10]);
    }

    #[tokio::test]
    async fn test_history_unknown_product_is_empty() {
        let (app, _) = seeded().await;
        let (status, body) = get_json(app, "/history/durian").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_history_store_error_is_500() {
        let (app, store) = seeded().await;
        store.set_fail_reads(true);
        let (status, body) = get_json(app, "/history/apple").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "failed to retrieve price history" }));
    }
}
