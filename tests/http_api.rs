use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use serde_json::Value;
use stock_meter::{
    AppState,
    cache::operations::{MemoryUsageStore, StoreError, UsageStore, WindowCounts},
    config::Config,
    router::create_router,
    services::{ProviderError, QuoteProvider, RawBar},
};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingProvider {
    bars: Vec<RawBar>,
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl QuoteProvider for RecordingProvider {
    async fn history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<RawBar>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            symbol.to_string(),
            period.to_string(),
            interval.to_string(),
        ));
        if self.fail {
            return Err(ProviderError::Upstream("Not Found: no data".to_string()));
        }
        Ok(self.bars.clone())
    }
}

struct UnreachableStore;

#[async_trait]
impl UsageStore for UnreachableStore {
    async fn incr_with_expiry(
        &self,
        _: &str,
        _: u64,
        _: &str,
        _: u64,
    ) -> Result<WindowCounts, StoreError> {
        Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
    }
}

struct ExhaustedStore;

#[async_trait]
impl UsageStore for ExhaustedStore {
    async fn incr_with_expiry(
        &self,
        _: &str,
        _: u64,
        _: &str,
        _: u64,
    ) -> Result<WindowCounts, StoreError> {
        Ok(WindowCounts {
            minute: 101,
            daily: 500,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn sample_bars() -> Vec<RawBar> {
    let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    vec![
        RawBar {
            timestamp: day.and_hms_opt(9, 30, 0).unwrap(),
            open: 192.904,
            high: 194.996,
            low: 192.52,
            close: 194.03,
            volume: 50080500.0,
        },
        RawBar {
            timestamp: day.succ_opt().unwrap().and_hms_opt(9, 30, 0).unwrap(),
            open: 194.6,
            high: 196.9,
            low: 194.14,
            close: 195.87,
            volume: 54156800.0,
        },
    ]
}

fn app(store: Arc<dyn UsageStore>, provider: Arc<RecordingProvider>) -> Router {
    create_router(AppState::new(Config::default(), store, provider))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn metrics_count_each_query() {
    let store = Arc::new(MemoryUsageStore::new());
    let app = app(store, Arc::new(RecordingProvider::default()));

    let (status, body) = get(app.clone(), "/api/metrics/FINNHUB").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["minute_usage"]["current"], 1);
    assert_eq!(body["minute_usage"]["limit"], 60);
    assert_eq!(body["minute_usage"]["remaining"], 59);
    assert_eq!(body["daily_usage"]["limit"], 1500);
    assert!(body["last_updated"].as_str().unwrap().contains('T'));

    let (_, body) = get(app, "/api/metrics/FINNHUB").await;
    assert_eq!(body["daily_usage"]["current"], 2);
    assert_eq!(body["daily_usage"]["remaining"], 1498);
}

#[tokio::test]
async fn unknown_api_is_rejected_without_counting() {
    let store = Arc::new(MemoryUsageStore::new());
    let app = app(store.clone(), Arc::new(RecordingProvider::default()));

    let (status, body) = get(app, "/api/metrics/POLYGON").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 1004);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn metrics_fail_when_store_is_down() {
    let app = app(Arc::new(UnreachableStore), Arc::new(RecordingProvider::default()));

    let (status, body) = get(app, "/api/metrics/ALPHA_VANTAGE").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["msg"], "Failed to get metrics");
    assert!(body.get("minute_usage").is_none());
}

#[tokio::test]
async fn stock_data_uses_default_period_and_interval() {
    let provider = Arc::new(RecordingProvider {
        bars: sample_bars(),
        ..Default::default()
    });
    let app = app(Arc::new(MemoryUsageStore::new()), provider.clone());

    let (status, body) = get(app, "/api/stock/AAPL").await;
    assert_eq!(status, StatusCode::OK);

    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["symbol"], "AAPL");
    assert_eq!(records[0]["timestamp"], "2024-06-03 09:30:00");
    assert_eq!(records[0]["open"], 192.9);
    assert_eq!(records[0]["high"], 195.0);
    assert_eq!(records[0]["volume"], 50080500);
    assert!(records[0]["sma_20"].is_null());
    assert!(records[0]["ema_20"].is_null());
    assert!(records[0]["rsi"].is_null());
    assert_eq!(records[1]["timestamp"], "2024-06-04 09:30:00");

    assert_eq!(
        provider.requests.lock().unwrap().as_slice(),
        &[("AAPL".to_string(), "1mo".to_string(), "1d".to_string())]
    );
}

#[tokio::test]
async fn stock_query_parameters_are_forwarded() {
    let provider = Arc::new(RecordingProvider::default());
    let app = app(Arc::new(MemoryUsageStore::new()), provider.clone());

    let (status, body) = get(app, "/api/stock/MSFT?period=5d&interval=1h").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
    assert_eq!(
        provider.requests.lock().unwrap().as_slice(),
        &[("MSFT".to_string(), "5d".to_string(), "1h".to_string())]
    );
}

#[tokio::test]
async fn exhausted_quota_refuses_without_upstream_call() {
    let provider = Arc::new(RecordingProvider {
        bars: sample_bars(),
        ..Default::default()
    });
    let app = app(Arc::new(ExhaustedStore), provider.clone());

    let (status, body) = get(app, "/api/stock/AAPL").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["msg"], "rate limit exceeded");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn store_outage_fails_closed_for_quotes() {
    let provider = Arc::new(RecordingProvider::default());
    let app = app(Arc::new(UnreachableStore), provider.clone());

    let (status, _) = get(app, "/api/stock/AAPL").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upstream_failure_is_a_server_error() {
    let provider = Arc::new(RecordingProvider {
        fail: true,
        ..Default::default()
    });
    let app = app(Arc::new(MemoryUsageStore::new()), provider);

    let (status, body) = get(app, "/api/stock/NOPE").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 5002);
    assert!(body["msg"].as_str().unwrap().contains("no data"));
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let app = app(
        Arc::new(MemoryUsageStore::new()),
        Arc::new(RecordingProvider::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(
        Arc::new(MemoryUsageStore::new()),
        Arc::new(RecordingProvider::default()),
    );
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["resp_data"]["status"], "ok");
}
