use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use udf_rs::prelude::*;

use crate::routes::{create_router, WELCOME_MESSAGE};
use crate::state::AppState;

fn instrument(symbol: &str, base: &str, quote: &str, tick_size: &str) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        filters: vec![SymbolFilter {
            filter_type: "PRICE_FILTER".to_string(),
            tick_size: Some(tick_size.to_string()),
        }],
    }
}

async fn test_app() -> Router {
    let catalog = CatalogHandle::with_snapshot(CatalogSnapshot::from_instruments(&[
        instrument("BTCUSDT", "BTC", "USDT", "0.10"),
        instrument("ETHUSDT", "ETH", "USDT", "0.01"),
        instrument("ETHBTC", "ETH", "BTC", "0.000001"),
    ]));
    let cache = OhlcCache::new(Arc::new(MemoryStore::new()));

    let mut series = OhlcSeries::with_capacity(2);
    series.push(1_700_000_000, 100.0, 110.0, 95.0, 105.0, 12.5);
    series.push(1_700_003_600, 105.0, 108.0, 101.0, 102.0, 8.0);
    cache.put("BTCUSDT", "1h", Market::Futures, &series).await;

    let engine = UdfEngine::new(catalog, cache, Market::Futures);
    create_router(AppState::new(engine))
}

fn pending_app() -> Router {
    let engine = UdfEngine::new(
        CatalogHandle::new(),
        OhlcCache::new(Arc::new(MemoryStore::new())),
        Market::Futures,
    )
    .with_catalog_wait(Duration::ZERO);
    create_router(AppState::new(engine))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_welcome() {
    let (status, body) = get(test_app().await, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, WELCOME_MESSAGE);
}

#[tokio::test]
async fn test_config_returns_server_time() {
    let before = chrono::Utc::now().timestamp();
    let (status, body) = get(test_app().await, "/config").await;
    assert_eq!(status, StatusCode::OK);
    let time: i64 = body.parse().unwrap();
    assert!(time >= before && time <= before + 5);
}

#[tokio::test]
async fn test_time_returns_datafeed_config() {
    let (status, body) = get(test_app().await, "/time").await;
    assert_eq!(status, StatusCode::OK);
    let config = json(&body);
    assert_eq!(config["exchanges"][0]["value"], "BINANCE");
    assert_eq!(config["symbols_types"][0]["value"], "crypto");
    assert_eq!(config["supports_search"], true);
    assert_eq!(config["supported_resolutions"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_symbol_info_columns() {
    let (status, body) = get(test_app().await, "/symbol_info").await;
    assert_eq!(status, StatusCode::OK);
    let table = json(&body);
    assert_eq!(table["symbol"], serde_json::json!(["BTCUSDT", "ETHUSDT", "ETHBTC"]));
    assert_eq!(table["pricescale"], serde_json::json!([10, 100, 1000000]));
}

#[tokio::test]
async fn test_symbols_resolves_prefixed_lowercase() {
    let (status, body) = get(test_app().await, "/symbols?symbol=BINANCE:ethbtc").await;
    assert_eq!(status, StatusCode::OK);
    let record = json(&body);
    assert_eq!(record["symbol"], "ETHBTC");
    assert_eq!(record["type"], "crypto");
    assert_eq!(record["description"], "ETH / BTC");
    assert_eq!(record["currency_code"], "BTC");
}

#[tokio::test]
async fn test_symbols_not_found() {
    let (status, body) = get(test_app().await, "/symbols?symbol=NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Symbol Not Found");
}

#[tokio::test]
async fn test_missing_params_are_bad_requests() {
    let (status, body) = get(test_app().await, "/symbols").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "symbol is required");

    let (status, body) = get(test_app().await, "/history?symbol=BTCUSDT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "resolution is required");

    let (status, body) = get(test_app().await, "/search?limit=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "query is required");
}

#[tokio::test]
async fn test_search() {
    let (status, body) = get(test_app().await, "/search?query=eth&type=&exchange=BINANCE&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let results = json(&body);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["ticker"], "ETHUSDT");
    assert_eq!(results[0]["type"], "crypto");

    let (_, body) = get(test_app().await, "/search?query=USDT").await;
    assert_eq!(json(&body).as_array().unwrap().len(), 2);

    let (status, body) = get(test_app().await, "/search?query=USDT&limit=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));
}

#[tokio::test]
async fn test_history_returns_cached_series() {
    let (status, body) = get(test_app().await, "/history?symbol=BTCUSDT&resolution=60").await;
    assert_eq!(status, StatusCode::OK);
    let series = json(&body);
    assert_eq!(series["s"], "ok");
    assert_eq!(series["t"], serde_json::json!([1_700_000_000, 1_700_003_600]));
    assert_eq!(series["c"], serde_json::json!([105.0, 102.0]));
    assert_eq!(series["v"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_without_data() {
    let (status, body) = get(test_app().await, "/history?symbol=ETHUSDT&resolution=1D").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({"s": "no_data"}));
}

#[tokio::test]
async fn test_history_errors() {
    let (status, body) = get(test_app().await, "/history?symbol=NOPE&resolution=999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Invalid Resolution");

    let (status, body) = get(test_app().await, "/history?symbol=NOPE&resolution=60").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Symbol Not Found");
}

#[tokio::test]
async fn test_catalog_pending_is_service_unavailable() {
    let (status, body) = get(pending_app(), "/symbols?symbol=BTCUSDT").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Symbol catalog is not loaded yet");

    // Configuration does not need the catalog.
    let (status, _) = get(pending_app(), "/time").await;
    assert_eq!(status, StatusCode::OK);
}
