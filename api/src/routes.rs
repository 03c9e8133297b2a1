use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use udf_rs::prelude::{OhlcSeries, SearchParams, SearchResult, SymbolInfoTable, SymbolRecord, UdfConfig};

use crate::error::ApiError;
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str =
    "Welcome to the Binance UDF Adapter for TradingView. See ./README.md for more details.";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/config", get(server_time))
        .route("/time", get(datafeed_config))
        .route("/symbol_info", get(symbol_info))
        .route("/symbols", get(symbols))
        .route("/search", get(search))
        .route("/history", get(history))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    #[serde(rename = "type")]
    pub symbol_type: Option<String>,
    pub exchange: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub resolution: Option<String>,
}

async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

// The UDF client swaps these two: `/config` answers with the clock and
// `/time` with the datafeed configuration.
async fn server_time() -> String {
    chrono::Utc::now().timestamp().to_string()
}

async fn datafeed_config(State(state): State<AppState>) -> Json<UdfConfig> {
    Json(state.engine.config().await)
}

async fn symbol_info(State(state): State<AppState>) -> Result<Json<SymbolInfoTable>, ApiError> {
    Ok(Json(state.engine.symbol_info().await?))
}

async fn symbols(
    State(state): State<AppState>,
    Query(params): Query<SymbolQuery>,
) -> Result<Json<SymbolRecord>, ApiError> {
    let symbol = params.symbol.ok_or(ApiError::MissingParam("symbol"))?;
    Ok(Json(state.engine.symbol(&symbol).await?))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let query = params.query.ok_or(ApiError::MissingParam("query"))?;

    let mut search = SearchParams::new(query);
    // Empty filters are treated as absent.
    if let Some(t) = params.symbol_type.filter(|t| !t.is_empty()) {
        search = search.with_type(t);
    }
    if let Some(e) = params.exchange.filter(|e| !e.is_empty()) {
        search = search.with_exchange(e);
    }
    if let Some(limit) = params.limit {
        search = search.with_limit(limit);
    }

    Ok(Json(state.engine.search(&search).await?))
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<OhlcSeries>, ApiError> {
    let symbol = params.symbol.ok_or(ApiError::MissingParam("symbol"))?;
    let resolution = params
        .resolution
        .ok_or(ApiError::MissingParam("resolution"))?;

    let series = state
        .engine
        .history(&symbol, &resolution)
        .await?
        .unwrap_or_else(OhlcSeries::no_data);
    Ok(Json(series))
}
