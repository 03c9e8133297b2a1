//! UDF query engine
//!
//! Answers `config`, `symbol_info`, `symbols`, `search` and `history` from the
//! latest published catalog snapshot and the candle cache. Calls share no
//! state beyond those two.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::OhlcCache;
use crate::catalog::{CatalogHandle, CatalogSnapshot, SearchResult, SymbolInfoTable, SymbolRecord};
use crate::data::{resolution_to_interval, Market, OhlcSeries};
use crate::error::UdfError;
use crate::query::types::UdfConfig;

/// Longest a query waits for the first catalog snapshot
pub const DEFAULT_CATALOG_WAIT: Duration = Duration::from_secs(10);

/// Optional `search` filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub symbol_type: Option<String>,
    pub exchange: Option<String>,
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, symbol_type: impl Into<String>) -> Self {
        self.symbol_type = Some(symbol_type.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone)]
pub struct UdfEngine {
    catalog: CatalogHandle,
    cache: OhlcCache,
    market: Market,
    catalog_wait: Duration,
}

impl UdfEngine {
    pub fn new(catalog: CatalogHandle, cache: OhlcCache, market: Market) -> Self {
        Self {
            catalog,
            cache,
            market,
            catalog_wait: DEFAULT_CATALOG_WAIT,
        }
    }

    pub fn with_catalog_wait(mut self, catalog_wait: Duration) -> Self {
        self.catalog_wait = catalog_wait;
        self
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, UdfError> {
        self.catalog
            .ready_within(self.catalog_wait)
            .await
            .ok_or(UdfError::CatalogUnavailable)
    }

    /// Datafeed configuration
    pub async fn config(&self) -> UdfConfig {
        UdfConfig::default()
    }

    /// The catalog as columns
    pub async fn symbol_info(&self) -> Result<SymbolInfoTable, UdfError> {
        let snapshot = self.snapshot().await?;
        Ok(SymbolInfoTable::from_records(snapshot.symbols()))
    }

    /// Resolve `EXCHANGE:TICKER` or `TICKER`, case-insensitively.
    pub async fn symbol(&self, input: &str) -> Result<SymbolRecord, UdfError> {
        let snapshot = self.snapshot().await?;
        let ticker = parse_ticker(input);
        snapshot
            .find(&ticker)
            .cloned()
            .ok_or(UdfError::SymbolNotFound)
    }

    /// Filter by type and exchange, substring-match the ticker, truncate.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>, UdfError> {
        let snapshot = self.snapshot().await?;
        let query = params.query.to_uppercase();
        let limit = params.limit.unwrap_or(usize::MAX);

        let results: Vec<SearchResult> = snapshot
            .symbols()
            .iter()
            .filter(|r| {
                params
                    .symbol_type
                    .as_deref()
                    .map_or(true, |t| r.symbol_type == t)
            })
            .filter(|r| params.exchange.as_deref().map_or(true, |e| r.exchange == e))
            .filter(|r| r.symbol.contains(&query))
            .take(limit)
            .map(SymbolRecord::to_search_result)
            .collect();
        debug!("Search {:?} matched {} symbols", params.query, results.len());
        Ok(results)
    }

    /// Cached bars for a catalog symbol. `Ok(None)` when nothing has been
    /// ingested yet or the cached entry is unreadable.
    ///
    /// An unmapped resolution is reported before an unknown symbol. The
    /// symbol must match a catalog ticker exactly.
    pub async fn history(
        &self,
        symbol: &str,
        resolution: &str,
    ) -> Result<Option<OhlcSeries>, UdfError> {
        let interval = resolution_to_interval(resolution).ok_or(UdfError::InvalidResolution)?;
        let snapshot = self.snapshot().await?;
        if !snapshot.contains(symbol) {
            return Err(UdfError::SymbolNotFound);
        }
        Ok(self.cache.get(symbol, interval, self.market).await)
    }
}

/// Ticker part of `EXCHANGE:TICKER`, uppercased.
pub fn parse_ticker(input: &str) -> String {
    let ticker = match input.split_once(':') {
        Some((_, ticker)) => ticker.split(':').next().unwrap_or(ticker),
        None => input,
    };
    ticker.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticker() {
        assert_eq!(parse_ticker("BINANCE:BTCUSDT"), "BTCUSDT");
        assert_eq!(parse_ticker("btcusdt"), "BTCUSDT");
        assert_eq!(parse_ticker("binance:ethbtc"), "ETHBTC");
        assert_eq!(parse_ticker("A:B:C"), "B");
    }

    #[test]
    fn test_config_descriptor() {
        let config = UdfConfig::default();
        assert_eq!(config.exchanges[0].value, "BINANCE");
        assert_eq!(config.exchanges[0].desc, "Binance Exchange");
        assert_eq!(config.symbols_types[0].name, "Cryptocurrency");
        assert!(config.supports_search && config.supports_time);
        assert!(!config.supports_group_request && !config.supports_marks);
        assert!(!config.supports_timescale_marks);
        assert_eq!(config.supported_resolutions.len(), 15);
    }
}
