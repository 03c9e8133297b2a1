//! Cache access layer for OHLC series
//!
//! Series are stored as JSON under `symbol_market_interval`.

use std::sync::Arc;

use tracing::{error, warn};

use crate::cache::store::KeyValueStore;
use crate::data::{Market, OhlcSeries};
use crate::error::CacheError;

/// Cache key for one series
pub fn cache_key(symbol: &str, market: Market, interval: &str) -> String {
    format!("{}_{}_{}", symbol, market, interval)
}

#[derive(Clone)]
pub struct OhlcCache {
    store: Arc<dyn KeyValueStore>,
}

impl OhlcCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write a series, replacing whatever was stored.
    pub async fn try_put(
        &self,
        symbol: &str,
        interval: &str,
        market: Market,
        series: &OhlcSeries,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(series)?;
        self.store
            .set(&cache_key(symbol, market, interval), payload)
            .await
    }

    /// Write a series; failures are logged, the next update supersedes them.
    pub async fn put(&self, symbol: &str, interval: &str, market: Market, series: &OhlcSeries) {
        if let Err(e) = self.try_put(symbol, interval, market, series).await {
            error!(
                "Failed to cache {} series: {}",
                cache_key(symbol, market, interval),
                e
            );
        }
    }

    /// Read a series, keeping "missing" (`Ok(None)`) apart from store or
    /// decode failures (`Err`).
    pub async fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        market: Market,
    ) -> Result<Option<OhlcSeries>, CacheError> {
        let key = cache_key(symbol, market, interval);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read a series; missing and unreadable entries are both `None`.
    pub async fn get(&self, symbol: &str, interval: &str, market: Market) -> Option<OhlcSeries> {
        match self.fetch(symbol, interval, market).await {
            Ok(series) => series,
            Err(e) => {
                warn!(
                    "Failed to read {} series: {}",
                    cache_key(symbol, market, interval),
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;

    fn series() -> OhlcSeries {
        let mut series = OhlcSeries::with_capacity(2);
        series.push(1_700_000_000, 100.5, 101.0, 99.25, 100.75, 12.5);
        series.push(1_700_000_060, 100.75, 102.0, 100.0, 101.5, 8.0);
        series
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("BTCUSDT", Market::Futures, "1h"), "BTCUSDT_futures_1h");
        assert_eq!(cache_key("ETHBTC", Market::Spot, "1M"), "ETHBTC_spot_1M");
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let cache = OhlcCache::new(Arc::new(MemoryStore::new()));
        cache.put("BTCUSDT", "1h", Market::Futures, &series()).await;

        assert_eq!(cache.get("BTCUSDT", "1h", Market::Futures).await, Some(series()));
        assert_eq!(cache.get("BTCUSDT", "1h", Market::Spot).await, None);
        assert_eq!(cache.get("BTCUSDT", "4h", Market::Futures).await, None);
    }

    #[tokio::test]
    async fn test_malformed_entry_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("BTCUSDT_futures_1h", "{not json".to_string())
            .await
            .unwrap();
        let cache = OhlcCache::new(store);

        assert!(cache.fetch("BTCUSDT", "1h", Market::Futures).await.is_err());
        assert_eq!(cache.get("BTCUSDT", "1h", Market::Futures).await, None);
        assert!(matches!(cache.fetch("ETHUSDT", "1h", Market::Futures).await, Ok(None)));
    }
}
