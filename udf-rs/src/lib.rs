//! UDF-RS: market data cache and query engine for the TradingView UDF protocol
//!
//! This crate keeps a key-value cache of OHLC candles fresh from Binance kline
//! streams and answers UDF queries against it:
//!
//! - **Catalog**: exchange symbol list with retry-until-success loading,
//!   published as immutable snapshots
//! - **Ingestion**: kline chart subscriptions per resolution, normalized into
//!   OHLC series and written through the cache
//! - **Cache**: JSON series keyed by `(symbol, market, interval)` over any
//!   key-value store (Redis in production)
//! - **Query**: `config`, `symbol_info`, `symbols`, `search` and `history`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use udf_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = CatalogHandle::new();
//!     let source = Arc::new(BinanceMetadataClient::new(DEFAULT_EXCHANGE_INFO_URL));
//!     CatalogLoader::new(source, catalog.clone()).spawn();
//!
//!     let cache = OhlcCache::new(Arc::new(MemoryStore::new()));
//!     let engine = UdfEngine::new(catalog, cache, Market::Futures);
//!     println!("{:?}", engine.symbol("BINANCE:BTCUSDT").await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod data;
pub mod error;
pub mod exchange;
pub mod ingestion;
pub mod query;

// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::*;
    pub use crate::catalog::*;
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::exchange::*;
    pub use crate::ingestion::*;
    pub use crate::query::*;
}

/// Result type alias
pub type Result<T> = anyhow::Result<T>;
