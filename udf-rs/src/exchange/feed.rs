//! Kline chart feed abstraction

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::data::Market;
use crate::exchange::chart::WindowMap;
use crate::Result;

/// Batching granularity used by the ingestion pipeline
pub const DEFAULT_GRANULARITY: Duration = Duration::from_millis(1000);

/// Full window map of one symbol's chart after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartUpdate {
    pub symbol: String,
    /// Kline interval token, e.g. `"1h"`
    pub interval: String,
    pub windows: WindowMap,
}

/// A market-specific kline chart subscription API.
///
/// Implementations deliver [`ChartUpdate`]s on the returned receiver until it
/// is dropped. Updates for one symbol arrive in order; nothing is promised
/// across symbols.
#[async_trait]
pub trait KlineFeed: Send + Sync {
    /// Market segment this feed streams
    fn market(&self) -> Market;

    async fn subscribe(
        &self,
        symbols: Vec<String>,
        interval: &str,
        granularity: Duration,
    ) -> Result<mpsc::Receiver<ChartUpdate>>;
}
