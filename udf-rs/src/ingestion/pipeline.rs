//! Live ingestion pipeline
//!
//! One subscription per resolution; every chart update is converted to an
//! OHLC series and written through the cache. The same routine serves spot
//! and futures, only the [`KlineFeed`] differs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::OhlcCache;
use crate::catalog::CatalogHandle;
use crate::data::{Market, Resolution};
use crate::exchange::{ChartUpdate, KlineFeed, DEFAULT_GRANULARITY};
use crate::ingestion::transform::windows_to_series;
use crate::Result;

/// Outcome of handling one chart update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Written,
    Empty,
    Rejected,
    WriteFailed,
}

pub struct IngestionPipeline {
    feed: Arc<dyn KlineFeed>,
    cache: OhlcCache,
    granularity: Duration,
}

impl IngestionPipeline {
    pub fn new(feed: Arc<dyn KlineFeed>, cache: OhlcCache) -> Self {
        Self {
            feed,
            cache,
            granularity: DEFAULT_GRANULARITY,
        }
    }

    pub fn with_granularity(mut self, granularity: Duration) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn market(&self) -> Market {
        self.feed.market()
    }

    /// Subscribe `symbols` at every resolution and spawn one consumer task per
    /// subscription.
    pub async fn start(
        &self,
        symbols: Vec<String>,
        resolutions: &[Resolution],
    ) -> Result<Vec<JoinHandle<()>>> {
        let market = self.feed.market();
        let mut handles = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            let interval = resolution.as_interval();
            let rx = self
                .feed
                .subscribe(symbols.clone(), interval, self.granularity)
                .await?;
            info!(
                "Ingesting {} {} klines for {} symbols",
                market,
                interval,
                symbols.len()
            );
            handles.push(tokio::spawn(consume(rx, self.cache.clone(), market)));
        }
        Ok(handles)
    }

    /// Wait for the catalog, then start every resolution for all its symbols.
    pub async fn start_for_catalog(
        &self,
        catalog: &CatalogHandle,
        resolutions: &[Resolution],
    ) -> Result<Vec<JoinHandle<()>>> {
        let snapshot = catalog.ready().await;
        self.start(snapshot.tickers(), resolutions).await
    }

    /// Start every published snapshot's new tickers, for as long as the
    /// catalog lives. Tickers dropped from a later snapshot keep streaming.
    pub async fn follow_catalog(
        &self,
        catalog: &CatalogHandle,
        resolutions: &[Resolution],
    ) -> Result<()> {
        let mut rx = catalog.subscribe();
        let mut streaming: HashSet<String> = HashSet::new();
        loop {
            let current = rx.borrow_and_update().snapshot.clone();
            if let Some(snapshot) = current {
                let fresh: Vec<String> = snapshot
                    .tickers()
                    .into_iter()
                    .filter(|t| !streaming.contains(t))
                    .collect();
                if !fresh.is_empty() {
                    if !streaming.is_empty() {
                        info!("Catalog refresh added {} symbols", fresh.len());
                    }
                    self.start(fresh.clone(), resolutions).await?;
                    streaming.extend(fresh);
                }
            }
            if rx.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    /// Handle one update inline.
    pub async fn handle_update(&self, update: &ChartUpdate) -> UpdateOutcome {
        handle_update(&self.cache, self.feed.market(), update).await
    }
}

async fn consume(mut rx: mpsc::Receiver<ChartUpdate>, cache: OhlcCache, market: Market) {
    while let Some(update) = rx.recv().await {
        handle_update(&cache, market, &update).await;
    }
    warn!("Kline feed for {} closed, ingestion stopped", market);
}

/// Transform and write one update. Failures are logged; the stream goes on.
pub async fn handle_update(cache: &OhlcCache, market: Market, update: &ChartUpdate) -> UpdateOutcome {
    match windows_to_series(&update.windows) {
        Ok(Some(series)) => {
            match cache
                .try_put(&update.symbol, &update.interval, market, &series)
                .await
            {
                Ok(()) => {
                    debug!(
                        "Cached {} {} {} windows",
                        update.symbol,
                        update.interval,
                        series.len()
                    );
                    UpdateOutcome::Written
                }
                Err(e) => {
                    error!(
                        "Failed to cache {} {} update: {}",
                        update.symbol, update.interval, e
                    );
                    UpdateOutcome::WriteFailed
                }
            }
        }
        Ok(None) => UpdateOutcome::Empty,
        Err(e) => {
            error!(
                "Dropping {} {} update: {}",
                update.symbol, update.interval, e
            );
            UpdateOutcome::Rejected
        }
    }
}
