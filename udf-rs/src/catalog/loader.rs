//! Symbol catalog loader
//!
//! Fetches the instrument list and publishes it as a [`CatalogSnapshot`].
//! A failed fetch is retried after a fixed delay, forever; there is no
//! backoff and no attempt limit.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::catalog::snapshot::{CatalogHandle, CatalogSnapshot, LoaderPhase};
use crate::exchange::MetadataSource;
use crate::Result;

/// Delay between failed catalog fetches
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct CatalogLoader {
    source: Arc<dyn MetadataSource>,
    handle: CatalogHandle,
    retry_delay: Duration,
    refresh_interval: Option<Duration>,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn MetadataSource>, handle: CatalogHandle) -> Self {
        Self {
            source,
            handle,
            retry_delay: DEFAULT_RETRY_DELAY,
            refresh_interval: None,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Reload the catalog periodically after the first publish.
    pub fn with_refresh_interval(mut self, refresh_interval: Option<Duration>) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn handle(&self) -> &CatalogHandle {
        &self.handle
    }

    /// One fetch; publishes on success.
    pub async fn load_once(&self) -> Result<Arc<CatalogSnapshot>> {
        self.handle.set_phase(LoaderPhase::Loading);
        let instruments = self.source.fetch_instruments().await?;
        let snapshot = CatalogSnapshot::from_instruments(&instruments);
        let count = snapshot.len();
        let published = self.handle.publish(snapshot);
        info!("✅ Symbol catalog published with {} symbols", count);
        Ok(published)
    }

    /// Fetch until one attempt succeeds.
    pub async fn load(&self) -> Arc<CatalogSnapshot> {
        loop {
            match self.load_once().await {
                Ok(snapshot) => return snapshot,
                Err(e) => {
                    self.handle.record_failure();
                    error!(
                        "Failed to load symbol catalog (attempt {}), retrying in {:?}: {:#}",
                        self.handle.state().failed_attempts,
                        self.retry_delay,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Load, then keep refreshing if a refresh interval is set.
    pub async fn run(self) {
        self.load().await;

        let Some(every) = self.refresh_interval else {
            return;
        };
        loop {
            tokio::time::sleep(every).await;
            info!("Refreshing symbol catalog");
            self.load().await;
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Instrument;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then returns one instrument.
    struct FlakySource {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSource for FlakySource {
        async fn fetch_instruments(&self) -> Result<Vec<Instrument>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(anyhow::anyhow!("exchange unreachable"));
            }
            Ok(vec![Instrument {
                symbol: "BTCUSDT".to_string(),
                base_asset: "BTC".to_string(),
                quote_asset: "USDT".to_string(),
                filters: Vec::new(),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_retries_with_fixed_delay() {
        let source = Arc::new(FlakySource {
            failures: 3,
            calls: AtomicUsize::new(0),
        });
        let loader = CatalogLoader::new(source.clone(), CatalogHandle::new());

        let started = tokio::time::Instant::now();
        let snapshot = loader.load().await;

        assert!(snapshot.contains("BTCUSDT"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert_eq!(loader.handle().phase(), LoaderPhase::Published);
        assert_eq!(loader.handle().state().failed_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_retry_wait() {
        let source = Arc::new(FlakySource {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let handle = CatalogHandle::new();
        let task = CatalogLoader::new(source, handle.clone()).spawn();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let state = handle.state();
        assert_eq!(state.phase, LoaderPhase::RetryWait);
        assert_eq!(state.failed_attempts, 3);
        assert!(state.snapshot.is_none());
        task.abort();
    }
}
