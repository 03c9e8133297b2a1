//! Catalog snapshots and the handle they are published through

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::catalog::symbol::{build_records, SymbolRecord};
use crate::exchange::Instrument;

/// Immutable catalog built from one metadata response.
///
/// Holds both read views: the ordered record list and the ticker set. They
/// are always built together and never mutated after construction.
#[derive(Debug)]
pub struct CatalogSnapshot {
    symbols: Vec<SymbolRecord>,
    members: HashSet<String>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn from_instruments(instruments: &[Instrument]) -> Self {
        Self::from_records(build_records(instruments))
    }

    /// Build from records; later duplicates of a ticker are dropped so tickers
    /// stay unique.
    pub fn from_records(records: Vec<SymbolRecord>) -> Self {
        let mut members = HashSet::with_capacity(records.len());
        let symbols: Vec<SymbolRecord> = records
            .into_iter()
            .filter(|r| members.insert(r.symbol.clone()))
            .collect();
        Self {
            symbols,
            members,
            loaded_at: Utc::now(),
        }
    }

    /// Ordered list view
    pub fn symbols(&self) -> &[SymbolRecord] {
        &self.symbols
    }

    /// Membership check view
    pub fn contains(&self, symbol: &str) -> bool {
        self.members.contains(symbol)
    }

    /// Exact ticker lookup
    pub fn find(&self, symbol: &str) -> Option<&SymbolRecord> {
        if !self.contains(symbol) {
            return None;
        }
        self.symbols.iter().find(|r| r.symbol == symbol)
    }

    pub fn tickers(&self) -> Vec<String> {
        self.symbols.iter().map(|r| r.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Catalog loader phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    Loading,
    Published,
    RetryWait,
}

/// What readers observe through a [`CatalogHandle`].
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub phase: LoaderPhase,
    /// Failed fetches since the last successful publish
    pub failed_attempts: u64,
    /// Latest published snapshot; survives failed refreshes.
    pub snapshot: Option<Arc<CatalogSnapshot>>,
}

/// Shared, atomically swappable catalog.
///
/// Cloning is cheap; all clones observe the same state. Publishing replaces
/// the whole `Arc<CatalogSnapshot>`, so a reader holding a snapshot keeps a
/// consistent view while a refresh lands.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    tx: Arc<watch::Sender<CatalogState>>,
}

impl CatalogHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CatalogState {
            phase: LoaderPhase::Loading,
            failed_attempts: 0,
            snapshot: None,
        });
        Self { tx: Arc::new(tx) }
    }

    /// Handle with a snapshot already published.
    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        let handle = Self::new();
        handle.publish(snapshot);
        handle
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        let published = snapshot.clone();
        self.tx.send_modify(|state| {
            state.phase = LoaderPhase::Published;
            state.failed_attempts = 0;
            state.snapshot = Some(published);
        });
        snapshot
    }

    pub(crate) fn set_phase(&self, phase: LoaderPhase) {
        self.tx.send_modify(|state| state.phase = phase);
    }

    pub(crate) fn record_failure(&self) {
        self.tx.send_modify(|state| {
            state.phase = LoaderPhase::RetryWait;
            state.failed_attempts += 1;
        });
    }

    pub fn state(&self) -> CatalogState {
        self.tx.borrow().clone()
    }

    pub fn phase(&self) -> LoaderPhase {
        self.tx.borrow().phase
    }

    /// Latest snapshot, if one was ever published.
    pub fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        self.tx.borrow().snapshot.clone()
    }

    /// Receiver notified on every state change, publishes included.
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.tx.subscribe()
    }

    /// Wait until a snapshot is published.
    pub async fn ready(&self) -> Arc<CatalogSnapshot> {
        let mut rx = self.subscribe();
        loop {
            let current = rx.borrow_and_update().snapshot.clone();
            if let Some(snapshot) = current {
                return snapshot;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Wait for a snapshot for at most `timeout`.
    pub async fn ready_within(&self, timeout: Duration) -> Option<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.current() {
            return Some(snapshot);
        }
        if timeout.is_zero() {
            return None;
        }
        tokio::time::timeout(timeout, self.ready()).await.ok()
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Instrument;

    fn instruments(symbols: &[&str]) -> Vec<Instrument> {
        symbols
            .iter()
            .map(|s| Instrument {
                symbol: s.to_string(),
                base_asset: s.trim_end_matches("USDT").to_string(),
                quote_asset: "USDT".to_string(),
                filters: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_snapshot_views_agree() {
        let snapshot = CatalogSnapshot::from_instruments(&instruments(&["BTCUSDT", "ETHUSDT"]));
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("BTCUSDT"));
        assert!(!snapshot.contains("btcusdt"));
        assert_eq!(snapshot.find("ETHUSDT").map(|r| r.symbol.as_str()), Some("ETHUSDT"));
    }

    #[test]
    fn test_snapshot_drops_duplicate_tickers() {
        let snapshot =
            CatalogSnapshot::from_instruments(&instruments(&["BTCUSDT", "BTCUSDT", "ETHUSDT"]));
        assert_eq!(snapshot.tickers(), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn test_handle_publish_replaces_snapshot() {
        let handle = CatalogHandle::new();
        assert!(handle.current().is_none());
        assert_eq!(handle.phase(), LoaderPhase::Loading);

        handle.publish(CatalogSnapshot::from_instruments(&instruments(&["BTCUSDT"])));
        let first = handle.current().unwrap();

        handle.publish(CatalogSnapshot::from_instruments(&instruments(&["ETHUSDT"])));
        let second = handle.ready().await;

        // A reader holding the old snapshot still sees it whole.
        assert!(first.contains("BTCUSDT"));
        assert!(!first.contains("ETHUSDT"));
        assert!(second.contains("ETHUSDT"));
        assert!(!second.contains("BTCUSDT"));
        assert_eq!(handle.phase(), LoaderPhase::Published);
    }

    #[tokio::test]
    async fn test_ready_within_times_out_when_pending() {
        let handle = CatalogHandle::new();
        assert!(handle.ready_within(Duration::from_millis(10)).await.is_none());
        assert!(handle.ready_within(Duration::ZERO).await.is_none());
    }

    #[tokio::test]
    async fn test_ready_wakes_on_publish() {
        let handle = CatalogHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.ready().await.len() })
        };
        tokio::task::yield_now().await;
        handle.publish(CatalogSnapshot::from_instruments(&instruments(&["BTCUSDT", "ETHUSDT"])));
        assert_eq!(waiter.await.unwrap(), 2);
    }
}
