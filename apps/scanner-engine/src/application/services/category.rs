//! Category Table Synchronizer
//!
//! One instance per category name, each with its own timer and its own
//! fetch loop, so a slow or failing category can never stall a sibling
//! panel. A standalone window mounts its own synchronizer and tears it
//! down with the window; no global registry exists.
//!
//! Poll policies (skip missed ticks, retain on error, discard in-flight
//! results on stop) match the session poller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::application::ports::MarketDataPort;
use crate::domain::scanner::CategorySnapshot;
use crate::infrastructure::broadcast::SharedBroadcastHub;

/// Configuration for one category synchronizer.
#[derive(Debug, Clone)]
pub struct CategorySyncConfig {
    /// Category name, passed to the data endpoint verbatim.
    pub category: String,
    /// Interval between fetches.
    pub interval: Duration,
    /// Maximum rows kept per snapshot.
    pub max_rows: usize,
}

impl CategorySyncConfig {
    /// Create a config with the default cadence and row bound.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            interval: Duration::from_secs(10),
            max_rows: 50,
        }
    }
}

/// Shared synchronizer state. Bounded history: only the newest snapshot
/// is retained.
#[derive(Debug, Default)]
pub struct CategoryState {
    latest: RwLock<Option<CategorySnapshot>>,
    consecutive_errors: AtomicU32,
}

impl CategoryState {
    /// Create empty state (no snapshot yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest successful snapshot, or `None` before the first success.
    #[must_use]
    pub fn latest(&self) -> Option<CategorySnapshot> {
        self.latest.read().clone()
    }

    /// Number of failed ticks since the last success.
    #[must_use]
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::SeqCst)
    }

    fn record_success(&self, snapshot: CategorySnapshot) {
        *self.latest.write() = Some(snapshot);
        self.consecutive_errors.store(0, Ordering::SeqCst);
    }

    fn record_error(&self) {
        self.consecutive_errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Independent polling loop for one category table.
pub struct CategorySynchronizer {
    config: CategorySyncConfig,
    market_data: Arc<dyn MarketDataPort>,
    hub: SharedBroadcastHub,
    state: Arc<CategoryState>,
    cancel: CancellationToken,
}

impl CategorySynchronizer {
    /// Create a new synchronizer for `config.category`.
    #[must_use]
    pub fn new(
        config: CategorySyncConfig,
        market_data: Arc<dyn MarketDataPort>,
        hub: SharedBroadcastHub,
        state: Arc<CategoryState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            market_data,
            hub,
            state,
            cancel,
        }
    }

    /// Run the polling loop until cancelled.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!(category = %self.config.category, "synchronizer cancelled");
                    break;
                }
                _ = interval.tick() => {
                    tokio::select! {
                        () = self.cancel.cancelled() => break,
                        result = self.market_data.fetch_category(&self.config.category) => match result {
                            Ok(rows) => {
                                let snapshot = CategorySnapshot::new(
                                    self.config.category.clone(),
                                    rows,
                                    Utc::now(),
                                    self.config.max_rows,
                                );
                                self.state.record_success(snapshot.clone());
                                let _ = self.hub.send_category(snapshot);
                            }
                            Err(e) => {
                                self.state.record_error();
                                tracing::warn!(
                                    category = %self.config.category,
                                    error = %e,
                                    "category fetch failed; retaining previous snapshot"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::application::ports::{MarketDataError, MockMarketDataPort};
    use crate::domain::scanner::CategoryRow;
    use crate::infrastructure::broadcast::BroadcastHub;

    fn row(ticker: &str) -> CategoryRow {
        CategoryRow {
            ticker: ticker.to_string(),
            metrics: vec![],
        }
    }

    fn config(category: &str, interval_ms: u64) -> CategorySyncConfig {
        CategorySyncConfig {
            category: category.to_string(),
            interval: Duration::from_millis(interval_ms),
            max_rows: 50,
        }
    }

    fn spawn_sync(
        config: CategorySyncConfig,
        market_data: Arc<dyn MarketDataPort>,
        hub: SharedBroadcastHub,
    ) -> (Arc<CategoryState>, CancellationToken, tokio::task::JoinHandle<()>) {
        let state = Arc::new(CategoryState::new());
        let cancel = CancellationToken::new();
        let sync = CategorySynchronizer::new(
            config,
            market_data,
            hub,
            Arc::clone(&state),
            cancel.clone(),
        );
        let handle = tokio::spawn(sync.run());
        (state, cancel, handle)
    }

    #[tokio::test]
    async fn snapshot_delivered_only_on_success() {
        let calls = AtomicUsize::new(0);
        let mut mock = MockMarketDataPort::new();
        mock.expect_fetch_category().returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![row("AAPL")])
            } else {
                Err(MarketDataError::Transport("reset".to_string()))
            }
        });

        let hub = Arc::new(BroadcastHub::with_defaults());
        let (state, cancel, handle) =
            spawn_sync(config("gappers_up", 10), Arc::new(mock), Arc::clone(&hub));

        tokio::time::sleep(Duration::from_millis(80)).await;

        let latest = state.latest().unwrap();
        assert_eq!(latest.category, "gappers_up");
        assert_eq!(latest.tickers().collect::<Vec<_>>(), vec!["AAPL"]);
        assert!(state.consecutive_errors() >= 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn snapshots_are_bounded_to_max_rows() {
        let mut mock = MockMarketDataPort::new();
        mock.expect_fetch_category()
            .returning(|_| Ok(vec![row("A"), row("B"), row("C")]));

        let hub = Arc::new(BroadcastHub::with_defaults());
        let mut rx = hub.category_rx();
        let mut cfg = config("high_volume", 10);
        cfg.max_rows = 2;
        let (_state, cancel, handle) = spawn_sync(cfg, Arc::new(mock), Arc::clone(&hub));

        let snapshot = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.rows.len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn instances_are_independent() {
        // One category permanently failing must not stop a sibling from
        // publishing.
        let mut failing = MockMarketDataPort::new();
        failing
            .expect_fetch_category()
            .returning(|_| Err(MarketDataError::Status { status: 500 }));

        let mut healthy = MockMarketDataPort::new();
        healthy
            .expect_fetch_category()
            .returning(|_| Ok(vec![row("NVDA")]));

        let hub = Arc::new(BroadcastHub::with_defaults());
        let (failing_state, cancel_a, handle_a) =
            spawn_sync(config("anomalies", 10), Arc::new(failing), Arc::clone(&hub));
        let (healthy_state, cancel_b, handle_b) =
            spawn_sync(config("momentum", 10), Arc::new(healthy), Arc::clone(&hub));

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(failing_state.latest().is_none());
        assert!(healthy_state.latest().is_some());

        cancel_a.cancel();
        cancel_b.cancel();
        handle_a.await.unwrap();
        handle_b.await.unwrap();
    }
}
