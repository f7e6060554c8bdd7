//! Session Poller
//!
//! Owns the repeating market-session fetch: one snapshot per tick,
//! published to the broadcast hub and cached for `latest()` queries.
//!
//! # Policies
//!
//! - At-most-one-in-flight: the fetch is awaited inline and missed ticks
//!   are skipped, so a slow response can never overlap the next fetch.
//! - Retain-on-error: a failed tick logs, bumps the error counter, and
//!   leaves the previous snapshot untouched. No backoff; the next tick is
//!   the retry.
//! - Deterministic stop: cancelling the token ends the loop; a fetch
//!   already in flight is dropped, never published.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::application::ports::MarketDataPort;
use crate::domain::session::MarketSession;
use crate::infrastructure::broadcast::SharedBroadcastHub;

/// Configuration for the session poller.
#[derive(Debug, Clone, Copy)]
pub struct SessionPollerConfig {
    /// Interval between fetches.
    pub interval: Duration,
}

impl Default for SessionPollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Shared poller state, readable from any task.
#[derive(Debug, Default)]
pub struct SessionState {
    latest: RwLock<Option<MarketSession>>,
    last_success: RwLock<Option<DateTime<Utc>>>,
    consecutive_errors: AtomicU32,
}

impl SessionState {
    /// Create empty state (no snapshot yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest successfully fetched session, or `None` before the first
    /// success. Never reverts to `None` afterwards.
    #[must_use]
    pub fn latest(&self) -> Option<MarketSession> {
        *self.latest.read()
    }

    /// Time of the last successful fetch.
    #[must_use]
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        *self.last_success.read()
    }

    /// Number of failed ticks since the last success.
    #[must_use]
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::SeqCst)
    }

    fn record_success(&self, session: MarketSession, at: DateTime<Utc>) {
        *self.latest.write() = Some(session);
        *self.last_success.write() = Some(at);
        self.consecutive_errors.store(0, Ordering::SeqCst);
    }

    fn record_error(&self) {
        self.consecutive_errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Repeating market-session fetch loop.
pub struct SessionPoller {
    config: SessionPollerConfig,
    market_data: Arc<dyn MarketDataPort>,
    hub: SharedBroadcastHub,
    state: Arc<SessionState>,
    cancel: CancellationToken,
}

impl SessionPoller {
    /// Create a new poller. `cancel` is the stop handle; `state` outlives
    /// the loop and serves `latest()` queries.
    #[must_use]
    pub fn new(
        config: SessionPollerConfig,
        market_data: Arc<dyn MarketDataPort>,
        hub: SharedBroadcastHub,
        state: Arc<SessionState>,
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
    ///
    /// The first fetch happens immediately; subsequent fetches follow the
    /// configured interval.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("session poller cancelled");
                    break;
                }
                _ = interval.tick() => {
                    // Racing the fetch against cancellation drops an
                    // in-flight result instead of publishing it.
                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::debug!("session poller cancelled mid-fetch");
                            break;
                        }
                        result = self.market_data.fetch_session() => match result {
                            Ok(session) => {
                                self.state.record_success(session, Utc::now());
                                let _ = self.hub.send_session(session);
                            }
                            Err(e) => {
                                self.state.record_error();
                                tracing::warn!(
                                    error = %e,
                                    consecutive = self.state.consecutive_errors(),
                                    "session fetch failed; retaining previous snapshot"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}
