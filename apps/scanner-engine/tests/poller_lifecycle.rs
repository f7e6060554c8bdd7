//! Poller Lifecycle Integration Tests
//!
//! Session poller and category synchronizers driven against a scripted
//! data endpoint: retain-on-error, deterministic stop, and discard of
//! in-flight results.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use scanner_engine::{
    BroadcastHub, CategoryRow, CategoryState, CategorySyncConfig, CategorySynchronizer,
    MarketDataError, MarketDataPort, MarketSession, SessionPhase, SessionPoller,
    SessionPollerConfig, SessionState,
};

fn session(day: u32) -> MarketSession {
    MarketSession {
        current_session: SessionPhase::MarketOpen,
        trading_date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
    }
}

/// Endpoint that replays a scripted sequence of session results, with an
/// optional artificial delay per fetch. Once the script is exhausted the
/// last behavior repeats as an error.
struct ScriptedEndpoint {
    sessions: Mutex<VecDeque<Result<MarketSession, MarketDataError>>>,
    delay: Duration,
}

impl ScriptedEndpoint {
    fn new(
        sessions: Vec<Result<MarketSession, MarketDataError>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(sessions.into()),
            delay,
        })
    }
}

#[async_trait]
impl MarketDataPort for ScriptedEndpoint {
    async fn fetch_session(&self) -> Result<MarketSession, MarketDataError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sessions
            .lock()
            .pop_front()
            .unwrap_or(Err(MarketDataError::Transport("script done".to_string())))
    }

    async fn fetch_category(&self, _category: &str) -> Result<Vec<CategoryRow>, MarketDataError> {
        Err(MarketDataError::Transport("unused".to_string()))
    }
}

fn spawn_session_poller(
    endpoint: Arc<dyn MarketDataPort>,
    interval: Duration,
) -> (Arc<SessionState>, CancellationToken, tokio::task::JoinHandle<()>) {
    let hub = Arc::new(BroadcastHub::with_defaults());
    let state = Arc::new(SessionState::new());
    let cancel = CancellationToken::new();
    let poller = SessionPoller::new(
        SessionPollerConfig { interval },
        endpoint,
        hub,
        Arc::clone(&state),
        cancel.clone(),
    );
    let handle = tokio::spawn(poller.run());
    (state, cancel, handle)
}

#[tokio::test]
async fn test_three_failed_ticks_still_serve_the_last_session() {
    let endpoint = ScriptedEndpoint::new(
        vec![
            Ok(session(5)),
            Err(MarketDataError::Status { status: 502 }),
            Err(MarketDataError::Transport("reset".to_string())),
            Err(MarketDataError::Malformed("truncated".to_string())),
        ],
        Duration::ZERO,
    );

    let (state, cancel, handle) = spawn_session_poller(endpoint, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Never null after a success, never an error value.
    assert_eq!(state.latest(), Some(session(5)));
    assert!(state.consecutive_errors() >= 3);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_stop_discards_the_in_flight_fetch() {
    // One slow successful fetch; cancel lands while it is in flight.
    let endpoint = ScriptedEndpoint::new(vec![Ok(session(5))], Duration::from_millis(100));

    let (state, cancel, handle) = spawn_session_poller(endpoint, Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();
    handle.await.unwrap();

    // Give the (now abandoned) fetch time to have completed somewhere.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(state.latest(), None);
}

#[tokio::test]
async fn test_stop_halts_future_ticks() {
    let endpoint = ScriptedEndpoint::new(vec![Ok(session(5))], Duration::ZERO);
    let (_state, cancel, handle) = spawn_session_poller(endpoint, Duration::from_secs(120));

    cancel.cancel();
    tokio::time::timeout(Duration::from_millis(100), handle)
        .await
        .expect("poller must stop promptly")
        .unwrap();
}

/// Category endpoint whose per-category behavior is fixed: `fail` always
/// errors, everything else returns one row named after the category.
struct PerCategoryEndpoint;

#[async_trait]
impl MarketDataPort for PerCategoryEndpoint {
    async fn fetch_session(&self) -> Result<MarketSession, MarketDataError> {
        Err(MarketDataError::Transport("unused".to_string()))
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<CategoryRow>, MarketDataError> {
        if category == "fail" {
            // A slow failure, to prove siblings are not stalled behind it.
            tokio::time::sleep(Duration::from_millis(80)).await;
            return Err(MarketDataError::Status { status: 500 });
        }
        Ok(vec![CategoryRow {
            ticker: category.to_uppercase(),
            metrics: vec![],
        }])
    }
}

#[tokio::test]
async fn test_category_loops_are_isolated() {
    let endpoint = Arc::new(PerCategoryEndpoint);
    let hub = Arc::new(BroadcastHub::with_defaults());
    let cancel = CancellationToken::new();

    let mut states = Vec::new();
    for name in ["fail", "gappers_up", "momentum"] {
        let state = Arc::new(CategoryState::new());
        let sync = CategorySynchronizer::new(
            CategorySyncConfig {
                category: name.to_string(),
                interval: Duration::from_millis(10),
                max_rows: 50,
            },
            Arc::clone(&endpoint) as Arc<dyn MarketDataPort>,
            Arc::clone(&hub),
            Arc::clone(&state),
            cancel.clone(),
        );
        tokio::spawn(sync.run());
        states.push((name, state));
    }

    tokio::time::sleep(Duration::from_millis(60)).await;

    for (name, state) in &states {
        if *name == "fail" {
            assert!(state.latest().is_none());
        } else {
            let snapshot = state.latest().expect("healthy category must publish");
            assert_eq!(snapshot.category, *name);
            assert_eq!(snapshot.rows[0].ticker, name.to_uppercase());
        }
    }

    cancel.cancel();
}
