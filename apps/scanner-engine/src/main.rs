//! Scanner Engine Binary
//!
//! Starts the scanner synchronization and squawk core.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin scanner-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `SCANNER_ENDPOINT_URL`: Base URL of the scanner data endpoint
//!
//! ## Optional
//! - `SCANNER_SESSION_INTERVAL_SECS`: Session poll interval (default: 30)
//! - `SCANNER_CATEGORY_INTERVAL_SECS`: Category poll interval (default: 10)
//! - `SCANNER_CATEGORIES`: Comma-separated category list
//! - `SCANNER_MAX_ROWS`: Rows kept per category snapshot (default: 50)
//! - `SCANNER_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: 10)
//! - `SQUAWK_WATCHDOG_SECS`: Utterance watchdog (default: 30)
//! - `TAPEWATCH_DATA_DIR`: Preference storage directory (default: ./data)
//! - `RUST_LOG`: Log level (default: info)

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use scanner_engine::application::services::category::{
    CategoryState, CategorySyncConfig, CategorySynchronizer,
};
use scanner_engine::application::services::pinned::PinnedRegistry;
use scanner_engine::application::services::session::{
    SessionPoller, SessionPollerConfig, SessionState,
};
use scanner_engine::application::services::squawk::{Squawk, SquawkConfig, SquawkService};
use scanner_engine::infrastructure::broadcast::{BroadcastConfig, BroadcastHub};
use scanner_engine::infrastructure::http::{ScannerApiClient, ScannerApiConfig};
use scanner_engine::infrastructure::speech::{PacedSpeech, PacedSpeechConfig};
use scanner_engine::infrastructure::store::JsonFileStore;
use scanner_engine::infrastructure::telemetry;
use scanner_engine::{
    AlertEvent, EngineConfig, MarketDataPort, PreferenceStore, SharedBroadcastHub, SpeechPort,
};

/// Category whose new rows become squawk alerts.
const ANOMALY_CATEGORY: &str = "anomalies";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    telemetry::init();
    tracing::info!("Starting scanner engine");

    let config = EngineConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Broadcast hub for state fan-out to every window.
    let hub = Arc::new(BroadcastHub::new(BroadcastConfig::from(config.broadcast)));

    // Data endpoint client, shared by all pollers.
    let market_data: Arc<dyn MarketDataPort> = Arc::new(ScannerApiClient::new(&ScannerApiConfig {
        base_url: config.endpoint.base_url.clone(),
        request_timeout: config.endpoint.request_timeout,
    })?);

    // Session poller.
    let session_state = Arc::new(SessionState::new());
    let poller = SessionPoller::new(
        SessionPollerConfig {
            interval: config.polling.session_interval,
        },
        Arc::clone(&market_data),
        Arc::clone(&hub),
        Arc::clone(&session_state),
        shutdown_token.clone(),
    );
    tokio::spawn(poller.run());

    // One fully independent synchronizer per configured category.
    for category in &config.polling.categories {
        let sync = CategorySynchronizer::new(
            CategorySyncConfig {
                category: category.clone(),
                interval: config.polling.category_interval,
                max_rows: config.polling.max_rows,
            },
            Arc::clone(&market_data),
            Arc::clone(&hub),
            Arc::new(CategoryState::new()),
            shutdown_token.clone(),
        );
        tokio::spawn(sync.run());
    }

    // Squawk actor with the paced speech adapter.
    let speech: Arc<dyn SpeechPort> = Arc::new(PacedSpeech::new(PacedSpeechConfig::default()));
    let (squawk_service, squawk) = SquawkService::new(
        SquawkConfig {
            watchdog: config.squawk.watchdog,
        },
        speech,
        Arc::clone(&hub),
        shutdown_token.clone(),
    );
    tokio::spawn(squawk_service.run());

    // Pinned commands: load once, then replicate bus updates.
    let store: Arc<dyn PreferenceStore> = Arc::new(JsonFileStore::new(
        config.store.data_dir.join("preferences.json"),
    ));
    let registry = PinnedRegistry::new(store, Arc::clone(&hub));
    registry.load().await;
    tokio::spawn(Arc::clone(&registry).run_replication(shutdown_token.clone()));

    // Bridge anomaly snapshots into squawk alerts.
    let bridge_hub = Arc::clone(&hub);
    let bridge_squawk = squawk.clone();
    let bridge_cancel = shutdown_token.clone();
    tokio::spawn(async move {
        run_anomaly_bridge(bridge_hub, bridge_squawk, bridge_cancel).await;
    });

    tracing::info!("Scanner engine ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Scanner engine stopped");
    Ok(())
}

/// Convert newly-appearing anomaly tickers into squawk alerts.
///
/// Tracks the tickers already announced for the current trading day; the
/// alert id embeds the day and ticker, so a redelivered snapshot (or a
/// second window running the same bridge) cannot double-announce.
async fn run_anomaly_bridge(hub: SharedBroadcastHub, squawk: Squawk, cancel: CancellationToken) {
    let mut rx = hub.category_rx();
    let mut announced: HashSet<String> = HashSet::new();
    let mut current_date: Option<NaiveDate> = None;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            result = rx.recv() => match result {
                Ok(snapshot) if snapshot.category == ANOMALY_CATEGORY => {
                    let date = snapshot.fetched_at.date_naive();
                    if current_date != Some(date) {
                        announced.clear();
                        current_date = Some(date);
                    }
                    for ticker in snapshot.tickers() {
                        if announced.insert(ticker.to_string()) {
                            squawk.push(
                                AlertEvent::normal(
                                    format!("anomaly:{date}:{ticker}"),
                                    format!("New anomaly {ticker}"),
                                )
                                .from_category(ANOMALY_CATEGORY),
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "anomaly bridge lagged behind snapshots");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &EngineConfig) {
    tracing::info!(
        endpoint = %config.endpoint.base_url,
        session_interval_secs = config.polling.session_interval.as_secs(),
        category_interval_secs = config.polling.category_interval.as_secs(),
        categories = config.polling.categories.len(),
        max_rows = config.polling.max_rows,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
