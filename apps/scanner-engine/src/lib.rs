#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Scanner Engine - Live Scanner Synchronization & Squawk Core
//!
//! The headless core of the Tapewatch market-data dashboard. It keeps
//! any number of window-local table views consistent with periodically
//! refreshed scanner snapshots, and serializes alert events into a
//! speech device one at a time without duplicates across windows.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Pure data and ordering logic
//!   - `session`: market session snapshots
//!   - `scanner`: category rows and snapshots
//!   - `alert`: alert events and queue ordering
//!   - `pinned`: pinned command list invariants
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: interfaces for the data endpoint, speech device, store
//!   - `services`: session poller, category synchronizers, squawk actor,
//!     pinned-command replication
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `http`: reqwest client for the data endpoint
//!   - `broadcast`: channel-based state fan-out
//!   - `store`: durable preference storage
//!   - `speech`: speech device adapters
//!   - `config` / `telemetry`: wiring concerns
//!
//! # Data Flow
//!
//! ```text
//! Data endpoint --> Session poller ----------+
//!               --> Category sync (per cat) -+--> Broadcast hub --> windows
//!                        |                                   ^
//!                        v (anomaly alerts)                  |
//!                   Squawk queue --> speech device    Pinned registry <-> store
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure scanner and squawk types.
pub mod domain;

/// Application layer - Ports and long-running services.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::alert::{AlertEvent, AlertPriority, AlertQueue, PushOutcome, SquawkState};
pub use domain::pinned::{DEFAULT_PINNED, PinnedList};
pub use domain::scanner::{CategoryRow, CategorySnapshot};
pub use domain::session::{MarketSession, SessionPhase};

// Ports
pub use application::ports::{
    MarketDataError, MarketDataPort, PreferenceStore, SpeechError, SpeechOutcome, SpeechPort,
    StoreError,
};

// Services
pub use application::services::category::{CategoryState, CategorySyncConfig, CategorySynchronizer};
pub use application::services::pinned::{PINNED_COMMANDS_KEY, PinnedRegistry};
pub use application::services::session::{SessionPoller, SessionPollerConfig, SessionState};
pub use application::services::squawk::{Squawk, SquawkConfig, SquawkService};

// Infrastructure
pub use infrastructure::broadcast::{
    BroadcastConfig, BroadcastHub, PinnedUpdate, SharedBroadcastHub,
};
pub use infrastructure::config::{
    BroadcastSettings, ConfigError, EndpointSettings, EngineConfig, PollingSettings,
    SquawkSettings, StoreSettings,
};
pub use infrastructure::http::{ScannerApiClient, ScannerApiConfig};
pub use infrastructure::speech::{PacedSpeech, PacedSpeechConfig};
pub use infrastructure::store::{JsonFileStore, MemoryStore};
