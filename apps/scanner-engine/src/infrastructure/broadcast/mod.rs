//! Broadcast Hub
//!
//! Implements state fan-out using tokio broadcast channels so that any
//! number of independent window-local observers (main window plus detached
//! standalone windows) see identical state without direct references to
//! each other.
//!
//! # Topics
//!
//! - Market session snapshots from the session poller
//! - Category snapshots from every synchronizer (one channel; the payload
//!   carries the category name)
//! - Squawk state transitions
//! - Pinned-command updates, tagged with the writing instance's id
//!
//! Each channel supports multiple receivers with configurable capacity.
//! Payloads are always owned clones; no receiver can mutate the owner's
//! state.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::alert::SquawkState;
use crate::domain::scanner::CategorySnapshot;
use crate::domain::session::MarketSession;

// =============================================================================
// Broadcast Messages
// =============================================================================

/// Pinned-command list update, tagged with its writer.
///
/// Receivers apply `commands` verbatim (last-writer-wins) unless `writer`
/// is their own id, which suppresses echo loops.
#[derive(Debug, Clone)]
pub struct PinnedUpdate {
    /// Registry instance that performed the mutation.
    pub writer: Uuid,
    /// Full replacement command list.
    pub commands: Vec<String>,
}

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Configuration for broadcast channel capacities.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Capacity for the market session channel.
    pub session_capacity: usize,
    /// Capacity for the category snapshot channel.
    pub category_capacity: usize,
    /// Capacity for the squawk state channel.
    pub squawk_capacity: usize,
    /// Capacity for the pinned-command channel.
    pub pinned_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            session_capacity: 16,
            category_capacity: 256,
            squawk_capacity: 64,
            pinned_capacity: 16,
        }
    }
}

/// Central hub for all broadcast channels.
///
/// # Example
///
/// ```rust
/// use scanner_engine::infrastructure::broadcast::{BroadcastConfig, BroadcastHub};
///
/// let hub = BroadcastHub::new(BroadcastConfig::default());
///
/// // A widget subscribes to squawk state...
/// let mut rx = hub.squawk_rx();
///
/// // ...and the squawk service publishes transitions:
/// // hub.send_squawk(state);
/// ```
#[derive(Debug)]
pub struct BroadcastHub {
    session_tx: broadcast::Sender<MarketSession>,
    category_tx: broadcast::Sender<CategorySnapshot>,
    squawk_tx: broadcast::Sender<SquawkState>,
    pinned_tx: broadcast::Sender<PinnedUpdate>,
}

impl BroadcastHub {
    /// Create a new broadcast hub with the given configuration.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            session_tx: broadcast::channel(config.session_capacity).0,
            category_tx: broadcast::channel(config.category_capacity).0,
            squawk_tx: broadcast::channel(config.squawk_capacity).0,
            pinned_tx: broadcast::channel(config.pinned_capacity).0,
        }
    }

    /// Create a new broadcast hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BroadcastConfig::default())
    }

    // =========================================================================
    // Market Session Channel
    // =========================================================================

    /// Publish a session snapshot to all subscribers.
    ///
    /// Returns the number of receivers, or `None` if nobody is listening.
    pub fn send_session(&self, session: MarketSession) -> Option<usize> {
        self.session_tx.send(session).ok()
    }

    /// Get a new receiver for session snapshots.
    #[must_use]
    pub fn session_rx(&self) -> broadcast::Receiver<MarketSession> {
        self.session_tx.subscribe()
    }

    /// Number of active session receivers.
    #[must_use]
    pub fn session_receiver_count(&self) -> usize {
        self.session_tx.receiver_count()
    }

    // =========================================================================
    // Category Snapshot Channel
    // =========================================================================

    /// Publish a category snapshot to all subscribers.
    pub fn send_category(&self, snapshot: CategorySnapshot) -> Option<usize> {
        self.category_tx.send(snapshot).ok()
    }

    /// Get a new receiver for category snapshots (all categories).
    #[must_use]
    pub fn category_rx(&self) -> broadcast::Receiver<CategorySnapshot> {
        self.category_tx.subscribe()
    }

    /// Number of active category receivers.
    #[must_use]
    pub fn category_receiver_count(&self) -> usize {
        self.category_tx.receiver_count()
    }

    // =========================================================================
    // Squawk State Channel
    // =========================================================================

    /// Publish a squawk state transition to all subscribers.
    pub fn send_squawk(&self, state: SquawkState) -> Option<usize> {
        self.squawk_tx.send(state).ok()
    }

    /// Get a new receiver for squawk state transitions.
    #[must_use]
    pub fn squawk_rx(&self) -> broadcast::Receiver<SquawkState> {
        self.squawk_tx.subscribe()
    }

    /// Number of active squawk receivers.
    #[must_use]
    pub fn squawk_receiver_count(&self) -> usize {
        self.squawk_tx.receiver_count()
    }

    // =========================================================================
    // Pinned Command Channel
    // =========================================================================

    /// Publish a pinned-command update to all sibling instances.
    pub fn send_pinned(&self, update: PinnedUpdate) -> Option<usize> {
        self.pinned_tx.send(update).ok()
    }

    /// Get a new receiver for pinned-command updates.
    #[must_use]
    pub fn pinned_rx(&self) -> broadcast::Receiver<PinnedUpdate> {
        self.pinned_tx.subscribe()
    }

    /// Number of active pinned-command receivers.
    #[must_use]
    pub fn pinned_receiver_count(&self) -> usize {
        self.pinned_tx.receiver_count()
    }
}

/// Shared broadcast hub reference.
pub type SharedBroadcastHub = Arc<BroadcastHub>;

// =============================================================================
// Tests
// =============================================================================
