//! Pinned Commands Registry
//!
//! Replicates the ordered favorite-command list across every open UI
//! instance. Each instance owns a registry; the durable store is the
//! arbiter of truth and the broadcast bus is the catch-up channel.
//!
//! # Synchronization
//!
//! Every local mutation writes the full list to the store (best-effort)
//! and broadcasts it tagged with this instance's writer id. The
//! replication task applies bus updates verbatim (last-writer-wins, no
//! merge) while two guards prevent feedback loops: updates carrying our
//! own writer id are ignored, and an `applying_external` flag keeps a
//! reacting caller from re-persisting the value it was just handed.
//!
//! A store that cannot be read degrades to the in-memory defaults for the
//! session; a failed write logs and leaves the in-memory mutation intact.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::PreferenceStore;
use crate::domain::pinned::PinnedList;
use crate::infrastructure::broadcast::{PinnedUpdate, SharedBroadcastHub};

/// Durable-store key for the pinned-command list.
pub const PINNED_COMMANDS_KEY: &str = "tapewatch.pinned_commands";

/// Per-instance pinned-command registry.
pub struct PinnedRegistry {
    id: Uuid,
    store: Arc<dyn PreferenceStore>,
    hub: SharedBroadcastHub,
    list: RwLock<PinnedList>,
    loaded: AtomicBool,
    applying_external: AtomicBool,
}

impl PinnedRegistry {
    /// Create a registry with the default list; call [`load`](Self::load)
    /// before trusting [`pinned`](Self::pinned).
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, hub: SharedBroadcastHub) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            store,
            hub,
            list: RwLock::new(PinnedList::with_defaults()),
            loaded: AtomicBool::new(false),
            applying_external: AtomicBool::new(false),
        })
    }

    /// Writer id used to tag this instance's broadcasts.
    #[must_use]
    pub fn writer_id(&self) -> Uuid {
        self.id
    }

    /// Read the initial value from the durable store.
    ///
    /// Absent key keeps the defaults; a read failure logs and keeps the
    /// defaults in memory only. Either way the registry counts as loaded
    /// afterwards, so consumers stop showing placeholder state.
    pub async fn load(&self) {
        match self.store.get(PINNED_COMMANDS_KEY).await {
            Ok(Some(ids)) => {
                *self.list.write() = PinnedList::from_ids(ids);
            }
            Ok(None) => {
                tracing::debug!("no stored pinned commands; using defaults");
            }
            Err(e) => {
                tracing::warn!(error = %e, "pinned-command store unavailable; using in-memory defaults");
            }
        }
        self.loaded.store(true, Ordering::SeqCst);
    }

    /// Whether the initial store read has completed.
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Check whether a command is pinned.
    #[must_use]
    pub fn is_pinned(&self, id: &str) -> bool {
        self.list.read().is_pinned(id)
    }

    /// Pinned command ids in display order.
    #[must_use]
    pub fn pinned(&self) -> Vec<String> {
        self.list.read().ids().to_vec()
    }

    /// Pin the command if absent, unpin it if present.
    ///
    /// Returns `true` when the command is pinned after the call.
    pub async fn toggle_pin(&self, id: &str) -> bool {
        let (now_pinned, ids) = {
            let mut list = self.list.write();
            let now_pinned = list.toggle(id);
            (now_pinned, list.ids().to_vec())
        };
        self.persist_and_broadcast(ids).await;
        now_pinned
    }

    /// Move the pinned command at `from` to position `to`.
    ///
    /// Out-of-bounds indices are a no-op and return `false` without
    /// touching the store or the bus.
    pub async fn reorder_pinned(&self, from: usize, to: usize) -> bool {
        let (moved, ids) = {
            let mut list = self.list.write();
            let moved = list.reorder(from, to);
            (moved, list.ids().to_vec())
        };
        if moved {
            self.persist_and_broadcast(ids).await;
        }
        moved
    }

    /// Apply an update received from the bus.
    ///
    /// Our own broadcasts are ignored; everything else replaces the local
    /// copy verbatim (last-writer-wins).
    pub fn apply_update(&self, update: &PinnedUpdate) {
        if update.writer == self.id {
            return;
        }
        self.applying_external.store(true, Ordering::SeqCst);
        self.list.write().replace(update.commands.iter().cloned());
        self.applying_external.store(false, Ordering::SeqCst);
        tracing::debug!(writer = %update.writer, "applied external pinned-command update");
    }

    /// Listen on the bus and apply sibling updates until cancelled.
    pub async fn run_replication(self: Arc<Self>, cancel: CancellationToken) {
        let mut rx = self.hub.pinned_rx();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                result = rx.recv() => match result {
                    Ok(update) => self.apply_update(&update),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Only the newest value matters; missed
                        // intermediates are already superseded.
                        tracing::debug!(skipped, "pinned-command receiver lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    async fn persist_and_broadcast(&self, ids: Vec<String>) {
        if self.applying_external.load(Ordering::SeqCst) {
            // A mutation issued while an external update is being applied
            // would re-persist and re-broadcast the value we were just
            // handed, looping the notification.
            return;
        }
        if let Err(e) = self.store.set(PINNED_COMMANDS_KEY, &ids).await {
            tracing::warn!(error = %e, "failed to persist pinned commands; keeping in-memory value");
        }
        let _ = self.hub.send_pinned(PinnedUpdate {
            writer: self.id,
            commands: ids,
        });
    }
}
