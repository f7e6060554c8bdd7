//! Squawk Service
//!
//! Actor that owns the alert backlog and serializes announcements into
//! the speech device one at a time. Producers and UI widgets hold a
//! cloneable [`Squawk`] handle; commands travel over an unbounded channel
//! (the backlog is deliberately uncapped for a human-paced alert stream),
//! and every state transition is broadcast so any number of squawk
//! widgets render identical state.
//!
//! # State machine
//!
//! - **Idle**: queue empty, nothing speaking.
//! - **Draining**: one event at the device; the next is not dequeued
//!   until the current utterance completes, fails, is skipped, or the
//!   watchdog expires.
//! - **Suspended**: `enabled == false`. The backlog is kept; draining
//!   resumes from the head on re-enable. Disabling mid-utterance lets the
//!   current utterance finish naturally.
//!
//! Device failure and watchdog expiry are treated exactly like
//! completion: log and advance, so a broken device can never wedge the
//! queue.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{SpeechOutcome, SpeechPort};
use crate::domain::alert::{AlertEvent, AlertQueue, PushOutcome, SquawkState};
use crate::infrastructure::broadcast::SharedBroadcastHub;

/// Configuration for the squawk service.
#[derive(Debug, Clone, Copy)]
pub struct SquawkConfig {
    /// Upper bound on a single utterance. Expiry stops the device and
    /// advances; the reference behavior has no timeout, this is a
    /// robustness guard against a stuck device.
    pub watchdog: Duration,
}

impl Default for SquawkConfig {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(30),
        }
    }
}

/// Commands accepted by the squawk actor.
#[derive(Debug)]
enum SquawkCommand {
    Push(AlertEvent),
    Enable,
    Disable,
    Skip,
}

/// Cloneable handle to the squawk actor.
///
/// All operations are fire-and-forget sends; if the actor has shut down
/// they become no-ops.
#[derive(Debug, Clone)]
pub struct Squawk {
    tx: mpsc::UnboundedSender<SquawkCommand>,
    shared: Arc<RwLock<SquawkState>>,
}

impl Squawk {
    /// Queue an alert for announcement.
    pub fn push(&self, event: AlertEvent) {
        let _ = self.tx.send(SquawkCommand::Push(event));
    }

    /// Resume draining from the head of the backlog.
    pub fn enable(&self) {
        let _ = self.tx.send(SquawkCommand::Enable);
    }

    /// Suspend draining. The backlog is kept; an in-progress utterance
    /// finishes naturally.
    pub fn disable(&self) {
        let _ = self.tx.send(SquawkCommand::Disable);
    }

    /// Stop the current utterance, if any, and advance.
    pub fn skip(&self) {
        let _ = self.tx.send(SquawkCommand::Skip);
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> SquawkState {
        self.shared.read().clone()
    }
}

/// The squawk actor. Owns all mutable squawk state; spawned once.
pub struct SquawkService {
    config: SquawkConfig,
    speech: Arc<dyn SpeechPort>,
    hub: SharedBroadcastHub,
    rx: mpsc::UnboundedReceiver<SquawkCommand>,
    shared: Arc<RwLock<SquawkState>>,
    queue: AlertQueue,
    enabled: bool,
    speaking: Option<AlertEvent>,
    /// All handles dropped; exit once the backlog has drained.
    closed: bool,
    cancel: CancellationToken,
}

impl SquawkService {
    /// Create the actor and its public handle.
    #[must_use]
    pub fn new(
        config: SquawkConfig,
        speech: Arc<dyn SpeechPort>,
        hub: SharedBroadcastHub,
        cancel: CancellationToken,
    ) -> (Self, Squawk) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(RwLock::new(SquawkState::default()));
        let service = Self {
            config,
            speech,
            hub,
            rx,
            shared: Arc::clone(&shared),
            queue: AlertQueue::new(),
            enabled: true,
            speaking: None,
            closed: false,
            cancel,
        };
        (service, Squawk { tx, shared })
    }

    /// Run the actor until cancelled or until every handle is dropped and
    /// the backlog is empty.
    pub async fn run(mut self) {
        self.publish_state();

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // Commands that arrived during the last utterance apply before
            // the next dequeue, so a disable sent mid-utterance always
            // suspends before another event is spoken.
            self.drain_pending_commands();

            // speaking=false with a non-empty queue is transient: drain
            // immediately unless suspended.
            if self.enabled {
                if let Some(event) = self.queue.pop() {
                    self.announce(event).await;
                    continue;
                }
            }

            if self.closed {
                break;
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.apply_idle(cmd),
                    None => self.closed = true,
                }
            }
        }

        tracing::debug!("squawk service stopped");
    }

    /// Apply every command already sitting in the mailbox.
    fn drain_pending_commands(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => self.apply_idle(cmd),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }

    /// Handle a command while nothing is being spoken.
    fn apply_idle(&mut self, cmd: SquawkCommand) {
        match cmd {
            SquawkCommand::Push(event) => self.accept(event),
            SquawkCommand::Enable => self.set_enabled(true),
            SquawkCommand::Disable => self.set_enabled(false),
            // Nothing to skip.
            SquawkCommand::Skip => {}
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.publish_state();
        }
    }

    /// Apply the dedup rules and enqueue.
    fn accept(&mut self, event: AlertEvent) {
        if self.speaking.as_ref().is_some_and(|s| s.id == event.id) {
            tracing::debug!(id = %event.id, "duplicate of in-flight announcement dropped");
            return;
        }
        match self.queue.push(event) {
            PushOutcome::Queued => self.publish_state(),
            PushOutcome::Coalesced => {
                tracing::debug!("duplicate alert coalesced into existing entry");
            }
        }
    }

    /// Speak one event to its end (completion, failure, skip, watchdog, or
    /// shutdown), processing commands the whole time.
    async fn announce(&mut self, event: AlertEvent) {
        tracing::info!(
            id = %event.id,
            priority = ?event.priority,
            backlog = self.queue.len(),
            "announcing alert"
        );
        self.speaking = Some(event.clone());
        self.publish_state();

        let speech = Arc::clone(&self.speech);
        let text = event.text.clone();
        let utterance =
            tokio::time::timeout(self.config.watchdog, async move { speech.speak(&text).await });
        tokio::pin!(utterance);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.speech.stop().await;
                    break;
                }
                result = &mut utterance => {
                    match result {
                        Ok(Ok(SpeechOutcome::Completed)) => {
                            tracing::debug!(id = %event.id, "utterance completed");
                        }
                        Ok(Ok(SpeechOutcome::Stopped)) => {
                            tracing::debug!(id = %event.id, "utterance stopped by device");
                        }
                        Ok(Err(e)) => {
                            // Recovery policy: a device failure advances the
                            // queue exactly like a completion.
                            tracing::warn!(id = %event.id, error = %e, "speech device failed; advancing");
                        }
                        Err(_) => {
                            tracing::warn!(
                                id = %event.id,
                                watchdog_secs = self.config.watchdog.as_secs(),
                                "speech watchdog expired; advancing"
                            );
                            self.speech.stop().await;
                        }
                    }
                    break;
                }
                cmd = self.rx.recv(), if !self.closed => match cmd {
                    Some(SquawkCommand::Skip) => {
                        self.speech.stop().await;
                        break;
                    }
                    Some(SquawkCommand::Push(e)) => self.accept(e),
                    Some(SquawkCommand::Enable) => self.set_enabled(true),
                    // The in-progress utterance finishes; draining stays
                    // suspended afterwards.
                    Some(SquawkCommand::Disable) => self.set_enabled(false),
                    None => self.closed = true,
                }
            }
        }

        self.speaking = None;
        self.publish_state();
    }

    fn publish_state(&self) {
        let state = SquawkState {
            enabled: self.enabled,
            speaking: self.speaking.clone(),
            queue: self.queue.to_vec(),
        };
        *self.shared.write() = state.clone();
        let _ = self.hub.send_squawk(state);
    }
}
