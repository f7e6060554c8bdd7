//! Alert Events and Squawk Queue Ordering
//!
//! Pure queue logic for the squawk pipeline: arrival-order FIFO with
//! duplicate-id coalescing and urgent-priority promotion. The async drain
//! loop lives in the application layer; everything here is synchronous and
//! exhaustively unit-tested.
//!
//! # Ordering rules
//!
//! - Normal events append in arrival order.
//! - Urgent events queue FIFO among themselves, ahead of every queued
//!   normal event. They never displace whatever is currently being spoken;
//!   preemption is only ever an explicit skip.
//! - A push whose `id` is already queued coalesces into the existing entry,
//!   keeping the earliest `created_at`. The first arrival's text and
//!   priority win.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Alert Events
// =============================================================================

/// Priority of an alert event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    /// Announced in arrival order.
    #[default]
    Normal,
    /// Jumps ahead of queued normal events.
    Urgent,
}

/// A single announceable alert.
///
/// Produced by any number of independent sources (price triggers, news
/// feed, anomaly scans). `id` is the deduplication key across redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Unique identifier; duplicate pushes with the same id collapse.
    pub id: String,
    /// Text handed to the speech device verbatim.
    pub text: String,
    /// Announcement priority.
    pub priority: AlertPriority,
    /// Time the event was first produced.
    pub created_at: DateTime<Utc>,
    /// Category that produced the event, if any.
    pub source_category: Option<String>,
}

impl AlertEvent {
    /// Create a normal-priority event with the current timestamp.
    #[must_use]
    pub fn normal(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            priority: AlertPriority::Normal,
            created_at: Utc::now(),
            source_category: None,
        }
    }

    /// Create an urgent-priority event with the current timestamp.
    #[must_use]
    pub fn urgent(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            priority: AlertPriority::Urgent,
            ..Self::normal(id, text)
        }
    }

    /// Attach the category that produced this event.
    #[must_use]
    pub fn from_category(mut self, category: impl Into<String>) -> Self {
        self.source_category = Some(category.into());
        self
    }
}

// =============================================================================
// Queue
// =============================================================================

/// Outcome of pushing an event into the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The event was enqueued as a new entry.
    Queued,
    /// An entry with the same id already existed; the push collapsed into
    /// it (earliest `created_at` retained).
    Coalesced,
}

/// Ordered backlog of alert events awaiting announcement.
///
/// The queue is deliberately uncapped: the alert stream is human-paced,
/// and the backlog size is broadcast so an operator can disable the
/// squawk instead of the queue silently dropping events.
#[derive(Debug, Clone, Default)]
pub struct AlertQueue {
    events: VecDeque<AlertEvent>,
}

impl AlertQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event, applying the coalescing and priority rules.
    pub fn push(&mut self, event: AlertEvent) -> PushOutcome {
        if let Some(existing) = self.events.iter_mut().find(|e| e.id == event.id) {
            if event.created_at < existing.created_at {
                existing.created_at = event.created_at;
            }
            return PushOutcome::Coalesced;
        }

        match event.priority {
            AlertPriority::Urgent => {
                // Behind any urgent events already waiting, ahead of all
                // queued normal events.
                let pos = self
                    .events
                    .iter()
                    .take_while(|e| e.priority == AlertPriority::Urgent)
                    .count();
                self.events.insert(pos, event);
            }
            AlertPriority::Normal => self.events.push_back(event),
        }
        PushOutcome::Queued
    }

    /// Dequeue the head event, if any.
    pub fn pop(&mut self) -> Option<AlertEvent> {
        self.events.pop_front()
    }

    /// Check whether an event with the given id is queued.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Copy of the queued events in announcement order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<AlertEvent> {
        self.events.iter().cloned().collect()
    }
}

// =============================================================================
// Published State
// =============================================================================

/// Live squawk state, broadcast to observers on every transition.
///
/// Owned exclusively by the squawk service; observers receive read-only
/// copies. `speaking` holds the event currently at the device, which has
/// already been dequeued and is therefore never also present in `queue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquawkState {
    /// Whether draining is active.
    pub enabled: bool,
    /// Event currently being spoken, if any.
    pub speaking: Option<AlertEvent>,
    /// Backlog in announcement order.
    pub queue: Vec<AlertEvent>,
}

impl SquawkState {
    /// Backlog size, for operator display.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }
}

impl Default for SquawkState {
    fn default() -> Self {
        Self {
            enabled: true,
            speaking: None,
            queue: Vec::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
