//! Port Interfaces
//!
//! Contracts for the external collaborators THE CORE consumes, following
//! the Hexagonal Architecture pattern. Infrastructure adapters implement
//! these; services depend only on the traits.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`MarketDataPort`]: the scanner data endpoint (session + category lists)
//! - [`SpeechPort`]: the opaque text-to-speech device
//! - [`PreferenceStore`]: the durable key -> string-list preference store

use async_trait::async_trait;

use crate::domain::scanner::CategoryRow;
use crate::domain::session::MarketSession;

// =============================================================================
// Data Endpoint
// =============================================================================

/// Error from the scanner data endpoint.
///
/// Pollers treat every variant identically: log, retain the previous
/// snapshot, retry on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
    /// Endpoint answered with a non-success status.
    #[error("endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// Response body did not match the expected shape.
    #[error("malformed response body: {0}")]
    Malformed(String),
}

/// Read access to the market data endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch the current market session snapshot.
    async fn fetch_session(&self) -> Result<MarketSession, MarketDataError>;

    /// Fetch the current row list for a named category.
    async fn fetch_category(&self, category: &str) -> Result<Vec<CategoryRow>, MarketDataError>;
}

// =============================================================================
// Speech Device
// =============================================================================

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The device finished speaking the full text.
    Completed,
    /// The utterance was cut short by [`SpeechPort::stop`].
    Stopped,
}

/// Error signalled by the speech device.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The device reported a failure instead of completing.
    #[error("speech device failure: {0}")]
    Device(String),
}

/// The opaque speech device.
///
/// `speak` resolves when the utterance completes, is stopped, or fails,
/// never before. The squawk drain loop awaits exactly one `speak` at a
/// time, which is what guarantees at-most-one active utterance
/// system-wide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechPort: Send + Sync {
    /// Speak the given text to completion or until stopped.
    async fn speak(&self, text: &str) -> Result<SpeechOutcome, SpeechError>;

    /// Request that the current utterance, if any, stop early.
    async fn stop(&self);
}

// =============================================================================
// Durable Store
// =============================================================================

/// Error from the durable preference store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failed (missing directory, quota, permissions).
    #[error("store I/O error: {0}")]
    Io(String),
    /// Stored contents could not be parsed.
    #[error("corrupt store contents: {0}")]
    Corrupt(String),
}

/// Durable key -> ordered-list-of-strings persistence surface.
///
/// The only resource in THE CORE with multiple potential writers; callers
/// resolve conflicts with last-writer-wins plus bus rebroadcast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read the list stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// Replace the list stored under `key`.
    async fn set(&self, key: &str, values: &[String]) -> Result<(), StoreError>;
}
