//! Long-Running Services
//!
//! Each service is an independently owned task with an explicit
//! start/stop lifecycle: construction wires dependencies, `run()` is
//! spawned by the owner, and a `CancellationToken` stops the loop
//! deterministically.

/// Market session polling.
pub mod session;

/// Per-category scanner table polling.
pub mod category;

/// Alert announcement queue.
pub mod squawk;

/// Cross-window pinned-command replication.
pub mod pinned;
