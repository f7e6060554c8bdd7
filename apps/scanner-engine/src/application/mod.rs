//! Application layer - Port definitions and long-running services.

/// Interfaces for the data endpoint, speech device, and durable store.
pub mod ports;

/// Polling, squawk, and replication services.
pub mod services;
