//! Infrastructure layer - Adapters and external integrations.

/// State fan-out over tokio broadcast channels.
pub mod broadcast;

/// Environment-driven configuration.
pub mod config;

/// HTTP client for the scanner data endpoint.
pub mod http;

/// Speech device adapters.
pub mod speech;

/// Durable preference store adapters.
pub mod store;

/// Tracing initialization.
pub mod telemetry;
