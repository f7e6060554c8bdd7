//! Engine Configuration Settings
//!
//! Configuration types for the scanner engine, loaded from environment
//! variables with tolerant parsing: a present but unparsable value falls
//! back to the default.

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::broadcast::BroadcastConfig;

/// Data endpoint settings.
#[derive(Debug, Clone)]
pub struct EndpointSettings {
    /// Base URL of the scanner data endpoint.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Polling cadence and bounds.
#[derive(Debug, Clone)]
pub struct PollingSettings {
    /// Interval between market-session fetches.
    pub session_interval: Duration,
    /// Interval between category fetches (per category).
    pub category_interval: Duration,
    /// Categories to synchronize at startup.
    pub categories: Vec<String>,
    /// Maximum rows kept per category snapshot.
    pub max_rows: usize,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            session_interval: Duration::from_secs(30),
            category_interval: Duration::from_secs(10),
            categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
            max_rows: 50,
        }
    }
}

/// Squawk settings.
#[derive(Debug, Clone, Copy)]
pub struct SquawkSettings {
    /// Watchdog timeout for a single utterance.
    pub watchdog: Duration,
}

impl Default for SquawkSettings {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(30),
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Directory holding the preference file.
    pub data_dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastSettings {
    /// Capacity of the market session channel.
    pub session_capacity: usize,
    /// Capacity of the category snapshot channel.
    pub category_capacity: usize,
    /// Capacity of the squawk state channel.
    pub squawk_capacity: usize,
    /// Capacity of the pinned-command channel.
    pub pinned_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            session_capacity: 16,
            category_capacity: 256,
            squawk_capacity: 64,
            pinned_capacity: 16,
        }
    }
}

impl From<BroadcastSettings> for BroadcastConfig {
    fn from(settings: BroadcastSettings) -> Self {
        Self {
            session_capacity: settings.session_capacity,
            category_capacity: settings.category_capacity,
            squawk_capacity: settings.squawk_capacity,
            pinned_capacity: settings.pinned_capacity,
        }
    }
}

/// Categories synchronized when `SCANNER_CATEGORIES` is unset.
const DEFAULT_CATEGORIES: [&str; 7] = [
    "gappers_up",
    "gappers_down",
    "high_volume",
    "anomalies",
    "momentum",
    "new_highs",
    "new_lows",
];

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Data endpoint settings.
    pub endpoint: EndpointSettings,
    /// Polling cadence and bounds.
    pub polling: PollingSettings,
    /// Squawk settings.
    pub squawk: SquawkSettings,
    /// Durable store settings.
    pub store: StoreSettings,
    /// Broadcast channel settings.
    pub broadcast: BroadcastSettings,
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SCANNER_ENDPOINT_URL` is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("SCANNER_ENDPOINT_URL")
            .map_err(|_| ConfigError::MissingEnvVar("SCANNER_ENDPOINT_URL".to_string()))?;
        if base_url.is_empty() {
            return Err(ConfigError::EmptyValue("SCANNER_ENDPOINT_URL".to_string()));
        }

        let endpoint = EndpointSettings {
            base_url,
            request_timeout: parse_env_duration_secs(
                "SCANNER_REQUEST_TIMEOUT_SECS",
                Duration::from_secs(10),
            ),
        };

        let polling_defaults = PollingSettings::default();
        let polling = PollingSettings {
            session_interval: parse_env_duration_secs(
                "SCANNER_SESSION_INTERVAL_SECS",
                polling_defaults.session_interval,
            ),
            category_interval: parse_env_duration_secs(
                "SCANNER_CATEGORY_INTERVAL_SECS",
                polling_defaults.category_interval,
            ),
            categories: std::env::var("SCANNER_CATEGORIES")
                .ok()
                .map_or(polling_defaults.categories, |v| parse_categories(&v)),
            max_rows: parse_env_usize("SCANNER_MAX_ROWS", polling_defaults.max_rows),
        };

        let squawk = SquawkSettings {
            watchdog: parse_env_duration_secs(
                "SQUAWK_WATCHDOG_SECS",
                SquawkSettings::default().watchdog,
            ),
        };

        let store = StoreSettings {
            data_dir: std::env::var("TAPEWATCH_DATA_DIR")
                .map_or(StoreSettings::default().data_dir, PathBuf::from),
        };

        let broadcast_defaults = BroadcastSettings::default();
        let broadcast = BroadcastSettings {
            session_capacity: parse_env_usize(
                "TAPEWATCH_SESSION_CAPACITY",
                broadcast_defaults.session_capacity,
            ),
            category_capacity: parse_env_usize(
                "TAPEWATCH_CATEGORY_CAPACITY",
                broadcast_defaults.category_capacity,
            ),
            squawk_capacity: parse_env_usize(
                "TAPEWATCH_SQUAWK_CAPACITY",
                broadcast_defaults.squawk_capacity,
            ),
            pinned_capacity: parse_env_usize(
                "TAPEWATCH_PINNED_CAPACITY",
                broadcast_defaults.pinned_capacity,
            ),
        };

        Ok(Self {
            endpoint,
            polling,
            squawk,
            store,
            broadcast,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_categories(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_defaults() {
        let settings = PollingSettings::default();
        assert_eq!(settings.session_interval, Duration::from_secs(30));
        assert_eq!(settings.category_interval, Duration::from_secs(10));
        assert_eq!(settings.max_rows, 50);
        assert!(settings.categories.contains(&"gappers_up".to_string()));
        assert!(settings.categories.contains(&"anomalies".to_string()));
    }

    #[test]
    fn squawk_defaults() {
        assert_eq!(SquawkSettings::default().watchdog, Duration::from_secs(30));
    }

    #[test]
    fn broadcast_settings_convert_to_config() {
        let settings = BroadcastSettings {
            session_capacity: 4,
            category_capacity: 8,
            squawk_capacity: 16,
            pinned_capacity: 2,
        };
        let config = BroadcastConfig::from(settings);
        assert_eq!(config.session_capacity, 4);
        assert_eq!(config.category_capacity, 8);
        assert_eq!(config.squawk_capacity, 16);
        assert_eq!(config.pinned_capacity, 2);
    }

    #[test]
    fn category_list_parsing() {
        assert_eq!(
            parse_categories("gappers_up, momentum ,,new_lows"),
            vec!["gappers_up", "momentum", "new_lows"]
        );
        assert!(parse_categories("").is_empty());
    }
}
