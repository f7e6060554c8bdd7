//! Market Session Types
//!
//! The session snapshot returned by the data endpoint: which trading phase
//! the market is currently in, and the trading date it belongs to.
//! Snapshots are immutable and replaced wholesale on each successful poll.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trading phase of the current market session.
///
/// # Wire Format (JSON)
/// ```json
/// {"current_session": "PRE_MARKET", "trading_date": "2026-08-05"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Pre-market trading (before the opening bell).
    PreMarket,
    /// Regular trading hours.
    MarketOpen,
    /// Post-market trading (after the closing bell).
    PostMarket,
    /// Market closed (overnight, weekends, holidays).
    Closed,
}

impl SessionPhase {
    /// Get the phase name as used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreMarket => "PRE_MARKET",
            Self::MarketOpen => "MARKET_OPEN",
            Self::PostMarket => "POST_MARKET",
            Self::Closed => "CLOSED",
        }
    }

    /// Check whether any trading (regular or extended) is possible.
    #[must_use]
    pub const fn is_trading(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Immutable market session snapshot.
///
/// Exclusively owned by the session poller; observers receive clones and
/// never see a partially-updated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSession {
    /// Current trading phase.
    pub current_session: SessionPhase,
    /// Trading date this session belongs to.
    pub trading_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_wire_names_round_trip() {
        for phase in [
            SessionPhase::PreMarket,
            SessionPhase::MarketOpen,
            SessionPhase::PostMarket,
            SessionPhase::Closed,
        ] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase.as_str()));
            let back: SessionPhase = serde_json::from_str(&json).unwrap();
            assert_eq!(back, phase);
        }
    }

    #[test]
    fn session_deserializes_from_endpoint_shape() {
        let session: MarketSession =
            serde_json::from_str(r#"{"current_session": "MARKET_OPEN", "trading_date": "2026-08-05"}"#)
                .unwrap();
        assert_eq!(session.current_session, SessionPhase::MarketOpen);
        assert_eq!(
            session.trading_date,
            NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
        );
    }

    #[test]
    fn closed_is_not_trading() {
        assert!(!SessionPhase::Closed.is_trading());
        assert!(SessionPhase::PreMarket.is_trading());
        assert!(SessionPhase::MarketOpen.is_trading());
        assert!(SessionPhase::PostMarket.is_trading());
    }
}
