//! Scanner Category Types
//!
//! Row and snapshot types for the category tables (gappers up/down, high
//! volume, anomalies, momentum, new highs/lows). Rows arrive pre-computed
//! and pre-ranked from the data endpoint; this crate only refreshes,
//! bounds, and fans them out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single display row in a category table.
///
/// Metrics are opaque, order-significant display fields (gap %, volume,
/// price, ...) whose meaning is defined by the rendering layer per
/// category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    /// Ticker symbol for the row.
    pub ticker: String,
    /// Pre-computed numeric display fields, in column order.
    pub metrics: Vec<Decimal>,
}

/// Immutable snapshot of one category table.
///
/// All rows in a snapshot share the single `fetched_at` timestamp; a new
/// snapshot fully replaces the old one, so observers never see a mix of
/// stale and fresh rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Category name (e.g. `gappers_up`).
    pub category: String,
    /// Ordered rows, bounded to the configured maximum.
    pub rows: Vec<CategoryRow>,
    /// Time the rows were fetched.
    pub fetched_at: DateTime<Utc>,
}

impl CategorySnapshot {
    /// Build a snapshot from freshly fetched rows, truncating to `max_rows`.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        mut rows: Vec<CategoryRow>,
        fetched_at: DateTime<Utc>,
        max_rows: usize,
    ) -> Self {
        rows.truncate(max_rows);
        Self {
            category: category.into(),
            rows,
            fetched_at,
        }
    }

    /// Tickers of the snapshot rows, in display order.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.ticker.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(ticker: &str) -> CategoryRow {
        CategoryRow {
            ticker: ticker.to_string(),
            metrics: vec![dec!(12.5), dec!(1_250_000)],
        }
    }

    #[test]
    fn snapshot_truncates_to_max_rows() {
        let rows = vec![row("AAPL"), row("TSLA"), row("NVDA")];
        let snapshot = CategorySnapshot::new("gappers_up", rows, Utc::now(), 2);
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(
            snapshot.tickers().collect::<Vec<_>>(),
            vec!["AAPL", "TSLA"]
        );
    }

    #[test]
    fn snapshot_preserves_endpoint_order() {
        let rows = vec![row("ZZZ"), row("AAA")];
        let snapshot = CategorySnapshot::new("high_volume", rows, Utc::now(), 50);
        assert_eq!(snapshot.tickers().collect::<Vec<_>>(), vec!["ZZZ", "AAA"]);
    }

    #[test]
    fn row_deserializes_from_endpoint_shape() {
        let row: CategoryRow =
            serde_json::from_str(r#"{"ticker": "AMD", "metrics": ["4.2", "980000"]}"#).unwrap();
        assert_eq!(row.ticker, "AMD");
        assert_eq!(row.metrics, vec![dec!(4.2), dec!(980_000)]);
    }
}
