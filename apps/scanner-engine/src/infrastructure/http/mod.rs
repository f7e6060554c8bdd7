//! Scanner Data Endpoint Client
//!
//! HTTP adapter for the [`MarketDataPort`]. Two GET endpoints, no request
//! bodies, no pagination:
//!
//! - `GET {base}/session` -> market session snapshot
//! - `GET {base}/scanners/{category}` -> ordered category rows
//!
//! There is deliberately no retry here: any transport error or
//! non-success status maps to one [`MarketDataError`] and the polling
//! cadence is the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::domain::scanner::CategoryRow;
use crate::domain::session::MarketSession;

/// Configuration for the endpoint client.
#[derive(Debug, Clone)]
pub struct ScannerApiConfig {
    /// Endpoint base URL, e.g. `http://localhost:8090/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ScannerApiConfig {
    /// Create a config with the default request timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the scanner data endpoint.
#[derive(Debug, Clone)]
pub struct ScannerApiClient {
    client: Client,
    base_url: String,
}

impl ScannerApiClient {
    /// Build the client.
    pub fn new(config: &ScannerApiConfig) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MarketDataError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MarketDataPort for ScannerApiClient {
    async fn fetch_session(&self) -> Result<MarketSession, MarketDataError> {
        self.get_json("/session").await
    }

    async fn fetch_category(&self, category: &str) -> Result<Vec<CategoryRow>, MarketDataError> {
        self.get_json(&format!("/scanners/{category}")).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::session::SessionPhase;

    async fn make_client(server: &MockServer) -> ScannerApiClient {
        ScannerApiClient::new(&ScannerApiConfig {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_session_parses_the_endpoint_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_session": "PRE_MARKET",
                "trading_date": "2026-08-05",
            })))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let session = client.fetch_session().await.unwrap();

        assert_eq!(session.current_session, SessionPhase::PreMarket);
        assert_eq!(session.trading_date.to_string(), "2026-08-05");
    }

    #[tokio::test]
    async fn fetch_category_parses_ordered_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scanners/gappers_up"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"ticker": "AAPL", "metrics": ["12.5", "2500000"]},
                {"ticker": "TSLA", "metrics": ["8.1", "1900000"]},
            ])))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let rows = client.fetch_category("gappers_up").await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ticker, "AAPL");
        assert_eq!(rows[1].ticker, "TSLA");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let err = client.fetch_session().await.unwrap_err();

        assert!(matches!(err, MarketDataError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_malformed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let err = client.fetch_session().await.unwrap_err();

        assert!(matches!(err, MarketDataError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_maps_to_transport_error() {
        // Port 1 is almost certainly closed.
        let client = ScannerApiClient::new(&ScannerApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: Duration::from_millis(500),
        })
        .unwrap();

        let err = client.fetch_session().await.unwrap_err();
        assert!(matches!(err, MarketDataError::Transport(_)));
    }
}
