//! Typed REST client for the simulated venue.
//!
//! The venue exposes a small JSON API: case state, a securities table
//! with top-of-book quotes and positions, a news feed, an orders endpoint
//! that takes query parameters, and the trader's net liquidation value.
//! Authentication is a static API key header.

use crate::error::{Result, SimError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use vol_arb_core::{Order, OrderDirection};

/// Header carrying the venue API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// Configuration for the venue client.
#[derive(Debug, Clone)]
pub struct SimClientConfig {
    /// Base URL for the API, e.g. `http://localhost:9999/v1`.
    pub base_url: String,
    /// Static API key.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SimClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9999/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 5,
        }
    }
}

impl SimClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

/// Case state: the venue clock and whether trading is open.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseInfo {
    pub tick: u32,
    pub status: String,
}

/// One row of the venue securities table.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityRow {
    pub ticker: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub bid: f64,
    pub ask: f64,
    #[serde(default)]
    pub last: f64,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// One venue news entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsRecord {
    #[serde(default)]
    pub news_id: u64,
    #[serde(default)]
    pub tick: u32,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TraderInfo {
    nlv: f64,
}

/// REST client for the venue.
pub struct SimClient {
    http: Client,
    config: SimClientConfig,
}

impl SimClient {
    /// Builds a client with the configured timeout and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: SimClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SimError::from)?;
        Ok(Self { http, config })
    }

    /// Fetches the venue clock and market status.
    pub async fn case(&self) -> Result<CaseInfo> {
        self.get_json("case").await
    }

    /// Fetches the full securities table.
    pub async fn securities(&self) -> Result<Vec<SecurityRow>> {
        self.get_json("securities").await
    }

    /// Fetches the news feed, most recent first.
    pub async fn news(&self) -> Result<Vec<NewsRecord>> {
        self.get_json("news").await
    }

    /// Net liquidation value of the trader account.
    pub async fn net_liquidation_value(&self) -> Result<f64> {
        let trader: TraderInfo = self.get_json("trader").await?;
        Ok(trader.nlv)
    }

    /// Submits a market order. The venue takes an action plus an absolute
    /// quantity, so the signed order is split here.
    pub async fn submit_order(&self, order: &Order) -> Result<()> {
        let action = match order.direction() {
            OrderDirection::Buy => "BUY",
            OrderDirection::Sell => "SELL",
        };
        let url = format!("{}/orders", self.config.base_url);
        debug!(instrument = %order.instrument, quantity = order.quantity, "submitting order");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[
                ("ticker", order.instrument.as_str()),
                ("type", "MARKET"),
                ("quantity", &order.size().to_string()),
                ("action", action),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SimError::api(status, body));
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{path}", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SimError::api(status, body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(SimError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_row_parses_venue_payload() {
        let json = r#"{
            "ticker": "RTM50C",
            "type": "OPTION",
            "bid": 1.45,
            "ask": 1.55,
            "last": 1.50,
            "position": -90.0,
            "vwap": 1.48
        }"#;
        let row: SecurityRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.ticker, "RTM50C");
        assert_eq!(row.kind, "OPTION");
        assert!((row.bid - 1.45).abs() < f64::EPSILON);
        assert!((row.position + 90.0).abs() < f64::EPSILON);
        assert_eq!(row.vwap, Some(1.48));
    }

    #[test]
    fn security_row_tolerates_missing_optional_fields() {
        let json = r#"{"ticker": "RTM", "bid": 49.98, "ask": 50.02}"#;
        let row: SecurityRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.position, 0.0);
        assert!(row.vwap.is_none());
        assert!(row.kind.is_empty());
    }

    #[test]
    fn news_record_tolerates_sparse_payload() {
        let json = r#"{"news_id": 7, "tick": 75, "headline": "Weekly vol", "body": "..."}"#;
        let record: NewsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.news_id, 7);
        assert_eq!(record.tick, 75);
    }

    #[test]
    fn case_info_parses() {
        let info: CaseInfo = serde_json::from_str(r#"{"tick": 42, "status": "ACTIVE"}"#).unwrap();
        assert_eq!(info.tick, 42);
        assert_eq!(info.status, "ACTIVE");
    }
}
