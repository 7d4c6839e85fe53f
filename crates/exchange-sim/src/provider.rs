//! Snapshot assembly and order routing over the REST client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

use vol_arb_core::{
    MarketQuote, MarketStatus, NewsItem, Order, OrderRouter, SessionConfig, SnapshotProvider,
    TickSnapshot,
};

use crate::client::{CaseInfo, NewsRecord, SecurityRow, SimClient};
use crate::error::SimError;

/// Snapshot provider and order router for the simulated venue.
pub struct SimExchange {
    client: SimClient,
    session: SessionConfig,
    last_news_id: AtomicU64,
}

impl SimExchange {
    #[must_use]
    pub fn new(client: SimClient, session: SessionConfig) -> Self {
        Self {
            client,
            session,
            last_news_id: AtomicU64::new(0),
        }
    }

    /// Net liquidation value, for the end-of-session report.
    ///
    /// # Errors
    ///
    /// Returns an error if the venue request fails.
    pub async fn net_liquidation_value(&self) -> Result<f64> {
        Ok(self.client.net_liquidation_value().await?)
    }

    /// Keeps only news entries not seen by an earlier poll.
    fn take_fresh_news(&self, records: Vec<NewsRecord>) -> Vec<NewsRecord> {
        let seen = self.last_news_id.load(Ordering::Acquire);
        let fresh: Vec<NewsRecord> = records.into_iter().filter(|r| r.news_id > seen).collect();
        if let Some(max_id) = fresh.iter().map(|r| r.news_id).max() {
            self.last_news_id.fetch_max(max_id, Ordering::AcqRel);
        }
        fresh
    }
}

#[async_trait]
impl SnapshotProvider for SimExchange {
    async fn snapshot(&self) -> Result<TickSnapshot> {
        let case = self.client.case().await?;
        let rows = self.client.securities().await?;
        let records = self.client.news().await?;
        let fresh = self.take_fresh_news(records);
        debug!(
            tick = case.tick,
            securities = rows.len(),
            fresh_news = fresh.len(),
            "snapshot fetched"
        );
        Ok(assemble(&case, rows, fresh, self.session)?)
    }
}

#[async_trait]
impl OrderRouter for SimExchange {
    async fn submit(&self, order: &Order) -> Result<()> {
        Ok(self.client.submit_order(order).await?)
    }
}

/// Builds the engine-facing snapshot from raw venue payloads.
fn assemble(
    case: &CaseInfo,
    rows: Vec<SecurityRow>,
    news: Vec<NewsRecord>,
    session: SessionConfig,
) -> Result<TickSnapshot, SimError> {
    let mut quotes = HashMap::with_capacity(rows.len());
    let mut positions = HashMap::with_capacity(rows.len());

    for row in rows {
        let quote = MarketQuote {
            instrument: row.ticker.clone(),
            bid: decimal("bid", row.bid)?,
            ask: decimal("ask", row.ask)?,
            last: decimal("last", row.last)?,
            vwap: row.vwap.map(|v| decimal("vwap", v)).transpose()?,
            tick: case.tick,
        };
        positions.insert(row.ticker.clone(), row.position.round() as i64);
        quotes.insert(row.ticker, quote);
    }

    let received_at = Utc::now();
    let news = news
        .into_iter()
        .map(|r| NewsItem {
            tick: r.tick,
            headline: r.headline,
            body: r.body,
            received_at,
        })
        .collect();

    Ok(TickSnapshot {
        tick: case.tick,
        time_to_expiry_years: session.time_to_expiry_years(case.tick),
        status: MarketStatus::from_venue(&case.status),
        quotes,
        positions,
        news,
    })
}

fn decimal(field: &'static str, value: f64) -> Result<Decimal, SimError> {
    Decimal::from_f64_retain(value).ok_or(SimError::BadNumber { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(ticker: &str, bid: f64, ask: f64, position: f64) -> SecurityRow {
        SecurityRow {
            ticker: ticker.to_string(),
            kind: String::new(),
            bid,
            ask,
            last: bid,
            position,
            vwap: None,
        }
    }

    fn session() -> SessionConfig {
        SessionConfig {
            ticks_per_session: 300,
            ticks_per_year: 3600,
        }
    }

    #[test]
    fn assemble_builds_quotes_positions_and_clock() {
        let case = CaseInfo {
            tick: 150,
            status: "ACTIVE".to_string(),
        };
        let rows = vec![
            row("RTM", 49.98, 50.02, 3000.0),
            row("RTM50C", 1.45, 1.55, -90.0),
        ];
        let snap = assemble(&case, rows, vec![], session()).unwrap();

        assert_eq!(snap.tick, 150);
        assert_eq!(snap.status, MarketStatus::Active);
        assert!((snap.time_to_expiry_years - 150.0 / 3600.0).abs() < 1e-12);
        assert_eq!(snap.quote("RTM").unwrap().bid, dec!(49.98));
        assert_eq!(snap.position("RTM"), 3000);
        assert_eq!(snap.position("RTM50C"), -90);
    }

    #[test]
    fn assemble_rejects_unrepresentable_numbers() {
        let case = CaseInfo {
            tick: 1,
            status: "ACTIVE".to_string(),
        };
        let rows = vec![row("RTM", f64::NAN, 50.02, 0.0)];
        assert!(matches!(
            assemble(&case, rows, vec![], session()),
            Err(SimError::BadNumber { field: "bid", .. })
        ));
    }

    #[test]
    fn inactive_status_maps_to_closed() {
        let case = CaseInfo {
            tick: 301,
            status: "STOPPED".to_string(),
        };
        let snap = assemble(&case, vec![], vec![], session()).unwrap();
        assert_eq!(snap.status, MarketStatus::Closed);
        assert_eq!(snap.time_to_expiry_years, 0.0);
    }

    #[test]
    fn news_already_seen_is_filtered_out() {
        let client = SimClient::new(crate::client::SimClientConfig::default()).unwrap();
        let exchange = SimExchange::new(client, session());

        let batch = |ids: &[u64]| -> Vec<NewsRecord> {
            ids.iter()
                .map(|&id| NewsRecord {
                    news_id: id,
                    tick: 10,
                    headline: String::new(),
                    body: String::new(),
                })
                .collect()
        };

        let fresh = exchange.take_fresh_news(batch(&[2, 1]));
        assert_eq!(fresh.len(), 2);
        // Second poll returns the same feed plus one new entry.
        let fresh = exchange.take_fresh_news(batch(&[3, 2, 1]));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].news_id, 3);
    }
}
