//! Per-tick market state delivered by the snapshot adapter.
//!
//! A [`TickSnapshot`] is replaced wholesale each tick. The decision engine
//! reads it, never mutates it, and treats missing instruments as "no data
//! this tick" rather than an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether the venue is accepting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    Active,
    Closed,
}

impl MarketStatus {
    /// Maps the venue's status string; anything but "ACTIVE" is closed.
    #[must_use]
    pub fn from_venue(status: &str) -> Self {
        if status.eq_ignore_ascii_case("ACTIVE") {
            Self::Active
        } else {
            Self::Closed
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Top-of-book quote for one instrument at one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuote {
    pub instrument: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    /// Session volume-weighted average price, when the venue reports one.
    pub vwap: Option<Decimal>,
    pub tick: u32,
}

impl MarketQuote {
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// A raw news entry from the venue feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub tick: u32,
    pub headline: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Everything the decision engine sees for one tick.
#[derive(Debug, Clone)]
pub struct TickSnapshot {
    pub tick: u32,
    pub time_to_expiry_years: f64,
    pub status: MarketStatus,
    /// Quotes keyed by instrument id. Instruments the fetch missed are absent.
    pub quotes: HashMap<String, MarketQuote>,
    /// Signed position quantities keyed by instrument id.
    pub positions: HashMap<String, i64>,
    /// News entries published since the previous poll.
    pub news: Vec<NewsItem>,
}

impl TickSnapshot {
    #[must_use]
    pub fn quote(&self, instrument: &str) -> Option<&MarketQuote> {
        self.quotes.get(instrument)
    }

    /// Signed position quantity, zero when the instrument is absent.
    #[must_use]
    pub fn position(&self, instrument: &str) -> i64 {
        self.positions.get(instrument).copied().unwrap_or(0)
    }
}
