use crate::instrument::Instrument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub venue: VenueConfig,
    pub session: SessionConfig,
    pub instruments: InstrumentConfig,
    pub strategy: StrategyConfig,
    pub risk: RiskLimits,
}

/// Connection settings consumed by the exchange adapter only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub api_url: String,
    pub api_key: String,
    pub poll_interval_ms: u64,
}

/// Session clock: maps tick indices to time remaining on the options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ticks_per_session: u32,
    /// Ticks in one trading year, for annualizing time to expiry.
    pub ticks_per_year: u32,
}

impl SessionConfig {
    /// Time remaining on the option family, in years. Zero once the
    /// session tick count is exhausted.
    #[must_use]
    pub fn time_to_expiry_years(&self, tick: u32) -> f64 {
        let remaining = self.ticks_per_session.saturating_sub(tick);
        f64::from(remaining) / f64::from(self.ticks_per_year)
    }
}

/// The traded universe: one underlying plus a call and a put per strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub underlying: String,
    pub strikes: Vec<u32>,
    pub shares_per_contract: i64,
}

impl InstrumentConfig {
    /// Builds the full instrument list, underlying first, then options in
    /// strike order (call before put), matching the venue's listing.
    #[must_use]
    pub fn instruments(&self) -> Vec<Instrument> {
        let mut out = Vec::with_capacity(1 + self.strikes.len() * 2);
        out.push(Instrument::underlying(&self.underlying));
        for strike in &self.strikes {
            let k = Decimal::from(*strike);
            out.push(Instrument::call(
                format!("{}{}C", self.underlying, strike),
                k,
                self.shares_per_contract,
            ));
            out.push(Instrument::put(
                format!("{}{}P", self.underlying, strike),
                k,
                self.shares_per_contract,
            ));
        }
        out
    }
}

/// Tunables for signal evaluation and position lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Absolute theoretical-vs-mid gap that opens a position. An absolute
    /// price difference, not a percentage: the same 0.04 edge is a far
    /// larger fraction of a cheap wing than of an at-the-money premium.
    pub open_threshold: f64,
    /// Absolute gap below which a held position is considered converged.
    pub close_threshold: f64,
    /// Fraction of the entry edge that must be captured to take profit.
    pub profit_target_fraction: f64,
    /// Continuously compounded risk-free rate. Zero on this venue.
    pub risk_free_rate: f64,
    /// Per-share venue fee, used when deciding whether unwinding the
    /// underlying hedge is profitable against its VWAP.
    pub market_fee: Decimal,
}

/// Hard ceilings read by the risk governor only. Immutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Option contracts per order; also the fixed entry/scale size.
    pub options_qty_per_trade: i64,
    /// Maximum underlying shares per order.
    pub shares_order_limit: i64,
    /// Absolute net delta (in shares) the book may carry.
    pub net_delta_limit: f64,
    /// Maximum absolute contracts held per option instrument.
    pub max_option_position: i64,
    /// Maximum absolute shares held in the underlying.
    pub max_underlying_position: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            venue: VenueConfig {
                api_url: "http://localhost:9999/v1".to_string(),
                api_key: String::new(),
                poll_interval_ms: 400,
            },
            session: SessionConfig {
                ticks_per_session: 300,
                ticks_per_year: 3600,
            },
            instruments: InstrumentConfig {
                underlying: "RTM".to_string(),
                strikes: vec![48, 49, 50, 51, 52],
                shares_per_contract: 100,
            },
            strategy: StrategyConfig {
                open_threshold: 0.04,
                close_threshold: 0.01,
                profit_target_fraction: 0.75,
                risk_free_rate: 0.0,
                market_fee: Decimal::new(2, 2),
            },
            risk: RiskLimits {
                options_qty_per_trade: 90,
                shares_order_limit: 10_000,
                net_delta_limit: 5_000.0,
                max_option_position: 270,
                max_underlying_position: 25_000,
            },
        }
    }
}
