//! Net-delta hedging in the underlying.
//!
//! The hedge is a function of the current net delta, never of history: no
//! hedge ledger exists, so closing the option legs that created the
//! exposure automatically schedules the underlying unwind on a later tick.

use rust_decimal::Decimal;
use tracing::{debug, info};
use vol_arb_core::Order;

/// One option leg's contribution to net delta.
#[derive(Debug, Clone, Copy)]
pub struct DeltaExposure {
    pub delta: f64,
    pub quantity: i64,
    pub multiplier: i64,
}

/// Net delta in underlying-share terms: Σ δ·qty·multiplier + shares held.
#[must_use]
pub fn net_delta(exposures: impl IntoIterator<Item = DeltaExposure>, underlying_qty: i64) -> f64 {
    let options: f64 = exposures
        .into_iter()
        .map(|e| e.delta * e.quantity as f64 * e.multiplier as f64)
        .sum();
    options + underlying_qty as f64
}

/// Issues underlying trades that keep net delta inside the limit.
pub struct DeltaHedger {
    underlying: String,
    net_delta_limit: f64,
    market_fee: Decimal,
}

impl DeltaHedger {
    #[must_use]
    pub fn new(underlying: impl Into<String>, net_delta_limit: f64, market_fee: Decimal) -> Self {
        Self {
            underlying: underlying.into(),
            net_delta_limit,
            market_fee,
        }
    }

    /// Decides the underlying trade for this tick, if any.
    ///
    /// Over the limit: an order for `-net_delta` shares (whole shares)
    /// pulls the book back toward neutral. Inside the limit: a resting
    /// hedge position is flattened once the mid clears its cost basis
    /// (venue VWAP, or our own average entry when the venue omits one) by
    /// more than the venue fee — provided the residual delta after the
    /// unwind would still be inside the limit.
    pub fn rehedge(
        &self,
        net_delta: f64,
        underlying_qty: i64,
        mid: Decimal,
        cost_basis: Option<Decimal>,
    ) -> Option<Order> {
        if net_delta.abs() > self.net_delta_limit {
            let quantity = (-net_delta).round() as i64;
            if quantity == 0 {
                return None;
            }
            info!(net_delta, quantity, "delta hedge");
            return Some(Order::market(&self.underlying, quantity));
        }

        if underlying_qty == 0 {
            return None;
        }
        let basis = cost_basis?;

        let residual = net_delta - underlying_qty as f64;
        if residual.abs() > self.net_delta_limit {
            return None;
        }

        let favorable = if underlying_qty > 0 {
            mid > basis + self.market_fee
        } else {
            mid < basis - self.market_fee
        };
        if !favorable {
            debug!(%mid, %basis, underlying_qty, "hedge unwind not yet favorable");
            return None;
        }

        info!(%mid, %basis, underlying_qty, "unwinding hedge at favorable price");
        Some(Order::market(&self.underlying, -underlying_qty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LIMIT: f64 = 5_000.0;

    fn hedger() -> DeltaHedger {
        DeltaHedger::new("RTM", LIMIT, dec!(0.02))
    }

    #[test]
    fn net_delta_sums_option_legs_and_shares() {
        let exposures = vec![
            DeltaExposure {
                delta: 0.5,
                quantity: 90,
                multiplier: 100,
            },
            DeltaExposure {
                delta: -0.4,
                quantity: -90,
                multiplier: 100,
            },
        ];
        // 0.5*90*100 + (-0.4)*(-90)*100 = 4500 + 3600 = 8100, plus shares.
        let nd = net_delta(exposures, -1_000);
        assert!((nd - 7_100.0).abs() < 1e-9);
    }

    #[test]
    fn breach_issues_full_offsetting_order() {
        let order = hedger().rehedge(7_000.0, 0, dec!(50.00), None).unwrap();
        assert_eq!(order.instrument, "RTM");
        assert_eq!(order.quantity, -7_000);
    }

    #[test]
    fn short_exposure_hedges_with_a_buy() {
        let order = hedger().rehedge(-6_200.4, 0, dec!(50.00), None).unwrap();
        assert_eq!(order.quantity, 6_200);
    }

    #[test]
    fn within_limit_and_no_shares_does_nothing() {
        assert!(hedger().rehedge(3_000.0, 0, dec!(50.00), None).is_none());
    }

    #[test]
    fn resting_long_hedge_unwinds_above_basis_plus_fee() {
        // Bought 3000 shares at ~49.00; mid now 50.00.
        let order = hedger()
            .rehedge(2_800.0, 3_000, dec!(50.00), Some(dec!(49.00)))
            .unwrap();
        assert_eq!(order.quantity, -3_000);
    }

    #[test]
    fn resting_short_hedge_unwinds_below_basis_minus_fee() {
        let order = hedger()
            .rehedge(-2_800.0, -3_000, dec!(48.50), Some(dec!(49.20)))
            .unwrap();
        assert_eq!(order.quantity, 3_000);
    }

    #[test]
    fn unfavorable_price_keeps_the_hedge() {
        assert!(hedger()
            .rehedge(2_800.0, 3_000, dec!(49.00), Some(dec!(49.00)))
            .is_none());
    }

    #[test]
    fn unwind_blocked_when_residual_would_breach() {
        // Options carry -5800 of delta; the 3000 shares are load-bearing.
        assert!(hedger()
            .rehedge(-5_800.0 + 3_000.0, 3_000, dec!(50.00), Some(dec!(49.00)))
            .is_none());
    }

    #[test]
    fn unwind_requires_a_cost_basis() {
        assert!(hedger().rehedge(2_800.0, 3_000, dec!(50.00), None).is_none());
    }
}
