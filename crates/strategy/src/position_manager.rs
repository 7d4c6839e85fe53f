//! Per-instrument position lifecycle.
//!
//! Each option instrument walks `Flat → Opening → Held → Scaling →
//! Unwinding → Flat`. Transitions are decided from the current mispricing
//! signal and the snapshot's authoritative quantity; fills are only ever
//! observed through the next snapshot, never assumed from submitted
//! orders. A risk veto therefore does not roll the recorded state back —
//! the next tick sees the unchanged quantity and re-derives the decision.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use vol_arb_core::Order;
use vol_arb_signals::MispricingSignal;

/// Lifecycle state of one option instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Opening,
    Held,
    Scaling,
    Unwinding,
}

/// Why a held position is being unwound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The theoretical-vs-mid gap narrowed below the close threshold.
    Converged,
    /// The mid moved far enough to capture the configured share of the
    /// entry edge.
    TargetMet,
    /// The signal flipped to the opposite side of the position.
    SignalReversed,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::TargetMet => write!(f, "target_met"),
            Self::SignalReversed => write!(f, "signal_reversed"),
        }
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    state: PositionState,
    /// Mid price when the position was opened or last scaled.
    entry_mid: f64,
    /// Mispricing magnitude at entry; the scaling baseline.
    entry_magnitude: f64,
}

impl Tracked {
    const fn flat() -> Self {
        Self {
            state: PositionState::Flat,
            entry_mid: 0.0,
            entry_magnitude: 0.0,
        }
    }

    fn exit_reason(
        &self,
        signal: &MispricingSignal,
        side: i64,
        market_mid: f64,
        close_threshold: f64,
        profit_target_fraction: f64,
    ) -> Option<ExitReason> {
        if signal.direction.is_directional() && signal.direction.sign() == -side {
            return Some(ExitReason::SignalReversed);
        }
        if signal.magnitude.abs() < close_threshold {
            return Some(ExitReason::Converged);
        }
        if self.entry_magnitude > 0.0 {
            let captured = (market_mid - self.entry_mid) * side as f64;
            if captured >= profit_target_fraction * self.entry_magnitude {
                return Some(ExitReason::TargetMet);
            }
        }
        None
    }
}

/// State machine over all option instruments.
pub struct PositionManager {
    qty_per_trade: i64,
    close_threshold: f64,
    profit_target_fraction: f64,
    tracked: HashMap<String, Tracked>,
}

impl PositionManager {
    #[must_use]
    pub fn new(qty_per_trade: i64, close_threshold: f64, profit_target_fraction: f64) -> Self {
        Self {
            qty_per_trade,
            close_threshold,
            profit_target_fraction,
            tracked: HashMap::new(),
        }
    }

    /// Recorded state for an instrument; `Flat` when never seen.
    #[must_use]
    pub fn state(&self, instrument: &str) -> PositionState {
        self.tracked
            .get(instrument)
            .map_or(PositionState::Flat, |t| t.state)
    }

    /// One decision for one option instrument at one tick.
    ///
    /// `quantity` is the signed position from the current snapshot and
    /// `market_mid` the option's current mid. Returns the order to submit,
    /// if any; the caller routes it through the risk governor.
    pub fn decide(
        &mut self,
        signal: &MispricingSignal,
        quantity: i64,
        market_mid: f64,
    ) -> Option<Order> {
        let tracked = self
            .tracked
            .entry(signal.instrument.clone())
            .or_insert_with(Tracked::flat);

        // Reconcile with the snapshot before deciding: fills (and external
        // flattening) show up here, one tick after the order went out.
        match tracked.state {
            PositionState::Opening | PositionState::Scaling if quantity != 0 => {
                debug!(instrument = %signal.instrument, quantity, "fill observed");
                tracked.state = PositionState::Held;
            }
            PositionState::Held | PositionState::Scaling | PositionState::Unwinding
                if quantity == 0 =>
            {
                info!(instrument = %signal.instrument, "position flat");
                *tracked = Tracked::flat();
            }
            PositionState::Flat if quantity != 0 => {
                // A position we did not open; adopt it at today's prices.
                tracked.state = PositionState::Held;
                tracked.entry_mid = market_mid;
                tracked.entry_magnitude = signal.magnitude.abs();
            }
            _ => {}
        }

        match tracked.state {
            // `Opening` with zero quantity means last tick's entry never
            // filled (or was vetoed); re-derive it from scratch.
            PositionState::Flat | PositionState::Opening => {
                if !signal.direction.is_directional() {
                    tracked.state = PositionState::Flat;
                    return None;
                }
                let order_qty = self.qty_per_trade * signal.direction.sign();
                if tracked.state == PositionState::Flat {
                    info!(
                        instrument = %signal.instrument,
                        direction = ?signal.direction,
                        magnitude = signal.magnitude,
                        mid = market_mid,
                        "opening position"
                    );
                }
                tracked.state = PositionState::Opening;
                tracked.entry_mid = market_mid;
                tracked.entry_magnitude = signal.magnitude.abs();
                Some(Order::market(&signal.instrument, order_qty))
            }

            PositionState::Held => {
                let side: i64 = if quantity > 0 { 1 } else { -1 };

                if let Some(reason) = tracked.exit_reason(
                    signal,
                    side,
                    market_mid,
                    self.close_threshold,
                    self.profit_target_fraction,
                ) {
                    info!(
                        instrument = %signal.instrument,
                        %reason,
                        magnitude = signal.magnitude,
                        "unwinding position"
                    );
                    tracked.state = PositionState::Unwinding;
                    return Some(Order::market(&signal.instrument, -quantity));
                }

                if signal.direction.sign() == side
                    && signal.magnitude.abs() > tracked.entry_magnitude
                {
                    info!(
                        instrument = %signal.instrument,
                        magnitude = signal.magnitude,
                        baseline = tracked.entry_magnitude,
                        "scaling into position"
                    );
                    tracked.state = PositionState::Scaling;
                    tracked.entry_mid = market_mid;
                    tracked.entry_magnitude = signal.magnitude.abs();
                    return Some(Order::market(&signal.instrument, self.qty_per_trade * side));
                }

                None
            }

            // Unwind may span ticks under partial fills; keep flattening
            // whatever quantity the snapshot still shows.
            PositionState::Unwinding => {
                debug!(instrument = %signal.instrument, quantity, "continuing unwind");
                Some(Order::market(&signal.instrument, -quantity))
            }

            // Scaling resolves to Held or Flat during reconciliation.
            PositionState::Scaling => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vol_arb_signals::evaluate;

    const QTY: i64 = 90;
    const CLOSE: f64 = 0.01;
    const TARGET: f64 = 0.75;
    const OPEN: f64 = 0.04;

    fn manager() -> PositionManager {
        PositionManager::new(QTY, CLOSE, TARGET)
    }

    fn signal(theo: f64, mid: f64) -> MispricingSignal {
        evaluate("RTM50C", theo, mid, OPEN)
    }

    // ============================================
    // Entry
    // ============================================

    #[test]
    fn flat_opens_long_on_underpriced_option() {
        let mut mgr = manager();
        let order = mgr.decide(&signal(2.37, 1.50), 0, 1.50).unwrap();
        assert_eq!(order.quantity, QTY);
        assert_eq!(order.instrument, "RTM50C");
        assert_eq!(mgr.state("RTM50C"), PositionState::Opening);
    }

    #[test]
    fn flat_opens_short_on_overpriced_option() {
        let mut mgr = manager();
        let order = mgr.decide(&signal(2.00, 2.40), 0, 2.40).unwrap();
        assert_eq!(order.quantity, -QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Opening);
    }

    #[test]
    fn flat_stays_flat_inside_threshold() {
        let mut mgr = manager();
        assert!(mgr.decide(&signal(2.02, 2.00), 0, 2.00).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Flat);
    }

    #[test]
    fn unfilled_open_re_emits_while_signal_persists() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        // Next tick: still no fill (order may have been vetoed), signal holds.
        let order = mgr.decide(&signal(2.35, 1.52), 0, 1.52).unwrap();
        assert_eq!(order.quantity, QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Opening);
    }

    #[test]
    fn unfilled_open_abandons_when_signal_fades() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        assert!(mgr.decide(&signal(2.01, 2.00), 0, 2.00).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Flat);
    }

    // ============================================
    // Holding and scaling
    // ============================================

    #[test]
    fn fill_advances_opening_to_held() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        // Same edge as entry: hold, no further order.
        assert!(mgr.decide(&signal(2.37, 1.50), QTY, 1.50).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Held);
    }

    #[test]
    fn widening_edge_scales_in() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        // Edge widened from 0.87 to 1.07.
        let order = mgr.decide(&signal(2.37, 1.30), QTY, 1.30).unwrap();
        assert_eq!(order.quantity, QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Scaling);
    }

    #[test]
    fn scale_fill_returns_to_held_without_rescaling() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        mgr.decide(&signal(2.37, 1.30), QTY, 1.30);
        // Fill observed; edge unchanged from the new baseline.
        assert!(mgr.decide(&signal(2.37, 1.30), 2 * QTY, 1.30).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Held);
    }

    #[test]
    fn narrowing_edge_does_not_scale() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        assert!(mgr.decide(&signal(2.37, 1.60), QTY, 1.60).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Held);
    }

    #[test]
    fn short_position_scales_short() {
        let mut mgr = manager();
        mgr.decide(&signal(2.00, 2.40), 0, 2.40);
        mgr.decide(&signal(2.00, 2.40), -QTY, 2.40);
        let order = mgr.decide(&signal(2.00, 2.60), -QTY, 2.60).unwrap();
        assert_eq!(order.quantity, -QTY);
    }

    // ============================================
    // Exits
    // ============================================

    #[test]
    fn converged_edge_unwinds() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        // Gap narrowed to 0.005 < close threshold.
        let order = mgr.decide(&signal(2.365, 2.36), QTY, 2.36).unwrap();
        assert_eq!(order.quantity, -QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Unwinding);
    }

    #[test]
    fn reversed_signal_unwinds() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        // Now overpriced: theoretical well below mid.
        let order = mgr.decide(&signal(2.00, 2.50), QTY, 2.50).unwrap();
        assert_eq!(order.quantity, -QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Unwinding);
    }

    #[test]
    fn profit_target_unwinds_long() {
        let mut mgr = manager();
        // Entry edge 0.87 at mid 1.50; target 0.75 of it = 0.6525.
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        // Mid up 0.66, edge still 0.21 (outside both thresholds).
        let order = mgr.decide(&signal(2.37, 2.16), QTY, 2.16).unwrap();
        assert_eq!(order.quantity, -QTY);
        assert_eq!(mgr.state("RTM50C"), PositionState::Unwinding);
    }

    #[test]
    fn profit_target_unwinds_short() {
        let mut mgr = manager();
        // Entry edge 0.40 at mid 2.40; target = 0.30 of favorable move.
        mgr.decide(&signal(2.00, 2.40), 0, 2.40);
        mgr.decide(&signal(2.00, 2.40), -QTY, 2.40);
        let order = mgr.decide(&signal(2.00, 2.08), -QTY, 2.08).unwrap();
        assert_eq!(order.quantity, QTY);
    }

    #[test]
    fn below_target_and_unconverged_keeps_holding() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        // Mid up only 0.30 of the 0.6525 needed, edge still wide.
        assert!(mgr.decide(&signal(2.37, 1.80), QTY, 1.80).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Held);
    }

    // ============================================
    // Unwind lifecycle
    // ============================================

    #[test]
    fn partial_unwind_continues_across_ticks() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        mgr.decide(&signal(2.365, 2.36), QTY, 2.36);
        // Only half filled so far; keep flattening the rest.
        let order = mgr.decide(&signal(2.365, 2.36), 45, 2.36).unwrap();
        assert_eq!(order.quantity, -45);
        assert_eq!(mgr.state("RTM50C"), PositionState::Unwinding);
    }

    #[test]
    fn completed_unwind_returns_to_flat() {
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        mgr.decide(&signal(2.365, 2.36), QTY, 2.36);
        assert!(mgr.decide(&signal(2.362, 2.36), 0, 2.36).is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Flat);
    }

    #[test]
    fn flatten_orders_always_oppose_the_position() {
        // Long and short legs can never coexist: every unwind order is the
        // exact negation of the snapshot quantity.
        let mut mgr = manager();
        mgr.decide(&signal(2.37, 1.50), 0, 1.50);
        mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        let order = mgr.decide(&signal(2.00, 2.50), QTY, 2.50).unwrap();
        assert_eq!(order.quantity, -QTY);

        let mut mgr = manager();
        mgr.decide(&signal(2.00, 2.40), 0, 2.40);
        mgr.decide(&signal(2.00, 2.40), -QTY, 2.40);
        let order = mgr.decide(&signal(2.40, 2.00), -QTY, 2.00).unwrap();
        assert_eq!(order.quantity, QTY);
    }

    #[test]
    fn adopted_external_position_is_managed() {
        let mut mgr = manager();
        // First sighting already has quantity on book.
        let action = mgr.decide(&signal(2.37, 1.50), QTY, 1.50);
        assert!(action.is_none());
        assert_eq!(mgr.state("RTM50C"), PositionState::Held);
        // And it unwinds on convergence like any other position.
        let order = mgr.decide(&signal(2.365, 2.36), QTY, 2.36).unwrap();
        assert_eq!(order.quantity, -QTY);
    }
}
