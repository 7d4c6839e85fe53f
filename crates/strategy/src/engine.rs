//! One evaluation pass per tick.
//!
//! The orchestrator hands in a snapshot; the engine prices the option
//! family, reads mispricing signals, steps the position state machines,
//! recomputes net delta including the orders it just approved, and runs
//! the hedge decision. Everything returned has already cleared the risk
//! governor. Missing quotes, unpriceable instruments, and absent
//! volatility degrade to skips — a tick never fails.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};
use vol_arb_core::{
    AppConfig, Instrument, InstrumentKind, Order, PositionBook, StrategyConfig, TickSnapshot,
};
use vol_arb_pricing::{OptionRight, Theoretical};
use vol_arb_signals::{evaluate, MispricingSignal, RealizedVolTracker};

use crate::hedger::{net_delta, DeltaExposure, DeltaHedger};
use crate::position_manager::PositionManager;
use crate::risk::{RiskContext, RiskGovernor};

pub struct TickEngine {
    instruments: Vec<Instrument>,
    underlying: String,
    strategy: StrategyConfig,
    vol: RealizedVolTracker,
    manager: PositionManager,
    hedger: DeltaHedger,
    governor: RiskGovernor,
    book: PositionBook,
}

impl TickEngine {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let underlying = config.instruments.underlying.clone();
        Self {
            instruments: config.instruments.instruments(),
            hedger: DeltaHedger::new(
                underlying.clone(),
                config.risk.net_delta_limit,
                config.strategy.market_fee,
            ),
            underlying,
            strategy: config.strategy,
            vol: RealizedVolTracker::new(),
            manager: PositionManager::new(
                config.risk.options_qty_per_trade,
                config.strategy.close_threshold,
                config.strategy.profit_target_fraction,
            ),
            governor: RiskGovernor::new(config.risk),
            book: PositionBook::new(),
        }
    }

    /// Current realized-volatility estimate, once an announcement parsed.
    #[must_use]
    pub fn realized_vol(&self) -> Option<f64> {
        self.vol.current()
    }

    /// Runs one full evaluation pass and returns the orders to submit,
    /// option trades first, hedge trade last.
    pub fn on_tick(&mut self, snap: &TickSnapshot) -> Vec<Order> {
        for item in &snap.news {
            self.vol.update(item);
        }

        let Some(sigma) = self.vol.current() else {
            debug!(tick = snap.tick, "no realized volatility estimate yet");
            return Vec::new();
        };

        let Some(underlying_quote) = snap.quote(&self.underlying) else {
            warn!(tick = snap.tick, "underlying quote missing, skipping tick");
            return Vec::new();
        };
        let Some(spot) = underlying_quote.mid().to_f64() else {
            warn!(tick = snap.tick, "underlying mid not representable");
            return Vec::new();
        };

        // Reconcile the book with the authoritative snapshot.
        for inst in &self.instruments {
            if let Some(quote) = snap.quote(&inst.id) {
                self.book.observe(&inst.id, snap.position(&inst.id), quote.mid());
            }
        }

        // Price the option family and read each instrument's signal.
        let mut theos: HashMap<String, Theoretical> = HashMap::new();
        let mut evaluations: Vec<(&Instrument, MispricingSignal, f64)> = Vec::new();
        for inst in &self.instruments {
            let right = match inst.kind {
                InstrumentKind::Call => OptionRight::Call,
                InstrumentKind::Put => OptionRight::Put,
                InstrumentKind::Underlying => continue,
            };
            let Some(quote) = snap.quote(&inst.id) else {
                debug!(instrument = %inst.id, "no quote this tick");
                continue;
            };
            let Some(mid) = quote.mid().to_f64() else {
                continue;
            };
            let Some(strike) = inst.strike.and_then(|k| k.to_f64()) else {
                continue;
            };
            match vol_arb_pricing::price(
                spot,
                strike,
                snap.time_to_expiry_years,
                sigma,
                self.strategy.risk_free_rate,
                right,
            ) {
                Ok(theo) => {
                    theos.insert(inst.id.clone(), theo);
                    let signal = evaluate(&inst.id, theo.value, mid, self.strategy.open_threshold);
                    evaluations.push((inst, signal, mid));
                }
                Err(e) => {
                    warn!(instrument = %inst.id, error = %e, "pricing failed, skipping instrument");
                }
            }
        }

        // Net delta over snapshot positions; kept current as orders issue.
        let underlying_qty = snap.position(&self.underlying);
        let exposures = self.instruments.iter().filter_map(|inst| {
            theos.get(&inst.id).map(|theo| DeltaExposure {
                delta: theo.delta,
                quantity: snap.position(&inst.id),
                multiplier: inst.multiplier,
            })
        });
        let mut projected_delta = net_delta(exposures, underlying_qty);

        let mut orders = Vec::new();
        for (inst, signal, mid) in &evaluations {
            let position = snap.position(&inst.id);
            let Some(order) = self.manager.decide(signal, position, *mid) else {
                continue;
            };
            let unit_delta = theos[&inst.id].delta * inst.multiplier as f64;
            let ctx = RiskContext {
                net_delta: projected_delta,
                unit_delta,
                position,
                kind: inst.kind,
            };
            if let Some(order) = self.governor.review(order, &ctx).into_order() {
                projected_delta += order.quantity as f64 * unit_delta;
                orders.push(order);
            }
        }

        // Hedge pass against the post-issuance projection. Cost basis for
        // the unwind check prefers the venue VWAP, falling back to our own
        // average entry from the book.
        let cost_basis = underlying_quote
            .vwap
            .or_else(|| self.book.get(&self.underlying).map(|p| p.avg_price));
        if let Some(hedge) = self.hedger.rehedge(
            projected_delta,
            underlying_qty,
            underlying_quote.mid(),
            cost_basis,
        ) {
            let ctx = RiskContext {
                net_delta: projected_delta,
                unit_delta: 1.0,
                position: underlying_qty,
                kind: InstrumentKind::Underlying,
            };
            if let Some(order) = self.governor.review(hedge, &ctx).into_order() {
                orders.push(order);
            }
        }

        orders
    }
}
