//! Hard risk ceilings.
//!
//! Every order leaves the engine through [`RiskGovernor::review`]. The
//! governor never raises: violations resolve locally into a clipped order
//! or a veto, and every clip and veto is logged with its reason.

use tracing::warn;
use vol_arb_core::{InstrumentKind, Order, RiskLimits};

/// Exposure context for one order under review.
#[derive(Debug, Clone, Copy)]
pub struct RiskContext {
    /// Net delta (in shares) before this order executes, including orders
    /// already approved this tick.
    pub net_delta: f64,
    /// Delta added per unit of signed order quantity: δ·multiplier for an
    /// option contract, 1.0 for an underlying share.
    pub unit_delta: f64,
    /// Current signed position in the order's instrument.
    pub position: i64,
    pub kind: InstrumentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipReason {
    /// Per-order quantity ceiling.
    OrderLimit,
    /// Shrunk to the largest quantity that keeps projected net delta legal.
    NetDelta,
}

impl std::fmt::Display for ClipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderLimit => write!(f, "order_limit"),
            Self::NetDelta => write!(f, "net_delta"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The order would push the instrument past its position ceiling.
    /// Position-cap violations reject outright rather than resize.
    PositionCap,
    /// No quantity in the order's direction keeps net delta legal.
    NetDelta,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionCap => write!(f, "position_cap"),
            Self::NetDelta => write!(f, "net_delta"),
        }
    }
}

/// Outcome of a risk review. Never silent: clips carry the original
/// request, vetoes carry the reason.
#[derive(Debug)]
pub enum RiskVerdict {
    Approved(Order),
    Clipped {
        order: Order,
        requested: i64,
        reason: ClipReason,
    },
    Rejected {
        instrument: String,
        requested: i64,
        reason: RejectReason,
    },
}

impl RiskVerdict {
    /// The order to submit, if the review left one standing.
    #[must_use]
    pub fn into_order(self) -> Option<Order> {
        match self {
            Self::Approved(order) | Self::Clipped { order, .. } => Some(order),
            Self::Rejected { .. } => None,
        }
    }
}

/// Enforces the configured hard limits. Holds no other state.
pub struct RiskGovernor {
    limits: RiskLimits,
}

impl RiskGovernor {
    #[must_use]
    pub const fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Reviews one order against the per-order, per-instrument, and
    /// net-delta ceilings, in that sequence. Deterministic: the same order
    /// and context always produce the same verdict.
    pub fn review(&self, mut order: Order, ctx: &RiskContext) -> RiskVerdict {
        let requested = order.quantity;
        let mut clip_reason = None;

        // Per-order ceiling: shrink, never grow.
        let per_order = match ctx.kind {
            InstrumentKind::Underlying => self.limits.shares_order_limit,
            InstrumentKind::Call | InstrumentKind::Put => self.limits.options_qty_per_trade,
        };
        if order.quantity.abs() > per_order {
            order.quantity = per_order * order.quantity.signum();
            clip_reason = Some(ClipReason::OrderLimit);
        }

        // Per-instrument position ceiling: reject outright.
        let max_position = match ctx.kind {
            InstrumentKind::Underlying => self.limits.max_underlying_position,
            InstrumentKind::Call | InstrumentKind::Put => self.limits.max_option_position,
        };
        if (ctx.position + order.quantity).abs() > max_position {
            warn!(
                instrument = %order.instrument,
                requested,
                position = ctx.position,
                max_position,
                "order rejected: position cap"
            );
            return RiskVerdict::Rejected {
                instrument: order.instrument,
                requested,
                reason: RejectReason::PositionCap,
            };
        }

        // Projected net delta. Orders with no delta footprint pass through.
        if ctx.unit_delta.abs() > f64::EPSILON {
            let limit = self.limits.net_delta_limit;
            let projected = ctx.net_delta + order.quantity as f64 * ctx.unit_delta;
            if projected.abs() > limit {
                if projected.abs() < ctx.net_delta.abs() {
                    // Already breached and this order reduces the breach
                    // (a hedge shrunk by the per-order cap); let it run,
                    // flagged for out-of-band attention.
                    warn!(
                        instrument = %order.instrument,
                        net_delta = ctx.net_delta,
                        projected,
                        limit,
                        "net delta still beyond limit after order"
                    );
                } else {
                    match self.compliant_quantity(order.quantity, ctx) {
                        Some(quantity) => {
                            order.quantity = quantity;
                            clip_reason = Some(ClipReason::NetDelta);
                        }
                        None => {
                            warn!(
                                instrument = %order.instrument,
                                requested,
                                net_delta = ctx.net_delta,
                                limit,
                                already_breached = ctx.net_delta.abs() > limit,
                                "order rejected: net delta limit"
                            );
                            return RiskVerdict::Rejected {
                                instrument: order.instrument,
                                requested,
                                reason: RejectReason::NetDelta,
                            };
                        }
                    }
                }
            }
        }

        match clip_reason {
            None => RiskVerdict::Approved(order),
            Some(reason) => {
                warn!(
                    instrument = %order.instrument,
                    requested,
                    granted = order.quantity,
                    %reason,
                    "order clipped"
                );
                RiskVerdict::Clipped {
                    order,
                    requested,
                    reason,
                }
            }
        }
    }

    /// Largest same-direction quantity whose projected net delta stays
    /// inside the limit, or `None` when no such quantity exists.
    fn compliant_quantity(&self, quantity: i64, ctx: &RiskContext) -> Option<i64> {
        let limit = self.limits.net_delta_limit;
        let a = (-limit - ctx.net_delta) / ctx.unit_delta;
        let b = (limit - ctx.net_delta) / ctx.unit_delta;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        if quantity > 0 {
            let q = hi.floor();
            (q >= 1.0 && q >= lo).then(|| (q as i64).min(quantity))
        } else {
            let q = lo.ceil();
            (q <= -1.0 && q <= hi).then(|| (q as i64).max(quantity))
        }
    }
}
