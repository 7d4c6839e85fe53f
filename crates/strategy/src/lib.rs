//! Decision-and-risk engine for the volatility agent.
//!
//! One synchronous evaluation pass per tick: price every option, read the
//! mispricing signals, step each instrument's position state machine, then
//! recompute net delta and hedge in the underlying. Every order passes
//! through the risk governor before it leaves the engine. All rules are
//! deterministic; nothing here does I/O or blocks.

pub mod engine;
pub mod hedger;
pub mod position_manager;
pub mod risk;

pub use engine::TickEngine;
pub use hedger::{net_delta, DeltaExposure, DeltaHedger};
pub use position_manager::{ExitReason, PositionManager, PositionState};
pub use risk::{ClipReason, RejectReason, RiskContext, RiskGovernor, RiskVerdict};
