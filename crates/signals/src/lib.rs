//! Signal layer: where does the market disagree with the model?
//!
//! Two pieces feed the decision engine. The realized-volatility tracker
//! turns the venue's periodic free-text announcements into the σ input for
//! pricing, tolerating noise, duplicates, and out-of-order delivery. The
//! mispricing evaluator compares each option's theoretical value against
//! its market mid and classifies the gap as a long, short, or flat signal.

pub mod mispricing;
pub mod realized_vol;

pub use mispricing::{evaluate, MispricingSignal, SignalDirection};
pub use realized_vol::RealizedVolTracker;
