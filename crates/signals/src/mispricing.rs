//! Theoretical-vs-market mispricing signals.

use serde::{Deserialize, Serialize};

/// Direction of a mispricing signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Option trades below theoretical value - buy it.
    Long,
    /// Option trades above theoretical value - sell it.
    Short,
    /// Gap inside the threshold - no trade.
    Flat,
}

impl SignalDirection {
    /// Signed unit for sizing: +1, -1, or 0.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Long => 1,
            Self::Short => -1,
            Self::Flat => 0,
        }
    }

    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::Flat)
    }
}

/// Mispricing read for one option at one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MispricingSignal {
    pub instrument: String,
    pub direction: SignalDirection,
    /// Theoretical value minus market mid. Positive means underpriced.
    pub magnitude: f64,
}

/// Compares an option's theoretical value with its market mid.
///
/// `threshold` is an absolute price difference, not a percentage: 0.04 of
/// edge clears it on a 0.30 wing and on a 2.40 at-the-money premium alike,
/// so it is deliberately permissive on cheap strikes.
#[must_use]
pub fn evaluate(
    instrument: &str,
    theoretical: f64,
    market_mid: f64,
    threshold: f64,
) -> MispricingSignal {
    let magnitude = theoretical - market_mid;
    let direction = if magnitude >= threshold {
        SignalDirection::Long
    } else if magnitude <= -threshold {
        SignalDirection::Short
    } else {
        SignalDirection::Flat
    };
    MispricingSignal {
        instrument: instrument.to_string(),
        direction,
        magnitude,
    }
}
