use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of listed instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// The hedgeable underlying (ETF/stock).
    Underlying,
    /// Listed call option on the underlying.
    Call,
    /// Listed put option on the underlying.
    Put,
}

impl InstrumentKind {
    /// Returns true for calls and puts.
    #[must_use]
    pub const fn is_option(self) -> bool {
        matches!(self, Self::Call | Self::Put)
    }
}

/// A tradable instrument. Immutable once defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Venue ticker, e.g. "RTM" or "RTM50C".
    pub id: String,
    pub kind: InstrumentKind,
    /// Strike price; options only.
    pub strike: Option<Decimal>,
    /// Shares represented by one unit (1 for the underlying itself).
    pub multiplier: i64,
}

impl Instrument {
    #[must_use]
    pub fn underlying(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: InstrumentKind::Underlying,
            strike: None,
            multiplier: 1,
        }
    }

    #[must_use]
    pub fn call(id: impl Into<String>, strike: Decimal, multiplier: i64) -> Self {
        Self {
            id: id.into(),
            kind: InstrumentKind::Call,
            strike: Some(strike),
            multiplier,
        }
    }

    #[must_use]
    pub fn put(id: impl Into<String>, strike: Decimal, multiplier: i64) -> Self {
        Self {
            id: id.into(),
            kind: InstrumentKind::Put,
            strike: Some(strike),
            multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn underlying_has_no_strike() {
        let inst = Instrument::underlying("RTM");
        assert_eq!(inst.kind, InstrumentKind::Underlying);
        assert!(inst.strike.is_none());
        assert_eq!(inst.multiplier, 1);
    }

    #[test]
    fn call_and_put_are_options() {
        assert!(InstrumentKind::Call.is_option());
        assert!(InstrumentKind::Put.is_option());
        assert!(!InstrumentKind::Underlying.is_option());
    }

    #[test]
    fn option_carries_strike_and_multiplier() {
        let call = Instrument::call("RTM50C", dec!(50), 100);
        assert_eq!(call.strike, Some(dec!(50)));
        assert_eq!(call.multiplier, 100);
    }
}
