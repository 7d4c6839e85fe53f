use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Buy,
    Sell,
}

/// An order to submit. Ephemeral: constructed, routed, and discarded.
///
/// Quantity is signed: positive buys, negative sells. Adapters that speak
/// action + absolute size use [`Order::direction`] and [`Order::size`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub instrument: String,
    pub quantity: i64,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}

impl Order {
    #[must_use]
    pub fn market(instrument: impl Into<String>, quantity: i64) -> Self {
        Self {
            instrument: instrument.into(),
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
        }
    }

    #[must_use]
    pub fn limit(instrument: impl Into<String>, quantity: i64, price: Decimal) -> Self {
        Self {
            instrument: instrument.into(),
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(price),
        }
    }

    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        if self.quantity >= 0 {
            OrderDirection::Buy
        } else {
            OrderDirection::Sell
        }
    }

    /// Absolute quantity for wire formats that pair size with an action.
    #[must_use]
    pub const fn size(&self) -> i64 {
        self.quantity.abs()
    }
}
