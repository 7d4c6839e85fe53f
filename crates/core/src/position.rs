use rust_decimal::Decimal;
use std::collections::HashMap;

/// A signed holding in one instrument. Positive quantity is long.
#[derive(Debug, Clone)]
pub struct Position {
    pub instrument: String,
    pub quantity: i64,
    pub avg_price: Decimal,
}

impl Position {
    fn new(instrument: String, quantity: i64, avg_price: Decimal) -> Self {
        Self {
            instrument,
            quantity,
            avg_price,
        }
    }
}

/// Position book reconciled from each tick's authoritative snapshot.
///
/// Quantities are never inferred from submitted orders; the book records
/// whatever the snapshot reports and marks newly acquired quantity at the
/// mid price observed alongside it.
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Reconciles one instrument against the snapshot quantity.
    ///
    /// Returns the quantity previously on book. Added exposure (same sign,
    /// larger magnitude) blends `mark` into the average price; reduced
    /// exposure keeps the entry average; a sign flip restarts it at `mark`.
    pub fn observe(&mut self, instrument: &str, quantity: i64, mark: Decimal) -> i64 {
        let previous = self.quantity(instrument);

        if quantity == 0 {
            self.positions.remove(instrument);
            return previous;
        }

        match self.positions.get_mut(instrument) {
            None => {
                self.positions.insert(
                    instrument.to_string(),
                    Position::new(instrument.to_string(), quantity, mark),
                );
            }
            Some(pos) => {
                let same_side = (pos.quantity > 0) == (quantity > 0);
                if same_side && quantity.abs() > pos.quantity.abs() {
                    let added = quantity.abs() - pos.quantity.abs();
                    let total_cost = pos.avg_price * Decimal::from(pos.quantity.abs())
                        + mark * Decimal::from(added);
                    pos.avg_price = total_cost / Decimal::from(quantity.abs());
                } else if !same_side {
                    pos.avg_price = mark;
                }
                pos.quantity = quantity;
            }
        }

        previous
    }

    #[must_use]
    pub fn get(&self, instrument: &str) -> Option<&Position> {
        self.positions.get(instrument)
    }

    /// Signed quantity on book, zero when absent.
    #[must_use]
    pub fn quantity(&self, instrument: &str) -> i64 {
        self.positions.get(instrument).map_or(0, |p| p.quantity)
    }
}

impl Default for PositionBook {
    fn default() -> Self {
        Self::new()
    }
}
