use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Quantity, TradeableId};

/// A good (or resource slot) that a market trades
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tradeable {
    pub id: TradeableId,
    /// Units available in the market
    pub count: Quantity,
}

impl Tradeable {
    /// A single unit of the given good
    pub fn new(id: u32) -> Self {
        Self {
            id: TradeableId(id),
            count: Decimal::ONE,
        }
    }

    /// Several interchangeable units of the given good
    pub fn with_count(id: u32, count: Quantity) -> Self {
        Self {
            id: TradeableId(id),
            count,
        }
    }
}
