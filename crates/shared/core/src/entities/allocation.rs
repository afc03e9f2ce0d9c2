use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{Price, PublicId, Quantity, TradeableId};

/// A matched quantity between a buyer and a seller at a price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub buyer: PublicId,
    /// `None` when the good is sold by the house
    pub seller: Option<PublicId>,
    pub tradeable: TradeableId,
    pub quantity: Quantity,
    pub price: Price,
}

/// Result of an allocation rule for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Goods assigned to each agent this tick (negative for sellers)
    pub holdings: BTreeMap<PublicId, BTreeMap<TradeableId, Quantity>>,
    /// Pairwise fills, in matching order
    pub fills: Vec<Fill>,
    /// Uniform clearing price, when the mechanism has one
    pub clearing_price: Option<Price>,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty() && self.fills.is_empty()
    }

    pub fn assign(&mut self, agent: PublicId, tradeable: TradeableId, quantity: Quantity) {
        let held = self
            .holdings
            .entry(agent)
            .or_default()
            .entry(tradeable)
            .or_insert(Decimal::ZERO);
        *held += quantity;
    }

    pub fn holdings_of(&self, agent: PublicId) -> BTreeMap<TradeableId, Quantity> {
        self.holdings.get(&agent).cloned().unwrap_or_default()
    }
}
