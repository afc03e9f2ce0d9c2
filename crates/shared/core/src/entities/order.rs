use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{MarketId, Money, PublicId};

/// One side of a settlement instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Party {
    Agent(PublicId),
    /// The market operator (cost pools, auction revenue)
    House(MarketId),
    /// Placeholder for a counterparty hidden by an information policy
    Anonymous,
}

impl Party {
    pub fn agent(&self) -> Option<PublicId> {
        match self {
            Party::Agent(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_agent(&self, id: PublicId) -> bool {
        matches!(self, Party::Agent(a) if *a == id)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Agent(id) => write!(f, "{}", id),
            Party::House(id) => write!(f, "house({})", id),
            Party::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Settlement instruction produced by a payment rule: `cost` moves from
/// `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub from: Party,
    pub to: Party,
    pub cost: Money,
}

impl Order {
    pub fn new(from: Party, to: Party, cost: Money) -> Self {
        Self { from, to, cost }
    }

    /// Signed effect of this order on a party's balance
    pub fn delta_for(&self, party: Party) -> Money {
        let mut delta = Decimal::ZERO;
        if self.from == party {
            delta -= self.cost;
        }
        if self.to == party {
            delta += self.cost;
        }
        delta
    }
}
