use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{MarketId, Price, PublicId, Quantity, TradeableId};

/// Largest price or quantity a bid may carry (10^12)
///
/// Keeps `price * quantity` and per-tick sums well inside `Decimal` range.
pub const MAX_BID_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

fn in_range(amount: &Decimal) -> bool {
    *amount >= Decimal::ZERO && *amount <= MAX_BID_AMOUNT
}

/// Bid side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Shape of a bid bundle, used by activity rules to reject bids sent to the
/// wrong kind of market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BundleKind {
    Position,
    TwoSided,
    Sealed,
}

/// The content of a bid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidBundle {
    /// Occupy a resource slot (congestion / location games)
    Position { slot: u32 },
    /// Limit order in a call market
    TwoSided {
        side: Side,
        tradeable: TradeableId,
        price: Price,
        quantity: Quantity,
    },
    /// Sealed per-item bids
    Sealed { bids: BTreeMap<TradeableId, Price> },
}

impl BidBundle {
    pub fn kind(&self) -> BundleKind {
        match self {
            BidBundle::Position { .. } => BundleKind::Position,
            BidBundle::TwoSided { .. } => BundleKind::TwoSided,
            BidBundle::Sealed { .. } => BundleKind::Sealed,
        }
    }

    /// Structural validation independent of any market
    pub fn is_well_formed(&self) -> bool {
        match self {
            BidBundle::Position { .. } => true,
            BidBundle::TwoSided {
                price, quantity, ..
            } => in_range(price) && in_range(quantity) && !quantity.is_zero(),
            BidBundle::Sealed { bids } => !bids.is_empty() && bids.values().all(in_range),
        }
    }
}

/// A bid submitted by an agent to one market
///
/// `agent` is stamped by the message server from the sender's connection, so
/// whatever the agent put there is overwritten. `seq` is assigned by the
/// market state on admission and carries time priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeMessage {
    pub agent: PublicId,
    pub market_id: MarketId,
    pub bundle: BidBundle,
    #[serde(default)]
    pub seq: u64,
}

impl TradeMessage {
    pub fn new(agent: PublicId, market_id: MarketId, bundle: BidBundle) -> Self {
        Self {
            agent,
            market_id,
            bundle,
            seq: 0,
        }
    }

    /// Same agent, market and bundle, ignoring submission order
    pub fn same_bid(&self, other: &TradeMessage) -> bool {
        self.agent == other.agent
            && self.market_id == other.market_id
            && self.bundle == other.bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_sided_validation() {
        let ok = BidBundle::TwoSided {
            side: Side::Buy,
            tradeable: TradeableId(0),
            price: dec!(30),
            quantity: dec!(1),
        };
        let empty = BidBundle::TwoSided {
            side: Side::Sell,
            tradeable: TradeableId(0),
            price: dec!(30),
            quantity: dec!(0),
        };
        assert!(ok.is_well_formed());
        assert!(!empty.is_well_formed());
        assert_eq!(ok.kind(), BundleKind::TwoSided);
    }

    #[test]
    fn test_amounts_above_bound_rejected() {
        assert_eq!(MAX_BID_AMOUNT, Decimal::from(1_000_000_000_000i64));

        let huge_price = BidBundle::TwoSided {
            side: Side::Buy,
            tradeable: TradeableId(0),
            price: Decimal::MAX,
            quantity: dec!(2),
        };
        let huge_quantity = BidBundle::TwoSided {
            side: Side::Sell,
            tradeable: TradeableId(0),
            price: dec!(1),
            quantity: MAX_BID_AMOUNT + Decimal::ONE,
        };
        let at_bound = BidBundle::Sealed {
            bids: BTreeMap::from([(TradeableId(0), MAX_BID_AMOUNT)]),
        };
        let huge_sealed = BidBundle::Sealed {
            bids: BTreeMap::from([(TradeableId(0), Decimal::MAX)]),
        };
        assert!(!huge_price.is_well_formed());
        assert!(!huge_quantity.is_well_formed());
        assert!(at_bound.is_well_formed());
        assert!(!huge_sealed.is_well_formed());
    }

    #[test]
    fn test_same_bid_ignores_sequence() {
        let mut a = TradeMessage::new(PublicId(1), MarketId(0), BidBundle::Position { slot: 3 });
        let b = a.clone();
        a.seq = 7;
        assert!(a.same_bid(&b));
        assert_ne!(a, b);
    }
}
