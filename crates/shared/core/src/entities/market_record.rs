use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::Ledger;
use super::order::{Order, Party};
use crate::messages::MechanismType;
use crate::values::{MarketId, Money, Price, PublicId, Quantity, TradeableId};

/// Everything a market produced over its lifetime, kept after it is finalized
/// so end-of-run reports can be built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub market_id: MarketId,
    pub mechanism: MechanismType,
    pub members: Vec<PublicId>,
    pub ticks: u64,
    pub ledger: Ledger,
    /// Cumulative goods allocated per agent over all ticks
    pub holdings: BTreeMap<PublicId, BTreeMap<TradeableId, Quantity>>,
    /// Every settled order, in settlement order
    pub orders: Vec<Order>,
    pub clearing_price: Option<Price>,
}

impl MarketRecord {
    pub fn new(market_id: MarketId, mechanism: MechanismType, members: Vec<PublicId>) -> Self {
        Self {
            market_id,
            mechanism,
            members,
            ticks: 0,
            ledger: Ledger::new(market_id),
            holdings: BTreeMap::new(),
            orders: Vec::new(),
            clearing_price: None,
        }
    }

    pub fn holdings_of(&self, agent: PublicId) -> BTreeMap<TradeableId, Quantity> {
        self.holdings.get(&agent).cloned().unwrap_or_default()
    }

    /// Net amount the agent paid (negative when it received money)
    pub fn payment_of(&self, agent: PublicId) -> Money {
        -self
            .orders
            .iter()
            .map(|o| o.delta_for(Party::Agent(agent)))
            .sum::<Decimal>()
    }

    pub fn add_holdings(&mut self, holdings: &BTreeMap<PublicId, BTreeMap<TradeableId, Quantity>>) {
        for (agent, goods) in holdings {
            let entry = self.holdings.entry(*agent).or_default();
            for (tradeable, quantity) in goods {
                *entry.entry(*tradeable).or_insert(Decimal::ZERO) += *quantity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_of_nets_orders() {
        let market = MarketId(0);
        let mut record = MarketRecord::new(market, MechanismType::CallMarket, vec![]);
        record.orders.push(Order::new(
            Party::Agent(PublicId(0)),
            Party::Agent(PublicId(1)),
            dec!(30),
        ));
        record.orders.push(Order::new(
            Party::Agent(PublicId(1)),
            Party::House(market),
            dec!(5),
        ));

        assert_eq!(record.payment_of(PublicId(0)), dec!(30));
        assert_eq!(record.payment_of(PublicId(1)), dec!(-25));
        assert_eq!(record.payment_of(PublicId(2)), dec!(0));
    }
}
