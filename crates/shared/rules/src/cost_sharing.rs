use std::collections::BTreeMap;

use agora_core::apportion::apportion;
use agora_core::{
    Allocation, BidBundle, MarketState, Money, Order, Party, PublicId, TradeableId, Transaction,
};
use agora_ports::{AllocationRule, MechanismResult, PaymentRule};
use rust_decimal::Decimal;

/// Location game on a circle of `slots` positions
///
/// Each agent occupies the slot it bid for (slot numbers wrap around the
/// circle). The allocation records one unit of `TradeableId(slot)` per agent.
pub struct CircularCostSharing {
    slots: u32,
}

impl CircularCostSharing {
    pub fn new(slots: u32) -> Self {
        Self { slots: slots.max(1) }
    }
}

impl AllocationRule for CircularCostSharing {
    fn set_allocation(&self, state: &mut MarketState) {
        let mut allocation = Allocation::default();
        for bid in state.bids() {
            if let BidBundle::Position { slot } = bid.bundle {
                allocation.assign(bid.agent, TradeableId(slot % self.slots), Decimal::ONE);
            }
        }
        state.set_allocation(allocation);
    }

    fn name(&self) -> &str {
        "Circular Location"
    }
}

/// Equal cost sharing over a circular location allocation
///
/// `total_cost` is spread evenly over the slots. Every slot's cost is borne by
/// the nearest occupied position; a slot equidistant from two positions splits
/// its cost between them. A position's burden is split equally among the
/// agents occupying it. Shares are apportioned exactly, so agents are charged
/// `total_cost` in total whenever anyone bid.
pub struct EqualCostSharing {
    slots: u32,
    total_cost: Money,
}

impl EqualCostSharing {
    pub fn new(slots: u32, total_cost: Money) -> Self {
        Self {
            slots: slots.max(1),
            total_cost,
        }
    }

    fn distance(&self, a: u32, b: u32) -> u32 {
        let d = a.abs_diff(b);
        d.min(self.slots - d)
    }

    /// Relative burden of each agent
    fn weights(&self, occupants: &BTreeMap<u32, Vec<PublicId>>) -> Vec<(PublicId, Decimal)> {
        let mut weights: BTreeMap<PublicId, Decimal> = BTreeMap::new();
        for slot in 0..self.slots {
            let nearest = occupants
                .keys()
                .map(|p| self.distance(slot, *p))
                .min()
                .unwrap_or(0);
            let owners: Vec<u32> = occupants
                .keys()
                .copied()
                .filter(|p| self.distance(slot, *p) == nearest)
                .collect();

            for position in &owners {
                let agents = &occupants[position];
                let share = Decimal::ONE
                    / Decimal::from(owners.len() as u64)
                    / Decimal::from(agents.len() as u64);
                for agent in agents {
                    *weights.entry(*agent).or_insert(Decimal::ZERO) += share;
                }
            }
        }
        weights.into_iter().collect()
    }
}

impl PaymentRule for EqualCostSharing {
    fn set_orders(&self, state: &mut MarketState) -> MechanismResult<()> {
        let market_id = state.market_id();
        let tick = state.time();

        let mut occupants: BTreeMap<u32, Vec<PublicId>> = BTreeMap::new();
        for (agent, goods) in &state.allocation().holdings {
            for slot in goods.keys() {
                occupants.entry(slot.0).or_default().push(*agent);
            }
        }

        if occupants.is_empty() {
            state.set_payments(Vec::new());
            state.set_transactions(Vec::new());
            return Ok(());
        }

        let shares = apportion(self.total_cost, &self.weights(&occupants));

        let mut orders = Vec::with_capacity(shares.len());
        let mut transactions = Vec::with_capacity(shares.len());
        for (agent, share) in shares {
            if share.is_zero() {
                continue;
            }
            orders.push(Order::new(Party::Agent(agent), Party::House(market_id), share));
            if let Some(slot) = state.allocation().holdings_of(agent).keys().next() {
                transactions.push(Transaction::new(
                    market_id,
                    tick,
                    Party::House(market_id),
                    Party::Agent(agent),
                    *slot,
                    Decimal::ONE,
                    share,
                ));
            }
        }

        state.set_payments(orders);
        state.set_transactions(transactions);
        Ok(())
    }

    fn budget(&self, state: &MarketState) -> Option<Money> {
        if state.allocation().holdings.is_empty() {
            None
        } else {
            Some(self.total_cost)
        }
    }

    fn name(&self) -> &str {
        "Equal Cost Sharing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{Account, Endowment, MarketId, TradeMessage};
    use rust_decimal_macros::dec;

    fn settle(bids: &[(u32, u32)]) -> (MarketState, Vec<Account>) {
        let allocation = CircularCostSharing::new(12);
        let payment = EqualCostSharing::new(12, dec!(24));
        let mut state = MarketState::new(MarketId(0), Vec::new());
        for (agent, slot) in bids {
            state.add_bid(TradeMessage::new(
                PublicId(*agent),
                MarketId(0),
                BidBundle::Position { slot: *slot },
            ));
        }
        allocation.set_allocation(&mut state);
        payment.set_orders(&mut state).unwrap();

        let mut accounts: Vec<Account> = bids
            .iter()
            .map(|(agent, _)| Account::new(PublicId(*agent), Endowment::default()))
            .collect();
        for order in state.payments() {
            let agent = order.from.agent().unwrap();
            let account = accounts.iter_mut().find(|a| a.agent == agent).unwrap();
            account.add(order.cost);
        }
        (state, accounts)
    }

    #[test]
    fn test_sole_occupant_bears_everything() {
        let (_, accounts) = settle(&[(1, 1)]);
        assert_eq!(accounts[0].balance(), dec!(24));
    }

    #[test]
    fn test_shared_slot_splits_equally() {
        let (_, accounts) = settle(&[(1, 1), (2, 1)]);
        assert_eq!(accounts[0].balance(), dec!(12));
        assert_eq!(accounts[1].balance(), dec!(12));
    }

    #[test]
    fn test_one_agent_per_slot() {
        let bids: Vec<(u32, u32)> = (0..12).map(|i| (i, i)).collect();
        let (_, accounts) = settle(&bids);
        for account in accounts {
            assert_eq!(account.balance(), dec!(2.0));
        }
    }

    #[test]
    fn test_groups_of_three() {
        let bids: Vec<(u32, u32)> = (0..12).map(|i| (i, (i / 3) * 3)).collect();
        let (_, accounts) = settle(&bids);
        for account in accounts {
            assert_eq!(account.balance(), dec!(2.0));
        }
    }

    #[test]
    fn test_equidistant_slots_are_split() {
        // positions 0 and 2 on a 4-slot circle: slots 1 and 3 are shared
        let allocation = CircularCostSharing::new(4);
        let payment = EqualCostSharing::new(4, dec!(8));
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.add_bid(TradeMessage::new(PublicId(0), MarketId(0), BidBundle::Position { slot: 0 }));
        state.add_bid(TradeMessage::new(PublicId(1), MarketId(0), BidBundle::Position { slot: 2 }));
        allocation.set_allocation(&mut state);
        payment.set_orders(&mut state).unwrap();

        let costs: Vec<Money> = state.payments().iter().map(|o| o.cost).collect();
        assert_eq!(costs, vec![dec!(4), dec!(4)]);
    }

    #[test]
    fn test_uneven_split_is_exact() {
        let (state, _) = settle(&[(1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0)]);
        let total: Money = state.payments().iter().map(|o| o.cost).sum();
        assert_eq!(total, dec!(24));
    }

    #[test]
    fn test_no_bids_no_orders() {
        let (state, _) = settle(&[]);
        assert!(state.payments().is_empty());
        assert_eq!(EqualCostSharing::new(12, dec!(24)).budget(&state), None);
    }

    #[test]
    fn test_deterministic() {
        let bids = [(3, 4), (1, 4), (2, 9), (5, 0)];
        let (first, _) = settle(&bids);
        let (second, _) = settle(&bids);
        assert_eq!(first.payments(), second.payments());
        assert_eq!(first.allocation(), second.allocation());
    }
}
