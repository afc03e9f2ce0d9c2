use std::collections::BTreeMap;

use agora_core::{
    Allocation, BidBundle, Fill, MarketState, Order, Party, Price, PublicId, TradeableId,
    Transaction,
};
use agora_ports::{AllocationRule, MechanismError, MechanismResult, PaymentRule};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the winner of a sealed-bid auction is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pricing {
    /// Winner pays its own bid
    FirstPrice,
    /// Winner pays the highest competing bid (zero when unopposed)
    SecondPrice,
}

/// Bids per tradeable as `(price, seq, agent)`, ranked best first
fn ranked_bids(state: &MarketState) -> BTreeMap<TradeableId, Vec<(Price, u64, PublicId)>> {
    let mut ranked: BTreeMap<TradeableId, Vec<(Price, u64, PublicId)>> = BTreeMap::new();
    for bid in state.bids() {
        if let BidBundle::Sealed { bids } = &bid.bundle {
            for (tradeable, price) in bids {
                ranked
                    .entry(*tradeable)
                    .or_default()
                    .push((*price, bid.seq, bid.agent));
            }
        }
    }
    for entries in ranked.values_mut() {
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    }
    ranked
}

/// Highest bid wins each tradeable; equal bids go to the earlier arrival
///
/// The winner receives every unit of the tradeable. The fill carries the
/// winning bid as its price; the payment rule decides what is charged.
pub struct SealedBidAllocation;

impl SealedBidAllocation {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SealedBidAllocation {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationRule for SealedBidAllocation {
    fn set_allocation(&self, state: &mut MarketState) {
        let mut allocation = Allocation::default();
        for (tradeable, entries) in ranked_bids(state) {
            let Some((price, _, winner)) = entries.first().copied() else {
                continue;
            };
            let units = state
                .tradeables()
                .iter()
                .find(|t| t.id == tradeable)
                .map(|t| t.count)
                .unwrap_or(Decimal::ONE);

            allocation.assign(winner, tradeable, units);
            allocation.fills.push(Fill {
                buyer: winner,
                seller: None,
                tradeable,
                quantity: units,
                price,
            });
        }
        state.set_allocation(allocation);
    }

    fn name(&self) -> &str {
        "Sealed Bid"
    }
}

/// Charges sealed-bid winners, paying the house
pub struct SealedBidPayment {
    pricing: Pricing,
}

impl SealedBidPayment {
    pub fn new(pricing: Pricing) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }
}

impl PaymentRule for SealedBidPayment {
    fn set_orders(&self, state: &mut MarketState) -> MechanismResult<()> {
        let market_id = state.market_id();
        let tick = state.time();
        let ranked = ranked_bids(state);

        let mut orders = Vec::new();
        let mut transactions = Vec::new();
        for fill in &state.allocation().fills {
            let price = match self.pricing {
                Pricing::FirstPrice => fill.price,
                Pricing::SecondPrice => ranked
                    .get(&fill.tradeable)
                    .and_then(|entries| entries.iter().find(|e| e.2 != fill.buyer))
                    .map(|e| e.0)
                    .unwrap_or(Decimal::ZERO),
            };

            let cost = price
                .checked_mul(fill.quantity)
                .ok_or(MechanismError::Overflow {
                    price,
                    quantity: fill.quantity,
                })?;
            if cost > Decimal::ZERO {
                orders.push(Order::new(
                    Party::Agent(fill.buyer),
                    Party::House(market_id),
                    cost,
                ));
            }
            transactions.push(Transaction::new(
                market_id,
                tick,
                Party::House(market_id),
                Party::Agent(fill.buyer),
                fill.tradeable,
                fill.quantity,
                price,
            ));
        }

        state.set_payments(orders);
        state.set_transactions(transactions);
        Ok(())
    }

    fn name(&self) -> &str {
        match self.pricing {
            Pricing::FirstPrice => "First Price",
            Pricing::SecondPrice => "Second Price",
        }
    }
}
