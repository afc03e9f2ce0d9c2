use std::collections::BTreeMap;

use agora_core::{
    Allocation, BidBundle, Fill, MarketState, Order, Party, Price, PublicId, Quantity, Side,
    TradeableId, Transaction,
};
use agora_ports::{AllocationRule, MechanismError, MechanismResult, PaymentRule};
use rust_decimal::Decimal;

/// Resting interest on one side of a call market book
#[derive(Debug, Clone)]
struct Interest {
    agent: PublicId,
    price: Price,
    quantity: Quantity,
    seq: u64,
}

/// Uniform-price call market clearing with price-time priority
///
/// Bids are collected per tradeable and cleared once per tick:
/// 1. Buys ranked by highest price, sells by lowest price
/// 2. Ties broken by arrival (earlier `seq` first)
///
/// Matching walks both books while the best buy crosses the best sell, with
/// partial fills. Every fill executes at the midpoint of the last matched
/// (marginal) pair.
pub struct PriceTimeClearing;

impl PriceTimeClearing {
    pub fn new() -> Self {
        Self
    }

    fn can_match(buy: &Interest, sell: &Interest) -> bool {
        buy.price >= sell.price && buy.agent != sell.agent
    }

    /// Clear one tradeable's books, returning `(buyer, seller, quantity)`
    /// triples and the marginal pair's prices
    fn clear(
        mut buys: Vec<Interest>,
        mut sells: Vec<Interest>,
    ) -> (Vec<(PublicId, PublicId, Quantity)>, Option<(Price, Price)>) {
        buys.sort_by(|a, b| b.price.cmp(&a.price).then(a.seq.cmp(&b.seq)));
        sells.sort_by(|a, b| a.price.cmp(&b.price).then(a.seq.cmp(&b.seq)));

        let mut matches = Vec::new();
        let mut marginal = None;
        let (mut i, mut j) = (0, 0);

        while i < buys.len() && j < sells.len() {
            if !Self::can_match(&buys[i], &sells[j]) {
                break;
            }

            let quantity = buys[i].quantity.min(sells[j].quantity);
            matches.push((buys[i].agent, sells[j].agent, quantity));
            marginal = Some((buys[i].price, sells[j].price));

            buys[i].quantity -= quantity;
            sells[j].quantity -= quantity;
            if buys[i].quantity.is_zero() {
                i += 1;
            }
            if sells[j].quantity.is_zero() {
                j += 1;
            }
        }

        (matches, marginal)
    }
}

impl Default for PriceTimeClearing {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationRule for PriceTimeClearing {
    fn set_allocation(&self, state: &mut MarketState) {
        let mut books: BTreeMap<TradeableId, (Vec<Interest>, Vec<Interest>)> = BTreeMap::new();
        for bid in state.bids() {
            if let BidBundle::TwoSided {
                side,
                tradeable,
                price,
                quantity,
            } = &bid.bundle
            {
                let interest = Interest {
                    agent: bid.agent,
                    price: *price,
                    quantity: *quantity,
                    seq: bid.seq,
                };
                let book = books.entry(*tradeable).or_default();
                match side {
                    Side::Buy => book.0.push(interest),
                    Side::Sell => book.1.push(interest),
                }
            }
        }

        let mut allocation = Allocation::default();
        for (tradeable, (buys, sells)) in books {
            let (matches, marginal) = Self::clear(buys, sells);
            let Some((buy_price, sell_price)) = marginal else {
                continue;
            };

            // buy_price >= sell_price, so this stays in range for any bid
            let price = sell_price + (buy_price - sell_price) / Decimal::TWO;
            for (buyer, seller, quantity) in matches {
                allocation.assign(buyer, tradeable, quantity);
                allocation.assign(seller, tradeable, -quantity);
                allocation.fills.push(Fill {
                    buyer,
                    seller: Some(seller),
                    tradeable,
                    quantity,
                    price,
                });
            }
            // Several tradeables clear independently; the last one cleared
            // is reported as the market's price
            allocation.clearing_price = Some(price);
        }

        state.set_allocation(allocation);
    }

    fn name(&self) -> &str {
        "Price-Time Call Market"
    }
}

/// Settles call market fills: each buyer pays its seller `price * quantity`
pub struct UniformPriceSettlement;

impl UniformPriceSettlement {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UniformPriceSettlement {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentRule for UniformPriceSettlement {
    fn set_orders(&self, state: &mut MarketState) -> MechanismResult<()> {
        let market_id = state.market_id();
        let tick = state.time();

        let mut orders = Vec::new();
        let mut transactions = Vec::new();
        for fill in &state.allocation().fills {
            let seller = match fill.seller {
                Some(agent) => Party::Agent(agent),
                None => Party::House(market_id),
            };
            let cost = fill
                .price
                .checked_mul(fill.quantity)
                .ok_or(MechanismError::Overflow {
                    price: fill.price,
                    quantity: fill.quantity,
                })?;
            orders.push(Order::new(Party::Agent(fill.buyer), seller, cost));
            transactions.push(Transaction::new(
                market_id,
                tick,
                seller,
                Party::Agent(fill.buyer),
                fill.tradeable,
                fill.quantity,
                fill.price,
            ));
        }

        state.set_payments(orders);
        state.set_transactions(transactions);
        Ok(())
    }

    fn name(&self) -> &str {
        "Uniform Price"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{MarketId, TradeMessage};
    use rust_decimal_macros::dec;

    fn quote(agent: u32, side: Side, price: Decimal, quantity: Decimal) -> TradeMessage {
        TradeMessage::new(
            PublicId(agent),
            MarketId(0),
            BidBundle::TwoSided {
                side,
                tradeable: TradeableId(0),
                price,
                quantity,
            },
        )
    }

    fn clear(quotes: Vec<TradeMessage>) -> MarketState {
        let mut state = MarketState::new(MarketId(0), Vec::new());
        for q in quotes {
            state.add_bid(q);
        }
        PriceTimeClearing::new().set_allocation(&mut state);
        UniformPriceSettlement::new().set_orders(&mut state).unwrap();
        state
    }

    #[test]
    fn test_single_cross_clears_at_midpoint() {
        let state = clear(vec![
            quote(1, Side::Buy, dec!(30), dec!(1)),
            quote(2, Side::Sell, dec!(28), dec!(1)),
        ]);

        assert_eq!(state.allocation().clearing_price, Some(dec!(29)));
        assert_eq!(
            state.payments(),
            &[Order::new(
                Party::Agent(PublicId(1)),
                Party::Agent(PublicId(2)),
                dec!(29)
            )]
        );
        assert_eq!(state.transactions().len(), 1);
        assert_eq!(state.allocation().holdings_of(PublicId(2))[&TradeableId(0)], dec!(-1));
    }

    #[test]
    fn test_no_cross_no_trade() {
        let state = clear(vec![
            quote(1, Side::Buy, dec!(20), dec!(1)),
            quote(2, Side::Sell, dec!(25), dec!(1)),
        ]);

        assert!(state.allocation().is_empty());
        assert_eq!(state.allocation().clearing_price, None);
        assert!(state.payments().is_empty());
    }

    #[test]
    fn test_partial_fill() {
        let state = clear(vec![
            quote(1, Side::Buy, dec!(10), dec!(5)),
            quote(2, Side::Sell, dec!(10), dec!(2)),
        ]);

        assert_eq!(state.allocation().holdings_of(PublicId(1))[&TradeableId(0)], dec!(2));
        assert_eq!(state.payments()[0].cost, dec!(20));
    }

    #[test]
    fn test_price_priority_then_time() {
        // two sellers at the same price: the earlier one trades first
        let state = clear(vec![
            quote(1, Side::Sell, dec!(9), dec!(1)),
            quote(2, Side::Sell, dec!(9), dec!(1)),
            quote(3, Side::Sell, dec!(8), dec!(1)),
            quote(4, Side::Buy, dec!(12), dec!(2)),
        ]);

        let sellers: Vec<Option<PublicId>> =
            state.allocation().fills.iter().map(|f| f.seller).collect();
        assert_eq!(sellers, vec![Some(PublicId(3)), Some(PublicId(1))]);
        // marginal pair is (12, 9)
        assert_eq!(state.allocation().clearing_price, Some(dec!(10.5)));
    }

    #[test]
    fn test_extreme_quotes_fail_settlement_instead_of_panicking() {
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.add_bid(quote(1, Side::Buy, Decimal::MAX, dec!(2)));
        state.add_bid(quote(2, Side::Sell, Decimal::MAX, dec!(2)));

        PriceTimeClearing::new().set_allocation(&mut state);
        assert_eq!(state.allocation().clearing_price, Some(Decimal::MAX));

        let err = UniformPriceSettlement::new()
            .set_orders(&mut state)
            .unwrap_err();
        assert_eq!(
            err,
            MechanismError::Overflow {
                price: Decimal::MAX,
                quantity: dec!(2)
            }
        );
    }

    #[test]
    fn test_orders_balance() {
        let state = clear(vec![
            quote(1, Side::Buy, dec!(15), dec!(3)),
            quote(2, Side::Buy, dec!(14), dec!(2)),
            quote(3, Side::Sell, dec!(11), dec!(4)),
        ]);

        let bought: Decimal = state
            .allocation()
            .fills
            .iter()
            .map(|f| f.quantity)
            .sum();
        assert_eq!(bought, dec!(4));
        let paid: Decimal = state.payments().iter().map(|o| o.cost).sum();
        assert_eq!(paid, dec!(4) * dec!(12.5));
    }
}
