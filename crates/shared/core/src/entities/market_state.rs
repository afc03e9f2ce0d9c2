use serde::{Deserialize, Serialize};

use super::allocation::Allocation;
use super::bid::TradeMessage;
use super::order::Order;
use super::tradeable::Tradeable;
use super::transaction::Transaction;
use crate::values::{MarketId, PublicId};

/// Mutable state of one market, rewritten every tick by the rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    market_id: MarketId,
    tradeables: Vec<Tradeable>,
    /// At most one bid per agent, in submission order
    bids: Vec<TradeMessage>,
    allocation: Allocation,
    payments: Vec<Order>,
    /// Trades produced by the payment rule this tick, not yet in the ledger
    transactions: Vec<Transaction>,
    time: u64,
    acceptable: bool,
    accepted_this_tick: usize,
    accepted_last_tick: usize,
    next_seq: u64,
}

impl MarketState {
    pub fn new(market_id: MarketId, tradeables: Vec<Tradeable>) -> Self {
        Self {
            market_id,
            tradeables,
            bids: Vec::new(),
            allocation: Allocation::default(),
            payments: Vec::new(),
            transactions: Vec::new(),
            time: 0,
            acceptable: false,
            accepted_this_tick: 0,
            accepted_last_tick: 0,
            next_seq: 0,
        }
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn tradeables(&self) -> &[Tradeable] {
        &self.tradeables
    }

    pub fn bids(&self) -> &[TradeMessage] {
        &self.bids
    }

    /// Record a bid; a later bid from the same agent replaces the earlier one
    /// and loses its time priority
    pub fn add_bid(&mut self, mut bid: TradeMessage) {
        self.bids.retain(|b| b.agent != bid.agent);
        bid.seq = self.next_seq;
        self.next_seq += 1;
        self.bids.push(bid);
        self.accepted_this_tick += 1;
    }

    pub fn bid_of(&self, agent: PublicId) -> Option<&TradeMessage> {
        self.bids.iter().find(|b| b.agent == agent)
    }

    /// Whether an identical bid (same agent, market, bundle) is already recorded
    pub fn contains_bid(&self, bid: &TradeMessage) -> bool {
        self.bids.iter().any(|b| b.same_bid(bid))
    }

    pub fn clear_bids(&mut self) {
        self.bids.clear();
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn set_allocation(&mut self, allocation: Allocation) {
        self.allocation = allocation;
    }

    pub fn payments(&self) -> &[Order] {
        &self.payments
    }

    pub fn set_payments(&mut self, payments: Vec<Order>) {
        self.payments = payments;
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }

    pub fn take_transactions(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// Advance logical time by one tick
    pub fn tick(&mut self) {
        self.time += 1;
        self.accepted_last_tick = self.accepted_this_tick;
        self.accepted_this_tick = 0;
    }

    pub fn acceptable(&self) -> bool {
        self.acceptable
    }

    pub fn set_acceptable(&mut self, acceptable: bool) {
        self.acceptable = acceptable;
    }

    /// Bids admitted since the last tick
    pub fn pending_bids(&self) -> usize {
        self.accepted_this_tick
    }

    /// Bids admitted during the most recently completed tick
    pub fn accepted_last_tick(&self) -> usize {
        self.accepted_last_tick
    }

    /// Back to an empty market (used when a market is reopened)
    pub fn reset(&mut self) {
        self.bids.clear();
        self.allocation = Allocation::default();
        self.payments.clear();
        self.transactions.clear();
        self.time = 0;
        self.acceptable = false;
        self.accepted_this_tick = 0;
        self.accepted_last_tick = 0;
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BidBundle;

    fn position(agent: u32, slot: u32) -> TradeMessage {
        TradeMessage::new(PublicId(agent), MarketId(0), BidBundle::Position { slot })
    }

    #[test]
    fn test_tick_advances_time() {
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.tick();
        assert_eq!(state.time(), 1);
        state.tick();
        assert_eq!(state.time(), 2);
    }

    #[test]
    fn test_later_bid_supersedes() {
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.add_bid(position(1, 0));
        state.add_bid(position(2, 5));
        state.add_bid(position(1, 3));

        assert_eq!(state.bids().len(), 2);
        assert_eq!(state.bid_of(PublicId(1)).unwrap().bundle, BidBundle::Position { slot: 3 });
        // the replacement goes to the back of the queue
        assert_eq!(state.bids()[1].agent, PublicId(1));
        assert!(state.bids()[0].seq < state.bids()[1].seq);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.add_bid(position(1, 0));
        state.tick();
        state.reset();

        assert!(state.bids().is_empty());
        assert!(state.payments().is_empty());
        assert!(state.allocation().is_empty());
        assert_eq!(state.time(), 0);
        assert_eq!(state.pending_bids(), 0);
    }
}
