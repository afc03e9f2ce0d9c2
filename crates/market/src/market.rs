use std::collections::BTreeSet;

use agora_core::{
    AccountUpdate, InformationMessage, Ledger, MarketId, MarketRecord, MarketState, Party,
    PublicId, TradeMessage, TradeRequestMessage, Tradeable,
};
use agora_ports::{InformationRevelationPolicy, MarketRules};
use log::{debug, info, warn};

use crate::error::{MarketError, Result};
use crate::settlement::verify_zero_sum;

/// Lifecycle of a market: `Created → Open → Closing → Finalized`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPhase {
    Created,
    Open,
    Closing,
    Finalized,
}

/// One market: its rule set, mutable state, members and everything it has
/// settled so far
///
/// A market is owned by exactly one manager; every mutation goes through
/// `&mut self`, so a tick (read bids, compute, commit) is never interleaved
/// with bid admission.
pub struct Market {
    id: MarketId,
    rules: MarketRules,
    state: MarketState,
    members: BTreeSet<PublicId>,
    phase: MarketPhase,
    record: MarketRecord,
}

impl Market {
    pub fn new(
        id: MarketId,
        rules: MarketRules,
        tradeables: Vec<Tradeable>,
        members: Vec<PublicId>,
    ) -> Self {
        let record = MarketRecord::new(id, rules.mechanism(), members.clone());
        Self {
            id,
            state: MarketState::new(id, tradeables),
            members: members.into_iter().collect(),
            phase: MarketPhase::Created,
            record,
            rules,
        }
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn phase(&self) -> MarketPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == MarketPhase::Open
    }

    pub fn is_closing(&self) -> bool {
        self.phase == MarketPhase::Closing
    }

    pub fn is_member(&self, agent: PublicId) -> bool {
        self.members.contains(&agent)
    }

    pub fn members(&self) -> impl Iterator<Item = &PublicId> {
        self.members.iter()
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.record.ledger
    }

    pub fn record(&self) -> &MarketRecord {
        &self.record
    }

    pub fn rules(&self) -> &MarketRules {
        &self.rules
    }

    pub fn open(&mut self) {
        if self.phase == MarketPhase::Created {
            info!("Opening {} ({})", self.id, self.rules.describe());
            self.phase = MarketPhase::Open;
        }
    }

    /// Run a bid through admission. Returns whether it was recorded.
    pub fn admit(&mut self, bid: TradeMessage) -> bool {
        if !self.is_open() {
            warn!("{}: dropping bid from {}, market is {:?}", self.id, bid.agent, self.phase);
            return false;
        }
        if bid.market_id != self.id {
            warn!("{}: dropping bid addressed to {}", self.id, bid.market_id);
            return false;
        }
        if !self.is_member(bid.agent) {
            warn!("{}: dropping bid from non-member {}", self.id, bid.agent);
            return false;
        }

        self.rules.activity.is_acceptable(&mut self.state, &bid);
        if !self.state.acceptable() {
            warn!(
                "{}: bid from {} rejected by {} activity",
                self.id,
                bid.agent,
                self.rules.activity.name()
            );
            return false;
        }

        debug!("{}: accepted bid from {}", self.id, bid.agent);
        self.state.add_bid(bid);
        true
    }

    /// One tick: clear the admitted bids, advance time, evaluate termination,
    /// and build the next round's trade requests for `agents`
    ///
    /// Returns no requests once the market has left the open phase.
    pub fn tick(&mut self, agents: &[PublicId]) -> Result<Vec<TradeRequestMessage>> {
        if !self.is_open() {
            return Ok(Vec::new());
        }

        self.clear()?;
        self.state.tick();
        self.record.ticks = self.state.time();

        if self.rules.termination.is_over(&self.state) {
            info!(
                "{} closing after {} ticks ({})",
                self.id,
                self.state.time(),
                self.rules.termination.name()
            );
            self.phase = MarketPhase::Closing;
            return Ok(Vec::new());
        }

        Ok(agents
            .iter()
            .filter(|agent| self.is_member(**agent))
            .map(|agent| {
                let mut request = self
                    .rules
                    .query
                    .make_request(&self.state, &self.record.ledger, *agent);
                request.transactions = self.rules.information.sanitize(&request.transactions, *agent);
                request
            })
            .collect())
    }

    /// Leave the open phase; bids admitted since the last tick are cleared
    /// in a final pass first
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        if !self.state.bids().is_empty() {
            debug!("{}: final clearing of {} bids", self.id, self.state.bids().len());
            self.clear()?;
        }
        self.phase = MarketPhase::Closing;
        Ok(())
    }

    /// Allocation, payment, verification, then commit. Nothing is committed
    /// if verification fails.
    fn clear(&mut self) -> Result<()> {
        self.rules.allocation.set_allocation(&mut self.state);
        self.rules
            .payment
            .set_orders(&mut self.state)
            .map_err(MarketError::settlement(self.id))?;
        verify_zero_sum(self.state.payments(), self.rules.payment.budget(&self.state))
            .map_err(MarketError::settlement(self.id))?;

        let allocation = self.state.allocation();
        self.record.add_holdings(&allocation.holdings);
        if allocation.clearing_price.is_some() {
            self.record.clearing_price = allocation.clearing_price;
        }
        self.record.orders.extend_from_slice(self.state.payments());
        let transactions = self.state.take_transactions();
        debug!(
            "{} tick {}: {} orders, {} transactions",
            self.id,
            self.state.time(),
            self.state.payments().len(),
            transactions.len()
        );
        self.record.ledger.add_all(transactions);
        self.state.clear_bids();
        Ok(())
    }

    /// Per-agent money and goods changes over the market's lifetime
    ///
    /// Only available once the market is closing; nothing is applied here.
    pub fn finish(&self) -> Result<Vec<AccountUpdate>> {
        if self.phase != MarketPhase::Closing {
            return Err(MarketError::NotClosing(self.id));
        }

        Ok(self
            .members
            .iter()
            .map(|agent| AccountUpdate {
                agent: *agent,
                money: -self.record.payment_of(*agent),
                goods: self.record.holdings_of(*agent),
            })
            .collect())
    }

    pub fn information_message(&self, agent: PublicId) -> InformationMessage {
        self.rules.information.reveal(&self.record, agent)
    }

    /// Consume the market, keeping what end-of-run reporting needs
    pub fn finalize(mut self) -> (MarketRecord, Box<dyn InformationRevelationPolicy>) {
        self.phase = MarketPhase::Finalized;
        debug!(
            "{} finalized: {} transactions, house net {}",
            self.id,
            self.record.ledger.len(),
            self.record
                .orders
                .iter()
                .map(|o| o.delta_for(Party::House(self.id)))
                .sum::<rust_decimal::Decimal>()
        );
        (self.record, self.rules.information)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::BidBundle;
    use agora_rules::Mechanism;
    use rust_decimal_macros::dec;

    fn lemonade(members: &[u32]) -> Market {
        let members = members.iter().map(|m| PublicId(*m)).collect();
        let mut market = Market::new(MarketId(0), Mechanism::lemonade().rules(), Vec::new(), members);
        market.open();
        market
    }

    fn position(agent: u32, slot: u32) -> TradeMessage {
        TradeMessage::new(PublicId(agent), MarketId(0), BidBundle::Position { slot })
    }

    #[test]
    fn test_phases() {
        let mut market = lemonade(&[0, 1]);
        assert!(market.is_open());

        let requests = market.tick(&[PublicId(0), PublicId(1)]).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tick, 1);

        market.admit(position(0, 1));
        market.admit(position(1, 1));
        let requests = market.tick(&[PublicId(0), PublicId(1)]).unwrap();

        assert!(requests.is_empty());
        assert_eq!(market.phase(), MarketPhase::Closing);
        assert_eq!(market.record().payment_of(PublicId(0)), dec!(12));
    }

    #[test]
    fn test_admission_checks() {
        let mut market = lemonade(&[0]);

        assert!(!market.admit(position(5, 1)));
        let mut elsewhere = position(0, 1);
        elsewhere.market_id = MarketId(9);
        assert!(!market.admit(elsewhere));
        assert!(market.admit(position(0, 1)));
        // identical resubmission under one-shot activity
        assert!(!market.admit(position(0, 1)));
    }

    #[test]
    fn test_close_clears_pending_bids() {
        let mut market = lemonade(&[0]);
        market.tick(&[PublicId(0)]).unwrap();
        market.admit(position(0, 3));

        market.close().unwrap();

        assert_eq!(market.phase(), MarketPhase::Closing);
        assert!(!market.admit(position(0, 4)));
        let updates = market.finish().unwrap();
        assert_eq!(updates[0].money, dec!(-24));
    }

    #[test]
    fn test_finish_requires_closing() {
        let market = lemonade(&[0]);
        assert_eq!(market.finish(), Err(MarketError::NotClosing(MarketId(0))));
    }
}
