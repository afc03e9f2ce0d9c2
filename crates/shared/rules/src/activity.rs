use agora_core::{BidBundle, BundleKind, MarketState, TradeMessage, TradeableId};
use agora_ports::ActivityRule;
use log::debug;

/// Checks shared by every activity rule: the bundle has the market's kind, is
/// well formed, and only names tradeables the market offers
fn admissible(kind: BundleKind, state: &MarketState, bid: &TradeMessage) -> bool {
    if bid.bundle.kind() != kind {
        debug!(
            "{}: rejecting {:?} bundle from {}, expected {:?}",
            state.market_id(),
            bid.bundle.kind(),
            bid.agent,
            kind
        );
        return false;
    }
    if !bid.bundle.is_well_formed() {
        debug!("{}: rejecting malformed bid from {}", state.market_id(), bid.agent);
        return false;
    }

    let offered = |id: TradeableId| state.tradeables().iter().any(|t| t.id == id);
    match &bid.bundle {
        BidBundle::Position { .. } => true,
        // Markets without a declared tradeable list accept any good
        _ if state.tradeables().is_empty() => true,
        BidBundle::TwoSided { tradeable, .. } => offered(*tradeable),
        BidBundle::Sealed { bids } => bids.keys().all(|id| offered(*id)),
    }
}

/// Accepts a bid only if an identical one is not already recorded this tick
pub struct OneShotActivity {
    kind: BundleKind,
}

impl OneShotActivity {
    pub fn new(kind: BundleKind) -> Self {
        Self { kind }
    }
}

impl ActivityRule for OneShotActivity {
    fn is_acceptable(&self, state: &mut MarketState, bid: &TradeMessage) {
        let acceptable = admissible(self.kind, state, bid) && !state.contains_bid(bid);
        state.set_acceptable(acceptable);
    }

    fn name(&self) -> &str {
        "One Shot"
    }
}

/// Accepts every well-formed bid; a later bid replaces the agent's earlier one
pub struct OpenActivity {
    kind: BundleKind,
}

impl OpenActivity {
    pub fn new(kind: BundleKind) -> Self {
        Self { kind }
    }
}

impl ActivityRule for OpenActivity {
    fn is_acceptable(&self, state: &mut MarketState, bid: &TradeMessage) {
        let acceptable = admissible(self.kind, state, bid);
        state.set_acceptable(acceptable);
    }

    fn name(&self) -> &str {
        "Open"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{MarketId, PublicId, Side, Tradeable};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn position(agent: u32, slot: u32) -> TradeMessage {
        TradeMessage::new(PublicId(agent), MarketId(0), BidBundle::Position { slot })
    }

    #[test]
    fn test_one_shot_rejects_duplicate() {
        let rule = OneShotActivity::new(BundleKind::Position);
        let mut state = MarketState::new(MarketId(0), Vec::new());

        rule.is_acceptable(&mut state, &position(1, 4));
        assert!(state.acceptable());
        state.add_bid(position(1, 4));

        rule.is_acceptable(&mut state, &position(1, 4));
        assert!(!state.acceptable());

        // a different slot is a different bid
        rule.is_acceptable(&mut state, &position(1, 5));
        assert!(state.acceptable());
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let rule = OpenActivity::new(BundleKind::TwoSided);
        let mut state = MarketState::new(MarketId(0), Vec::new());

        rule.is_acceptable(&mut state, &position(1, 0));
        assert!(!state.acceptable());
    }

    #[test]
    fn test_open_accepts_repeats() {
        let rule = OpenActivity::new(BundleKind::Position);
        let mut state = MarketState::new(MarketId(0), Vec::new());
        state.add_bid(position(1, 2));

        rule.is_acceptable(&mut state, &position(1, 2));
        assert!(state.acceptable());
    }

    #[test]
    fn test_unknown_tradeable_rejected() {
        let rule = OpenActivity::new(BundleKind::TwoSided);
        let mut state = MarketState::new(MarketId(0), vec![Tradeable::new(0)]);
        let quote = |tradeable| {
            TradeMessage::new(
                PublicId(1),
                MarketId(0),
                BidBundle::TwoSided {
                    side: Side::Buy,
                    tradeable: TradeableId(tradeable),
                    price: dec!(5),
                    quantity: dec!(1),
                },
            )
        };

        rule.is_acceptable(&mut state, &quote(0));
        assert!(state.acceptable());
        rule.is_acceptable(&mut state, &quote(3));
        assert!(!state.acceptable());
    }

    #[test]
    fn test_empty_sealed_bundle_rejected() {
        let rule = OneShotActivity::new(BundleKind::Sealed);
        let mut state = MarketState::new(MarketId(0), Vec::new());
        let empty = TradeMessage::new(
            PublicId(1),
            MarketId(0),
            BidBundle::Sealed {
                bids: BTreeMap::new(),
            },
        );

        rule.is_acceptable(&mut state, &empty);
        assert!(!state.acceptable());
    }

    #[test]
    fn test_out_of_range_price_rejected() {
        let rule = OpenActivity::new(BundleKind::TwoSided);
        let mut state = MarketState::new(MarketId(0), Vec::new());
        let quote = TradeMessage::new(
            PublicId(1),
            MarketId(0),
            BidBundle::TwoSided {
                side: Side::Sell,
                tradeable: TradeableId(0),
                price: rust_decimal::Decimal::MAX,
                quantity: dec!(2),
            },
        );

        rule.is_acceptable(&mut state, &quote);
        assert!(!state.acceptable());
    }
}
