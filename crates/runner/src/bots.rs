//! Demo bots, one family per mechanism
//!
//! They answer trade requests only for the mechanism they understand and
//! stay silent elsewhere.

use std::collections::BTreeMap;

use agora_core::{
    BidBundle, GeneralValuation, MechanismType, Party, Price, Quantity, Side, TradeMessage,
    TradeRequestMessage, TradeableId, ValuationMessage,
};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::agent::Agent;

/// Quantity of `tradeable` this agent already traded on `side` in the
/// requesting market, read from its own ledger view
fn traded_quantity(request: &TradeRequestMessage, side: Side, tradeable: TradeableId) -> Quantity {
    let me = Party::Agent(request.agent);
    request
        .transactions
        .iter()
        .filter(|t| t.tradeable == tradeable)
        .filter(|t| match side {
            Side::Buy => t.buyer == me,
            Side::Sell => t.seller == me,
        })
        .map(|t| t.quantity)
        .sum()
}

fn offers(request: &TradeRequestMessage, tradeable: TradeableId) -> bool {
    request.tradeables.is_empty() || request.tradeables.iter().any(|t| t.id == tradeable)
}

/// Always takes the same slot in cost-sharing games
pub struct FixedSlotAgent {
    name: String,
    slot: u32,
}

impl FixedSlotAgent {
    pub fn new(name: impl Into<String>, slot: u32) -> Self {
        Self {
            name: name.into(),
            slot,
        }
    }
}

#[async_trait]
impl Agent for FixedSlotAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage> {
        if request.mechanism != MechanismType::CostSharing {
            return Vec::new();
        }
        vec![TradeMessage::new(
            request.agent,
            request.market_id,
            BidBundle::Position { slot: self.slot },
        )]
    }
}

/// Bids a fixed fraction of its private value in sealed-bid auctions
///
/// A fraction of one is truthful bidding, which is dominant under
/// second-price pricing.
pub struct ShadedBidder {
    name: String,
    fraction: Decimal,
    valuation: Option<GeneralValuation>,
}

impl ShadedBidder {
    pub fn truthful(name: impl Into<String>) -> Self {
        Self::new(name, Decimal::ONE)
    }

    pub fn new(name: impl Into<String>, fraction: Decimal) -> Self {
        Self {
            name: name.into(),
            fraction,
            valuation: None,
        }
    }

    fn value_of(&self, tradeable: TradeableId) -> Option<Price> {
        self.valuation
            .as_ref()?
            .parts()
            .iter()
            .find_map(|(_, specific)| specific.value_of_item(tradeable))
    }
}

#[async_trait]
impl Agent for ShadedBidder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_valuation(&mut self, valuation: &ValuationMessage) {
        self.valuation = Some(valuation.valuation.clone());
    }

    async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage> {
        if request.mechanism != MechanismType::SealedBid {
            return Vec::new();
        }
        let bids: BTreeMap<TradeableId, Price> = request
            .tradeables
            .iter()
            .filter_map(|t| {
                self.value_of(t.id)
                    .map(|value| (t.id, (value * self.fraction).round_dp(2)))
            })
            .collect();
        if bids.is_empty() {
            return Vec::new();
        }
        vec![TradeMessage::new(
            request.agent,
            request.market_id,
            BidBundle::Sealed { bids },
        )]
    }
}

/// Quotes one limit order in call markets until it has traded its quantity
pub struct FixedQuoteTrader {
    name: String,
    side: Side,
    tradeable: TradeableId,
    price: Price,
    quantity: Quantity,
}

impl FixedQuoteTrader {
    pub fn new(
        name: impl Into<String>,
        side: Side,
        tradeable: TradeableId,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            name: name.into(),
            side,
            tradeable,
            price,
            quantity,
        }
    }
}

#[async_trait]
impl Agent for FixedQuoteTrader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage> {
        if request.mechanism != MechanismType::CallMarket || !offers(request, self.tradeable) {
            return Vec::new();
        }
        let remaining = self.quantity - traded_quantity(request, self.side, self.tradeable);
        if remaining <= Decimal::ZERO {
            return Vec::new();
        }
        vec![TradeMessage::new(
            request.agent,
            request.market_id,
            BidBundle::TwoSided {
                side: self.side,
                tradeable: self.tradeable,
                price: self.price,
                quantity: remaining,
            },
        )]
    }
}

/// Budget-constrained zero-intelligence trader for call markets
///
/// Buyers bid uniformly below their limit, sellers ask uniformly above it,
/// one unit at a time until `units` have traded.
pub struct ZeroIntelligenceTrader {
    name: String,
    side: Side,
    tradeable: TradeableId,
    limit: Price,
    spread: Price,
    units: Quantity,
    rng: StdRng,
}

impl ZeroIntelligenceTrader {
    pub fn new(
        name: impl Into<String>,
        side: Side,
        tradeable: TradeableId,
        limit: Price,
        spread: Price,
        seed: u64,
    ) -> Self {
        Self {
            name: name.into(),
            side,
            tradeable,
            limit,
            spread,
            units: Decimal::ONE,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_units(mut self, units: Quantity) -> Self {
        self.units = units;
        self
    }

    fn draw_price(&mut self) -> Option<Price> {
        let cents = |p: Price| (p * Decimal::ONE_HUNDRED).trunc().to_i64();
        let limit = cents(self.limit)?;
        let spread = cents(self.spread)?.max(0);
        let (low, high) = match self.side {
            Side::Buy => ((limit - spread).max(0), limit),
            Side::Sell => (limit, limit + spread),
        };
        if low > high {
            return None;
        }
        Some(Decimal::new(self.rng.gen_range(low..=high), 2))
    }
}

#[async_trait]
impl Agent for ZeroIntelligenceTrader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage> {
        if request.mechanism != MechanismType::CallMarket || !offers(request, self.tradeable) {
            return Vec::new();
        }
        if traded_quantity(request, self.side, self.tradeable) >= self.units {
            return Vec::new();
        }
        let Some(price) = self.draw_price() else {
            return Vec::new();
        };
        vec![TradeMessage::new(
            request.agent,
            request.market_id,
            BidBundle::TwoSided {
                side: self.side,
                tradeable: self.tradeable,
                price,
                quantity: Decimal::ONE,
            },
        )]
    }
}
