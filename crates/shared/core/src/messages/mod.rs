//! Agent-facing message kinds
//!
//! These are the payloads the coordinator pushes to agents. How they travel
//! (channels, sockets, encodings) is the messaging crate's concern.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{GeneralValuation, Tradeable, Transaction};
use crate::values::{MarketId, Money, Price, PublicId, Quantity, TradeableId};

/// Mechanism family a trade request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MechanismType {
    /// Congestion / location game: agents pick a slot and share its cost
    CostSharing,
    /// Two-sided call market cleared at a uniform price each tick
    CallMarket,
    /// Sealed-bid auction per tradeable
    SealedBid,
}

/// Registration acknowledgement carrying the agent's public id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationMessage {
    pub public_id: PublicId,
    pub name: Option<String>,
}

/// Account initialization or settlement result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankUpdateMessage {
    pub agent: PublicId,
    /// `None` for the initialization message sent at run start
    pub market_id: Option<MarketId>,
    pub money_delta: Money,
    pub goods_delta: BTreeMap<TradeableId, Quantity>,
    pub balance: Money,
    pub goods: BTreeMap<TradeableId, Quantity>,
}

/// The agent's private valuation for the current run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationMessage {
    pub agent: PublicId,
    pub valuation: GeneralValuation,
}

/// Invitation to bid in a market for the coming tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequestMessage {
    pub agent: PublicId,
    pub market_id: MarketId,
    pub mechanism: MechanismType,
    pub tick: u64,
    pub tradeables: Vec<Tradeable>,
    /// Ledger snapshot, already sanitized for `agent`
    pub transactions: Vec<Transaction>,
    pub clearing_price: Option<Price>,
}

/// Outcome of a finished market as visible to one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationMessage {
    pub agent: PublicId,
    pub market_id: MarketId,
    pub ticks: u64,
    /// Goods the agent was allocated (negative when sold)
    pub allocation: BTreeMap<TradeableId, Quantity>,
    /// Net money the agent paid (positive) or received (negative)
    pub payment: Money,
    pub transactions: Vec<Transaction>,
    pub clearing_price: Option<Price>,
}

/// End-of-run report: every market finalized in the run, sanitized per agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReportMessage {
    pub agent: PublicId,
    pub markets: Vec<InformationMessage>,
}

/// Any message the coordinator delivers to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Registration(RegistrationMessage),
    BankUpdate(BankUpdateMessage),
    Valuation(ValuationMessage),
    TradeRequest(TradeRequestMessage),
    Information(InformationMessage),
    SimulationReport(SimulationReportMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Registration(_) => "registration",
            Message::BankUpdate(_) => "bank update",
            Message::Valuation(_) => "valuation",
            Message::TradeRequest(_) => "trade request",
            Message::Information(_) => "information",
            Message::SimulationReport(_) => "simulation report",
        }
    }
}
