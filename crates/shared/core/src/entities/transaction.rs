use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::Party;
use crate::values::{MarketId, Price, PublicId, Quantity, Timestamp, TradeableId};

/// Unique identifier for a transaction
pub type TransactionId = Uuid;

/// One executed trade, appended to a market ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub market_id: MarketId,
    /// Logical market time at which the trade cleared
    pub tick: u64,
    pub seller: Party,
    pub buyer: Party,
    pub tradeable: TradeableId,
    pub quantity: Quantity,
    pub price: Price,
    pub timestamp: Timestamp,
}

impl Transaction {
    pub fn new(
        market_id: MarketId,
        tick: u64,
        seller: Party,
        buyer: Party,
        tradeable: TradeableId,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            market_id,
            tick,
            seller,
            buyer,
            tradeable,
            quantity,
            price,
            timestamp: Utc::now(),
        }
    }

    pub fn involves(&self, agent: PublicId) -> bool {
        self.seller.is_agent(agent) || self.buyer.is_agent(agent)
    }

    /// Returns the notional value of the trade (price * quantity)
    pub fn notional(&self) -> Price {
        self.price * self.quantity
    }
}
