use serde::{Deserialize, Serialize};

use super::transaction::Transaction;
use crate::values::{MarketId, PublicId};

/// Append-only transaction log of one market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    market_id: Option<MarketId>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(market_id: MarketId) -> Self {
        Self {
            market_id: Some(market_id),
            transactions: Vec::new(),
        }
    }

    pub fn market_id(&self) -> Option<MarketId> {
        self.market_id
    }

    pub fn add(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn add_all(&mut self, transactions: impl IntoIterator<Item = Transaction>) {
        self.transactions.extend(transactions);
    }

    /// Ordered, immutable history
    pub fn get_list(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions in which `agent` is buyer or seller
    pub fn for_agent(&self, agent: PublicId) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.involves(agent))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Only called between simulation runs
    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Party;
    use crate::values::TradeableId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_preserves_order() {
        let market = MarketId(1);
        let mut ledger = Ledger::new(market);
        for tick in 0..3 {
            ledger.add(Transaction::new(
                market,
                tick,
                Party::Agent(PublicId(0)),
                Party::Agent(PublicId(1)),
                TradeableId(0),
                dec!(1),
                dec!(10),
            ));
        }
        let ticks: Vec<u64> = ledger.get_list().iter().map(|t| t.tick).collect();
        assert_eq!(ticks, vec![0, 1, 2]);
        assert_eq!(ledger.for_agent(PublicId(1)).len(), 3);
        assert!(ledger.for_agent(PublicId(2)).is_empty());

        ledger.clear();
        assert!(ledger.is_empty());
    }
}
