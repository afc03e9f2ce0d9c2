use agora_core::{Ledger, MarketState, MechanismType, PublicId, TradeRequestMessage};
use agora_ports::QueryRule;

/// Trade request carrying the market's tradeables, the current tick, the last
/// clearing price and the full ledger
///
/// The market narrows the ledger through its information policy before the
/// request leaves the coordinator.
pub struct MarketQuery {
    mechanism: MechanismType,
}

impl MarketQuery {
    pub fn new(mechanism: MechanismType) -> Self {
        Self { mechanism }
    }
}

impl QueryRule for MarketQuery {
    fn make_request(
        &self,
        state: &MarketState,
        ledger: &Ledger,
        agent: PublicId,
    ) -> TradeRequestMessage {
        TradeRequestMessage {
            agent,
            market_id: state.market_id(),
            mechanism: self.mechanism,
            tick: state.time(),
            tradeables: state.tradeables().to_vec(),
            transactions: ledger.get_list().to_vec(),
            clearing_price: state.allocation().clearing_price,
        }
    }

    fn mechanism(&self) -> MechanismType {
        self.mechanism
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{MarketId, Tradeable};

    #[test]
    fn test_request_reflects_state() {
        let mut state = MarketState::new(MarketId(3), vec![Tradeable::new(0), Tradeable::new(1)]);
        state.tick();
        let query = MarketQuery::new(MechanismType::CallMarket);

        let request = query.make_request(&state, &Ledger::new(MarketId(3)), PublicId(2));

        assert_eq!(request.agent, PublicId(2));
        assert_eq!(request.market_id, MarketId(3));
        assert_eq!(request.tick, 1);
        assert_eq!(request.tradeables.len(), 2);
        assert_eq!(request.mechanism, MechanismType::CallMarket);
        assert!(request.transactions.is_empty());
    }
}
