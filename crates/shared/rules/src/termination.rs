use agora_core::MarketState;
use agora_ports::TerminationCondition;

/// Over once the market has ticked `ticks` times
pub struct TickBudget {
    ticks: u64,
}

impl TickBudget {
    pub fn new(ticks: u64) -> Self {
        Self { ticks }
    }
}

impl TerminationCondition for TickBudget {
    fn is_over(&self, state: &MarketState) -> bool {
        state.time() >= self.ticks
    }

    fn name(&self) -> &str {
        "Tick Budget"
    }
}

/// Over when a tick after `min_ticks` accepted no bids
pub struct Quiescence {
    min_ticks: u64,
}

impl Quiescence {
    pub fn new(min_ticks: u64) -> Self {
        Self { min_ticks }
    }
}

impl TerminationCondition for Quiescence {
    fn is_over(&self, state: &MarketState) -> bool {
        state.time() >= self.min_ticks && state.accepted_last_tick() == 0
    }

    fn name(&self) -> &str {
        "Quiescence"
    }
}

/// Over as soon as any inner condition is
pub struct AnyOf {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl AnyOf {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self { conditions }
    }
}

impl TerminationCondition for AnyOf {
    fn is_over(&self, state: &MarketState) -> bool {
        self.conditions.iter().any(|c| c.is_over(state))
    }

    fn name(&self) -> &str {
        "Any Of"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{BidBundle, MarketId, PublicId, TradeMessage};

    #[test]
    fn test_tick_budget() {
        let rule = TickBudget::new(2);
        let mut state = MarketState::new(MarketId(0), Vec::new());

        assert!(!rule.is_over(&state));
        state.tick();
        assert!(!rule.is_over(&state));
        state.tick();
        assert!(rule.is_over(&state));
    }

    #[test]
    fn test_quiescence_waits_for_quiet_tick() {
        let rule = Quiescence::new(1);
        let mut state = MarketState::new(MarketId(0), Vec::new());

        state.add_bid(TradeMessage::new(
            PublicId(0),
            MarketId(0),
            BidBundle::Position { slot: 0 },
        ));
        state.tick();
        assert!(!rule.is_over(&state));

        state.tick();
        assert!(rule.is_over(&state));
    }

    #[test]
    fn test_any_of() {
        let budget: Box<dyn TerminationCondition> = Box::new(TickBudget::new(10));
        let quiet: Box<dyn TerminationCondition> = Box::new(Quiescence::new(1));
        let rule = AnyOf::new(vec![budget, quiet]);
        let mut state = MarketState::new(MarketId(0), Vec::new());

        state.tick();
        assert!(rule.is_over(&state));
    }
}
