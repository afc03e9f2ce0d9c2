use agora_core::{SpecificValuation, TradeableId};

/// Source of private valuations, sampled once per agent per run
pub trait ValuationDistribution: Send {
    /// Item set the sampled valuations cover
    fn items(&self) -> &[TradeableId];

    fn sample(&mut self) -> SpecificValuation;
}
