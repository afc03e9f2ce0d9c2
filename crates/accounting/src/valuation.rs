//! Private valuations, sampled once per agent per run

use std::collections::BTreeMap;

use agora_core::{GeneralValuation, Money, PublicId, SpecificValuation, TradeableId, ValuationMessage};
use agora_ports::ValuationDistribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{AccountingError, Result};

/// Independent uniform values in `[low, high]` per item, in cents
pub struct UniformValuation {
    items: Vec<TradeableId>,
    low: i64,
    high: i64,
    rng: StdRng,
}

impl UniformValuation {
    pub fn new(items: Vec<TradeableId>, low: Money, high: Money, seed: u64) -> Result<Self> {
        let cents = |m: Money| (m * Decimal::ONE_HUNDRED).trunc().to_i64();
        match (cents(low), cents(high)) {
            (Some(lo), Some(hi)) if lo <= hi => Ok(Self {
                items,
                low: lo,
                high: hi,
                rng: StdRng::seed_from_u64(seed),
            }),
            _ => Err(AccountingError::InvalidRange {
                low: low.to_string(),
                high: high.to_string(),
            }),
        }
    }
}

impl ValuationDistribution for UniformValuation {
    fn items(&self) -> &[TradeableId] {
        &self.items
    }

    fn sample(&mut self) -> SpecificValuation {
        let values = self
            .items
            .iter()
            .map(|item| (*item, Decimal::new(self.rng.gen_range(self.low..=self.high), 2)))
            .collect();
        SpecificValuation::new(values)
    }
}

/// Holds the configured distributions and this run's sampled valuations
#[derive(Default)]
pub struct ValuationManager {
    distributions: Vec<Box<dyn ValuationDistribution>>,
    valuations: BTreeMap<PublicId, GeneralValuation>,
}

impl ValuationManager {
    pub fn new(distributions: Vec<Box<dyn ValuationDistribution>>) -> Self {
        Self {
            distributions,
            valuations: BTreeMap::new(),
        }
    }

    /// Sample a fresh valuation for `agent` from every distribution
    pub fn add_agent_valuation(&mut self, agent: PublicId) -> &GeneralValuation {
        let parts = self
            .distributions
            .iter_mut()
            .map(|d| (d.items().to_vec(), d.sample()))
            .collect();
        self.valuations.insert(agent, GeneralValuation::new(parts));
        &self.valuations[&agent]
    }

    pub fn agent_valuation(&self, agent: PublicId) -> Option<&GeneralValuation> {
        self.valuations.get(&agent)
    }

    pub fn construct_valuation_messages(&self, agents: &[PublicId]) -> Vec<ValuationMessage> {
        agents
            .iter()
            .filter_map(|agent| {
                self.valuations.get(agent).map(|valuation| ValuationMessage {
                    agent: *agent,
                    valuation: valuation.clone(),
                })
            })
            .collect()
    }

    /// Forget sampled valuations; distributions keep their random state so
    /// the next run draws new values
    pub fn reset(&mut self) {
        self.valuations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_uniform_valuation_in_range_and_seeded() {
        let items = vec![TradeableId(0), TradeableId(1)];
        let mut a = UniformValuation::new(items.clone(), dec!(10), dec!(20), 7).unwrap();
        let mut b = UniformValuation::new(items, dec!(10), dec!(20), 7).unwrap();

        for _ in 0..50 {
            let sample = a.sample();
            assert_eq!(sample, b.sample());
            for item in [TradeableId(0), TradeableId(1)] {
                let v = sample.value_of_item(item).unwrap();
                assert!(v >= dec!(10) && v <= dec!(20));
            }
        }
    }

    #[test]
    fn test_invalid_range() {
        assert!(UniformValuation::new(vec![], dec!(5), dec!(1), 0).is_err());
    }

    #[test]
    fn test_manager_samples_and_resets() {
        let distribution: Box<dyn ValuationDistribution> =
            Box::new(UniformValuation::new(vec![TradeableId(0)], dec!(1), dec!(2), 1).unwrap());
        let mut manager = ValuationManager::new(vec![distribution]);

        manager.add_agent_valuation(PublicId(0));
        let messages = manager.construct_valuation_messages(&[PublicId(0), PublicId(1)]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].valuation.parts().len(), 1);

        manager.reset();
        assert!(manager.agent_valuation(PublicId(0)).is_none());
    }
}
