//! Simulation configuration

use std::time::Duration;

use agora_accounting::{EndowmentConfig, UniformValuation};
use agora_core::{Money, TradeableId};
use agora_market::MarketBlock;
use agora_ports::ValuationDistribution;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Delays around the experiment, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationTiming {
    /// Before agents are asked to register
    #[serde(default)]
    pub starting_delay_ms: u64,
    /// Between ticks of the market loop
    #[serde(default)]
    pub simulation_delay_ms: u64,
    /// After agents receive their valuations, before markets open
    #[serde(default)]
    pub learning_delay_ms: u64,
}

impl SimulationTiming {
    pub fn starting_delay(&self) -> Duration {
        Duration::from_millis(self.starting_delay_ms)
    }

    pub fn simulation_delay(&self) -> Duration {
        Duration::from_millis(self.simulation_delay_ms)
    }

    pub fn learning_delay(&self) -> Duration {
        Duration::from_millis(self.learning_delay_ms)
    }
}

/// Uniform private values over an item set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub items: Vec<TradeableId>,
    pub low: Money,
    pub high: Money,
    #[serde(default)]
    pub seed: u64,
}

impl ValuationConfig {
    pub fn distribution(&self) -> Result<Box<dyn ValuationDistribution>> {
        let distribution =
            UniformValuation::new(self.items.clone(), self.low, self.high, self.seed)?;
        Ok(Box::new(distribution))
    }
}

/// Everything needed to build a world: endowments, valuations and the
/// market blocks to run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub endowment: EndowmentConfig,
    #[serde(default)]
    pub valuations: Vec<ValuationConfig>,
    pub blocks: Vec<MarketBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_rules::Mechanism;

    #[test]
    fn test_world_config_from_json() {
        let json = r#"{
            "endowment": {"money": "100"},
            "valuations": [{"items": [0], "low": "10", "high": "20", "seed": 4}],
            "blocks": [{"templates": [
                {"mechanism": {"type": "sealed-bid", "pricing": "second-price"},
                 "tradeables": [{"id": 0, "count": "1"}]}
            ]}]
        }"#;
        let config: WorldConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.blocks.len(), 1);
        assert!(matches!(
            config.blocks[0].templates[0].mechanism,
            Mechanism::SealedBid { .. }
        ));
        assert!(config.valuations[0].distribution().is_ok());
    }

    #[test]
    fn test_timing_defaults_to_no_delay() {
        let timing: SimulationTiming = serde_json::from_str("{}").unwrap();
        assert_eq!(timing, SimulationTiming::default());
        assert_eq!(timing.learning_delay(), Duration::ZERO);
    }
}
