//! Per-run endowments

use std::collections::BTreeMap;

use agora_core::{Endowment, Money, PublicId, Quantity, TradeableId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Endowment template granted to every agent at run start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndowmentConfig {
    pub money: Money,
    #[serde(default)]
    pub goods: BTreeMap<TradeableId, Quantity>,
}

impl Default for EndowmentConfig {
    fn default() -> Self {
        Self {
            money: Decimal::ZERO,
            goods: BTreeMap::new(),
        }
    }
}

/// Issues endowments and remembers what each agent was granted this run
#[derive(Debug, Default)]
pub struct EndowmentManager {
    template: EndowmentConfig,
    granted: BTreeMap<PublicId, Endowment>,
}

impl EndowmentManager {
    pub fn new(template: EndowmentConfig) -> Self {
        Self {
            template,
            granted: BTreeMap::new(),
        }
    }

    pub fn make_agent_endowment(&mut self, agent: PublicId) -> Endowment {
        let endowment = Endowment {
            money: self.template.money,
            goods: self.template.goods.clone(),
        };
        self.granted.insert(agent, endowment.clone());
        endowment
    }

    pub fn agent_endowment(&self, agent: PublicId) -> Option<&Endowment> {
        self.granted.get(&agent)
    }

    pub fn reset(&mut self) {
        self.granted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_endowment_follows_template() {
        let template = EndowmentConfig {
            money: dec!(100),
            goods: BTreeMap::from([(TradeableId(0), dec!(2))]),
        };
        let mut manager = EndowmentManager::new(template);

        let endowment = manager.make_agent_endowment(PublicId(4));

        assert_eq!(endowment.money, dec!(100));
        assert_eq!(endowment.goods.get(&TradeableId(0)), Some(&dec!(2)));
        assert_eq!(manager.agent_endowment(PublicId(4)), Some(&endowment));

        manager.reset();
        assert_eq!(manager.agent_endowment(PublicId(4)), None);
    }

    #[test]
    fn test_config_from_json() {
        let config: EndowmentConfig = serde_json::from_str(r#"{"money":"50"}"#).unwrap();
        assert_eq!(config.money, dec!(50));
        assert!(config.goods.is_empty());
    }
}
