//! Named agent factories
//!
//! The simulation manager starts one agent per roster entry by looking its
//! key up here, so experiments can be described by name.

use std::collections::BTreeMap;

use crate::agent::Agent;

pub type AgentFactory = Box<dyn Fn() -> Box<dyn Agent> + Send + Sync>;

#[derive(Default)]
pub struct AgentRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `key`. Keys are never overwritten.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Box<dyn Agent> + Send + Sync + 'static,
    {
        let key = key.into();
        if self.factories.contains_key(&key) {
            log::warn!("Agent factory '{}' already registered", key);
            return false;
        }
        self.factories.insert(key, Box::new(factory));
        true
    }

    /// A fresh agent instance, or `None` for an unknown key
    pub fn create(&self, key: &str) -> Option<Box<dyn Agent>> {
        self.factories.get(key).map(|factory| factory())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::FixedSlotAgent;

    #[test]
    fn test_register_and_create() {
        let mut registry = AgentRegistry::new();
        assert!(registry.register("slot-3", || {
            let agent: Box<dyn Agent> = Box::new(FixedSlotAgent::new("slot-3", 3));
            agent
        }));
        assert!(!registry.register("slot-3", || {
            let agent: Box<dyn Agent> = Box::new(FixedSlotAgent::new("other", 0));
            agent
        }));

        let agent = registry.create("slot-3").unwrap();
        assert_eq!(agent.name(), "slot-3");
        assert!(registry.create("missing").is_none());
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["slot-3"]);
    }
}
