use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{Money, Quantity, TradeableId};

/// A sampled valuation over one item set; opaque to the coordinator beyond
/// evaluating bundles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificValuation {
    values: BTreeMap<TradeableId, Money>,
}

impl SpecificValuation {
    pub fn new(values: BTreeMap<TradeableId, Money>) -> Self {
        Self { values }
    }

    pub fn value_of_item(&self, tradeable: TradeableId) -> Option<Money> {
        self.values.get(&tradeable).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &TradeableId> {
        self.values.keys()
    }

    /// Additive value of a bundle
    pub fn value(&self, goods: &BTreeMap<TradeableId, Quantity>) -> Money {
        goods
            .iter()
            .filter_map(|(t, q)| self.values.get(t).map(|v| *v * *q))
            .sum()
    }
}

/// Per-agent valuation for a run: one specific valuation per configured
/// distribution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralValuation {
    parts: Vec<(Vec<TradeableId>, SpecificValuation)>,
}

impl GeneralValuation {
    pub fn new(parts: Vec<(Vec<TradeableId>, SpecificValuation)>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[(Vec<TradeableId>, SpecificValuation)] {
        &self.parts
    }

    /// Value of a bundle; each good is valued by the first part covering it
    pub fn value(&self, goods: &BTreeMap<TradeableId, Quantity>) -> Money {
        let mut total = Decimal::ZERO;
        for (tradeable, quantity) in goods {
            if let Some(v) = self
                .parts
                .iter()
                .find_map(|(_, valuation)| valuation.value_of_item(*tradeable))
            {
                total += v * *quantity;
            }
        }
        total
    }
}
