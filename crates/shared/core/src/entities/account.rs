use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{Money, PublicId, Quantity, TradeableId};

/// Initial money and goods granted to an agent at the start of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endowment {
    pub money: Money,
    pub goods: BTreeMap<TradeableId, Quantity>,
}

impl Endowment {
    pub fn money(money: Money) -> Self {
        Self {
            money,
            goods: BTreeMap::new(),
        }
    }

    pub fn with_good(mut self, tradeable: TradeableId, quantity: Quantity) -> Self {
        self.goods.insert(tradeable, quantity);
        self
    }
}

/// Ledger-ready change to one agent's account, produced when a market finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub agent: PublicId,
    pub money: Money,
    pub goods: BTreeMap<TradeableId, Quantity>,
}

impl AccountUpdate {
    pub fn new(agent: PublicId) -> Self {
        Self {
            agent,
            money: Decimal::ZERO,
            goods: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.money.is_zero() && self.goods.values().all(|q| q.is_zero())
    }
}

/// Per-agent, per-run monetary balance and goods holdings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub agent: PublicId,
    balance: Money,
    goods: BTreeMap<TradeableId, Quantity>,
    endowment: Endowment,
}

impl Account {
    pub fn new(agent: PublicId, endowment: Endowment) -> Self {
        Self {
            agent,
            balance: endowment.money,
            goods: endowment.goods.clone(),
            endowment,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn goods(&self) -> &BTreeMap<TradeableId, Quantity> {
        &self.goods
    }

    pub fn endowment(&self) -> &Endowment {
        &self.endowment
    }

    /// Add (or with a negative amount, subtract) money
    pub fn add(&mut self, delta: Money) {
        self.balance += delta;
    }

    pub fn add_good(&mut self, tradeable: TradeableId, quantity: Quantity) {
        let held = self.goods.entry(tradeable).or_insert(Decimal::ZERO);
        *held += quantity;
        if held.is_zero() {
            self.goods.remove(&tradeable);
        }
    }

    pub fn apply(&mut self, update: &AccountUpdate) {
        self.add(update.money);
        for (tradeable, quantity) in &update.goods {
            self.add_good(*tradeable, *quantity);
        }
    }

    /// Replace the endowment and restore the baseline
    pub fn reendow(&mut self, endowment: Endowment) {
        self.endowment = endowment;
        self.reset();
    }

    /// Restore balance and goods to the endowment baseline
    pub fn reset(&mut self) {
        self.balance = self.endowment.money;
        self.goods = self.endowment.goods.clone();
    }

    /// Balance change since the endowment was granted
    pub fn profit(&self) -> Money {
        self.balance - self.endowment.money
    }

    /// Goods gained (positive) or given up (negative) relative to the endowment
    pub fn goods_delta(&self) -> BTreeMap<TradeableId, Quantity> {
        let mut delta = self.goods.clone();
        for (tradeable, quantity) in &self.endowment.goods {
            *delta.entry(*tradeable).or_insert(Decimal::ZERO) -= *quantity;
        }
        delta.retain(|_, q| !q.is_zero());
        delta
    }
}
