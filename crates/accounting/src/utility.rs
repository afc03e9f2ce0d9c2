//! Utility accounting across runs

use std::collections::BTreeMap;

use agora_core::{Money, PublicId};
use agora_ports::{UtilityReporter, UtilityTable};
use log::{debug, info};
use rust_decimal::Decimal;

use crate::accounts::AccountManager;
use crate::valuation::ValuationManager;

/// Accumulates each agent's utility over every run of an experiment
#[derive(Debug, Default)]
pub struct UtilityManager {
    totals: UtilityTable,
    names: BTreeMap<PublicId, String>,
    runs: Vec<UtilityTable>,
}

impl UtilityManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agent_record(&mut self, agent: PublicId, name: Option<String>) {
        self.totals.entry(agent).or_insert(Decimal::ZERO);
        if let Some(name) = name {
            self.names.insert(agent, name);
        }
    }

    /// Add this run's utility to every recorded agent's total
    ///
    /// Utility of a run is the balance change plus the value of the goods
    /// acquired, measured against the agent's endowment.
    pub fn update_utility(
        &mut self,
        accounts: &AccountManager,
        valuations: &ValuationManager,
    ) -> &UtilityTable {
        let mut run = UtilityTable::new();
        for (agent, total) in self.totals.iter_mut() {
            let Some(account) = accounts.account(*agent) else {
                continue;
            };
            let goods_value = valuations
                .agent_valuation(*agent)
                .map(|v| v.value(&account.goods_delta()))
                .unwrap_or(Decimal::ZERO);
            let utility: Money = account.profit() + goods_value;

            debug!("{}: run utility {}", agent, utility);
            *total += utility;
            run.insert(*agent, utility);
        }
        self.runs.push(run);
        &self.runs[self.runs.len() - 1]
    }

    pub fn totals(&self) -> &UtilityTable {
        &self.totals
    }

    pub fn runs(&self) -> &[UtilityTable] {
        &self.runs
    }

    pub fn names(&self) -> &BTreeMap<PublicId, String> {
        &self.names
    }

    pub fn report(&self, reporter: &dyn UtilityReporter) {
        info!(
            "Reporting utility for {} agents over {} runs",
            self.totals.len(),
            self.runs.len()
        );
        reporter.report(&self.totals, &self.names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{AccountUpdate, Endowment, TradeableId};
    use agora_ports::ValuationDistribution;
    use crate::valuation::UniformValuation;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Option<UtilityTable>>);

    impl UtilityReporter for Capture {
        fn report(&self, utilities: &UtilityTable, _names: &BTreeMap<PublicId, String>) {
            *self.0.lock().unwrap() = Some(utilities.clone());
        }
    }

    #[test]
    fn test_cost_only_utility_accumulates() {
        let mut accounts = AccountManager::new();
        let valuations = ValuationManager::default();
        let mut utility = UtilityManager::new();
        accounts.create_account(PublicId(0), Endowment::default());
        utility.add_agent_record(PublicId(0), Some("lemonade".into()));

        for _ in 0..2 {
            let charge = AccountUpdate {
                money: dec!(-12),
                ..AccountUpdate::new(PublicId(0))
            };
            accounts.update_accounts(&[charge]).unwrap();
            utility.update_utility(&accounts, &valuations);
            accounts.reset();
        }

        assert_eq!(utility.totals()[&PublicId(0)], dec!(-24));
        assert_eq!(utility.runs().len(), 2);

        let capture = Capture::default();
        utility.report(&capture);
        assert_eq!(capture.0.lock().unwrap().as_ref().unwrap()[&PublicId(0)], dec!(-24));
    }

    #[test]
    fn test_goods_are_valued() {
        let mut accounts = AccountManager::new();
        let distribution: Box<dyn ValuationDistribution> =
            Box::new(UniformValuation::new(vec![TradeableId(0)], dec!(40), dec!(40), 3).unwrap());
        let mut valuations = ValuationManager::new(vec![distribution]);
        let mut utility = UtilityManager::new();

        accounts.create_account(PublicId(0), Endowment::money(dec!(100)));
        valuations.add_agent_valuation(PublicId(0));
        utility.add_agent_record(PublicId(0), None);

        let mut buy = AccountUpdate::new(PublicId(0));
        buy.money = dec!(-29);
        buy.goods.insert(TradeableId(0), dec!(1));
        accounts.update_accounts(&[buy]).unwrap();

        let run = utility.update_utility(&accounts, &valuations);
        assert_eq!(run[&PublicId(0)], dec!(11));
    }
}
