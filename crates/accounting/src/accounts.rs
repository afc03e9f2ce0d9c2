//! Per-agent accounts for the current run

use std::collections::BTreeMap;

use agora_core::{
    Account, AccountUpdate, BankUpdateMessage, Endowment, MarketId, PublicId,
};
use log::{debug, warn};

use crate::error::{AccountingError, Result};

/// Owns every agent's account; accounts are reset between runs, not deleted
#[derive(Debug, Default)]
pub struct AccountManager {
    accounts: BTreeMap<PublicId, Account>,
}

impl AccountManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account funded with `endowment`. Returns false if the agent
    /// already has one.
    pub fn create_account(&mut self, agent: PublicId, endowment: Endowment) -> bool {
        if self.accounts.contains_key(&agent) {
            warn!("Account for {} already exists", agent);
            return false;
        }
        self.accounts.insert(agent, Account::new(agent, endowment));
        true
    }

    /// Replace an agent's endowment and restore its account to it
    pub fn reendow(&mut self, agent: PublicId, endowment: Endowment) -> Result<()> {
        let account = self
            .accounts
            .get_mut(&agent)
            .ok_or(AccountingError::UnknownAccount(agent))?;
        account.reendow(endowment);
        Ok(())
    }

    /// Create the account, or reendow it if it survived from an earlier run
    pub fn endow(&mut self, agent: PublicId, endowment: Endowment) {
        match self.accounts.get_mut(&agent) {
            Some(account) => account.reendow(endowment),
            None => {
                self.accounts.insert(agent, Account::new(agent, endowment));
            }
        }
    }

    pub fn contains_account(&self, agent: PublicId) -> bool {
        self.accounts.contains_key(&agent)
    }

    pub fn account(&self, agent: PublicId) -> Option<&Account> {
        self.accounts.get(&agent)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Apply a batch of updates. Every target account must exist; otherwise
    /// nothing is applied.
    pub fn update_accounts(&mut self, updates: &[AccountUpdate]) -> Result<()> {
        if let Some(missing) = updates
            .iter()
            .find(|u| !self.accounts.contains_key(&u.agent))
        {
            return Err(AccountingError::UnknownAccount(missing.agent));
        }

        for update in updates {
            if let Some(account) = self.accounts.get_mut(&update.agent) {
                account.apply(update);
                debug!(
                    "{}: balance {} after {}",
                    update.agent,
                    account.balance(),
                    update.money
                );
            }
        }
        Ok(())
    }

    /// Initial bank update for each of `agents`, describing its fresh account
    pub fn construct_initialization_messages(
        &self,
        agents: &[PublicId],
    ) -> Vec<BankUpdateMessage> {
        agents
            .iter()
            .filter_map(|agent| self.accounts.get(agent))
            .map(|account| BankUpdateMessage {
                agent: account.agent,
                market_id: None,
                money_delta: account.balance(),
                goods_delta: account.goods().clone(),
                balance: account.balance(),
                goods: account.goods().clone(),
            })
            .collect()
    }

    /// Bank updates reporting already-applied settlement results
    pub fn construct_bank_update_messages(
        &self,
        market_id: MarketId,
        updates: &[AccountUpdate],
    ) -> Vec<BankUpdateMessage> {
        updates
            .iter()
            .filter_map(|update| {
                self.accounts.get(&update.agent).map(|account| BankUpdateMessage {
                    agent: update.agent,
                    market_id: Some(market_id),
                    money_delta: update.money,
                    goods_delta: update.goods.clone(),
                    balance: account.balance(),
                    goods: account.goods().clone(),
                })
            })
            .collect()
    }

    /// Restore every account to its endowment baseline
    pub fn reset(&mut self) {
        for account in self.accounts.values_mut() {
            account.reset();
        }
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
    }
}
