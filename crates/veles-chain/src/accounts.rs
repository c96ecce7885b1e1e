use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use veles_types::{AccountName, Asset, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: AccountName,
    pub balance: Asset,
}

/// Account registry with liquid balances. Balance adjustments are the
/// only mutation the worker subsystem performs here (payout
/// installments); account creation is host-side.
#[derive(Debug, Default, Clone)]
pub struct AccountStore {
    accounts: BTreeMap<AccountName, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: AccountName) -> &Account {
        self.accounts.entry(name.clone()).or_insert_with(|| Account {
            name,
            balance: Asset::zero(Symbol::Vls),
        })
    }

    pub fn get(&self, name: &AccountName) -> Result<&Account> {
        self.accounts
            .get(name)
            .ok_or_else(|| ChainError::MissingAccount(name.clone()))
    }

    pub fn contains(&self, name: &AccountName) -> bool {
        self.accounts.contains_key(name)
    }

    pub fn balance(&self, name: &AccountName) -> Result<Asset> {
        Ok(self.get(name)?.balance)
    }

    /// Adjust a balance by `delta` (positive credits, negative debits).
    /// Returns the prior balance so callers can record an undo pre-image.
    pub fn adjust_balance(&mut self, name: &AccountName, delta: Asset) -> Result<Asset> {
        let account = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| ChainError::MissingAccount(name.clone()))?;
        let prior = account.balance;
        account.balance = prior
            .checked_add(delta)
            .ok_or_else(|| ChainError::BalanceOverflow(name.clone()))?;
        info!(
            account = %name,
            delta = %delta,
            balance_before = %prior,
            balance_after = %account.balance,
            "💰 balance adjusted"
        );
        Ok(prior)
    }

    /// Direct restore used by undo handling.
    pub fn set_balance(&mut self, name: &AccountName, balance: Asset) -> Result<()> {
        let account = self
            .accounts
            .get_mut(name)
            .ok_or_else(|| ChainError::MissingAccount(name.clone()))?;
        account.balance = balance;
        Ok(())
    }
}
