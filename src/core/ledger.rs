//! Ledger account store contract
//!
//! The multisignature engine never owns account state. It reads
//! accounts and balances through [`Ledger`] and commits signer-set
//! changes through [`Ledger::apply_account_mutation`].

use crate::core::account::{Account, SignerConfig};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Ledger store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

/// Read/write contract with the account store
pub trait Ledger: Send + Sync {
    /// Look up an account
    fn get_account(&self, address: &str) -> Option<Account>;

    /// Check if `address` can pay `amount`
    fn has_sufficient_balance(&self, address: &str, amount: u64) -> bool {
        self.get_account(address)
            .map(|account| account.balance >= amount)
            .unwrap_or(false)
    }

    /// Replace the signer configuration of an account
    fn apply_account_mutation(
        &self,
        address: &str,
        signer_config: Option<SignerConfig>,
    ) -> Result<(), LedgerError>;
}

/// Account store held in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from existing accounts
    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        let map = accounts
            .into_iter()
            .map(|account| (account.address.clone(), account))
            .collect();
        Self {
            accounts: RwLock::new(map),
        }
    }

    /// Credit an account, creating it if needed
    pub fn credit(&self, address: &str, amount: u64) -> u64 {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let account = accounts
            .entry(address.to_string())
            .or_insert_with(|| Account::new(address, 0));
        account.balance = account.balance.saturating_add(amount);
        account.balance
    }

    /// Insert or replace an account
    pub fn insert_account(&self, account: Account) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(account.address.clone(), account);
    }

    /// Remove an account (used when a fork erases it)
    pub fn remove_account(&self, address: &str) -> Option<Account> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.remove(address)
    }

    /// All accounts, sorted by address
    pub fn accounts(&self) -> Vec<Account> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<Account> = accounts.values().cloned().collect();
        list.sort_by(|a, b| a.address.cmp(&b.address));
        list
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Ledger for InMemoryLedger {
    fn get_account(&self, address: &str) -> Option<Account> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(address).cloned()
    }

    fn apply_account_mutation(
        &self,
        address: &str,
        signer_config: Option<SignerConfig>,
    ) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let account = accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))?;
        account.multisignature = signer_config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_creates_account() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.get_account("1abc").is_none());
        assert!(!ledger.has_sufficient_balance("1abc", 1));

        assert_eq!(ledger.credit("1abc", 100), 100);
        assert_eq!(ledger.credit("1abc", 50), 150);
        assert!(ledger.has_sufficient_balance("1abc", 150));
        assert!(!ledger.has_sufficient_balance("1abc", 151));
    }

    #[test]
    fn test_apply_mutation() {
        let ledger = InMemoryLedger::new();
        ledger.credit("1abc", 100);

        let config = SignerConfig::new(1, 24, vec!["aa".to_string()]);
        ledger
            .apply_account_mutation("1abc", Some(config.clone()))
            .unwrap();
        assert_eq!(
            ledger.get_account("1abc").unwrap().multisignature,
            Some(config)
        );

        ledger.apply_account_mutation("1abc", None).unwrap();
        assert!(!ledger.get_account("1abc").unwrap().is_multisignature());
    }

    #[test]
    fn test_mutation_of_missing_account_fails() {
        let ledger = InMemoryLedger::new();
        assert_eq!(
            ledger.apply_account_mutation("nobody", None),
            Err(LedgerError::AccountNotFound("nobody".to_string()))
        );
    }
}
