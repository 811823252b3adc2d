//! Ledger accounts and their signer configuration

use serde::{Deserialize, Serialize};

/// Signer set of a multisignature account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Signatures required to authorize a spend
    pub min: u8,
    /// Lifetime (hours) of pending transactions for this account
    pub lifetime: u8,
    /// Co-signer public keys in keysgroup order
    pub keys: Vec<String>,
}

impl SignerConfig {
    pub fn new(min: u8, lifetime: u8, keys: Vec<String>) -> Self {
        Self {
            min,
            lifetime,
            keys,
        }
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.min, self.keys.len())
    }
}

/// A ledger account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    /// Hex public key, known once the account has signed something
    pub public_key: Option<String>,
    /// Balance in base units
    pub balance: u64,
    /// `None` for a single-key account
    pub multisignature: Option<SignerConfig>,
}

impl Account {
    pub fn new(address: impl Into<String>, balance: u64) -> Self {
        Self {
            address: address.into(),
            public_key: None,
            balance,
            multisignature: None,
        }
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    pub fn is_multisignature(&self) -> bool {
        self.multisignature.is_some()
    }
}
