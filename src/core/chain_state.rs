//! Chain events and undo data
//!
//! Block processing lives outside this crate. It reports applied and
//! reverted blocks as [`ChainEvent`]s; confirmations keep [`UndoData`]
//! per block so a reorganization can restore the previous signer sets.

use crate::core::account::SignerConfig;
use crate::core::transaction::{SignatureRecord, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of blocks whose undo data is retained
pub const MAX_UNDO_BLOCKS: usize = 1000;

/// A block accepted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBlock {
    pub block_id: String,
    pub height: u64,
    /// Transactions included in the block, in block order
    pub transaction_ids: Vec<String>,
}

impl AppliedBlock {
    pub fn new(block_id: impl Into<String>, height: u64, transaction_ids: Vec<String>) -> Self {
        Self {
            block_id: block_id.into(),
            height,
            transaction_ids,
        }
    }
}

/// Notifications emitted by block processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A block was applied to the active chain
    BlockApplied(AppliedBlock),
    /// A previously applied block was reverted (fork resolution)
    BlockReverted { block_id: String },
}

/// What a confirmed registration changed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoEntry {
    pub transaction: Transaction,
    /// Signatures that confirmed the transaction
    pub signatures: Vec<SignatureRecord>,
    /// Sender address whose signer set was replaced
    pub address: String,
    /// Signer set before the confirmation
    pub previous: Option<SignerConfig>,
    /// When the transaction entered the pending pool
    pub pending_since: DateTime<Utc>,
}

/// Data required to undo one block's confirmations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoData {
    pub block_id: String,
    pub height: u64,
    /// Entries in confirmation order
    pub entries: Vec<UndoEntry>,
}

impl UndoData {
    pub fn new(block_id: String, height: u64) -> Self {
        Self {
            block_id,
            height,
            entries: Vec::new(),
        }
    }

    /// Record a confirmation for potential reversal
    pub fn record(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Confirmed transaction IDs in this block
    pub fn transaction_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.transaction.id.clone())
            .collect()
    }
}
