//! Block-driven confirmation and rollback
//!
//! The gateway is the only component that mutates account signer sets.
//! Confirmation re-checks the quorum under the pool entry lock and commits
//! the new signer set in the same critical section. Every confirmation
//! leaves undo data so a reverted block can restore the previous signer
//! set and hand the transaction back to the pending pool.

use crate::core::{
    AppliedBlock, Ledger, LedgerError, SignerConfig, TxStatus, UndoData, UndoEntry,
    MAX_UNDO_BLOCKS,
};
use crate::multisig::error::MultisigError;
use crate::multisig::pool::{PendingEntry, PendingPool};
use crate::multisig::verifier::{verify_hex, SignatureVerifier};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of applying one block
#[derive(Debug, Clone, Default)]
pub struct BlockReport {
    pub block_id: String,
    /// Registrations confirmed by this block
    pub confirmed: Vec<String>,
    /// Registrations in the block that could not be confirmed
    pub failed: Vec<(String, MultisigError)>,
    /// Block transactions unknown to the pool (other types)
    pub ignored: usize,
}

/// Outcome of reverting one block
#[derive(Debug, Clone, Default)]
pub struct RollbackReport {
    pub block_id: String,
    /// Registrations returned to the pending pool
    pub restored: Vec<String>,
    /// Registrations dropped, with the reason
    pub discarded: Vec<(String, String)>,
}

#[derive(Default)]
struct GatewayState {
    /// Undo data by block ID
    undo: HashMap<String, UndoData>,
    /// Block IDs in application order, for pruning
    order: VecDeque<String>,
    /// Confirmed transaction ID -> block ID
    confirmed: HashMap<String, String>,
}

impl GatewayState {
    fn store(&mut self, undo: UndoData) {
        for tx_id in undo.transaction_ids() {
            self.confirmed.insert(tx_id, undo.block_id.clone());
        }
        self.order.push_back(undo.block_id.clone());
        self.undo.insert(undo.block_id.clone(), undo);

        while self.order.len() > MAX_UNDO_BLOCKS {
            if let Some(oldest) = self.order.pop_front() {
                if let Some(pruned) = self.undo.remove(&oldest) {
                    for tx_id in pruned.transaction_ids() {
                        self.confirmed.remove(&tx_id);
                    }
                }
            }
        }
    }

    fn take(&mut self, block_id: &str) -> Option<UndoData> {
        let undo = self.undo.remove(block_id)?;
        self.order.retain(|id| id != block_id);
        for tx_id in undo.transaction_ids() {
            self.confirmed.remove(&tx_id);
        }
        Some(undo)
    }
}

/// Applies and reverts confirmed registrations against the ledger
pub struct ConfirmationGateway {
    ledger: Arc<dyn Ledger>,
    pool: Arc<PendingPool>,
    verifier: Arc<dyn SignatureVerifier>,
    state: Mutex<GatewayState>,
}

impl ConfirmationGateway {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        pool: Arc<PendingPool>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            ledger,
            pool,
            verifier,
            state: Mutex::new(GatewayState::default()),
        }
    }

    /// Confirm every pending registration included in `block`
    ///
    /// Registrations whose lifetime ran out at `now` fail with
    /// [`MultisigError::Expired`] and leave the pool.
    pub fn confirm_block(&self, block: &AppliedBlock, now: DateTime<Utc>) -> BlockReport {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut undo = UndoData::new(block.block_id.clone(), block.height);
        let mut report = BlockReport {
            block_id: block.block_id.clone(),
            ..Default::default()
        };

        for tx_id in &block.transaction_ids {
            if state.confirmed.contains_key(tx_id) || undo.transaction_ids().contains(tx_id) {
                report
                    .failed
                    .push((tx_id.clone(), MultisigError::AlreadyConfirmed(tx_id.clone())));
                continue;
            }
            if !self.pool.contains(tx_id) {
                report.ignored += 1;
                continue;
            }
            match self.confirm_entry(tx_id, now) {
                Ok(entry) => {
                    log::info!(
                        "Confirmed multisignature {} for {} in block {}",
                        tx_id,
                        entry.address,
                        block.block_id
                    );
                    undo.record(entry);
                    report.confirmed.push(tx_id.clone());
                }
                Err(e) => {
                    log::warn!("Could not confirm {} in block {}: {}", tx_id, block.block_id, e);
                    if Self::invalidates_registration(&e) {
                        self.pool.remove(tx_id);
                    }
                    report.failed.push((tx_id.clone(), e));
                }
            }
        }

        if !undo.is_empty() {
            state.store(undo);
        }
        report
    }

    /// Confirm a single registration in `block`
    pub fn confirm(
        &self,
        tx_id: &str,
        block: &AppliedBlock,
        now: DateTime<Utc>,
    ) -> Result<(), MultisigError> {
        let single = AppliedBlock::new(block.block_id.clone(), block.height, vec![tx_id.to_string()]);
        let mut report = self.confirm_block(&single, now);
        if let Some((_, e)) = report.failed.pop() {
            return Err(e);
        }
        if report.confirmed.is_empty() {
            return Err(MultisigError::UnknownTransaction(tx_id.to_string()));
        }
        Ok(())
    }

    /// Re-check quorum and commit the signer set in one critical section
    fn confirm_entry(&self, tx_id: &str, now: DateTime<Utc>) -> Result<UndoEntry, MultisigError> {
        let (previous, entry) = self.pool.promote(tx_id, now, |entry| {
            let address = entry.transaction.sender_address();
            let account = self
                .ledger
                .get_account(&address)
                .ok_or_else(|| LedgerError::AccountNotFound(address.clone()))?;
            if account.is_multisignature() {
                return Err(MultisigError::AlreadyMultisignature(address));
            }

            let asset = &entry.transaction.asset;
            let config = SignerConfig::new(asset.min, asset.lifetime, asset.member_keys());
            self.ledger.apply_account_mutation(&address, Some(config))?;
            Ok(account.multisignature)
        })?;

        Ok(UndoEntry {
            address: entry.transaction.sender_address(),
            transaction: entry.transaction,
            signatures: entry.signatures,
            previous,
            pending_since: entry.created_at,
        })
    }

    /// Errors after which the registration can never confirm
    fn invalidates_registration(error: &MultisigError) -> bool {
        matches!(
            error,
            MultisigError::AlreadyMultisignature(_)
                | MultisigError::Ledger(LedgerError::AccountNotFound(_))
        )
    }

    /// Reverse the confirmations of `block_id`
    pub fn rollback(&self, block_id: &str, now: DateTime<Utc>) -> RollbackReport {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = RollbackReport {
            block_id: block_id.to_string(),
            ..Default::default()
        };

        let undo = match state.take(block_id) {
            Some(undo) => undo,
            None => return report,
        };

        for entry in undo.entries.into_iter().rev() {
            let tx_id = entry.transaction.id.clone();
            if let Err(e) = self
                .ledger
                .apply_account_mutation(&entry.address, entry.previous.clone())
            {
                log::warn!("Rollback of {} could not restore {}: {}", tx_id, entry.address, e);
                report.discarded.push((tx_id, e.to_string()));
                continue;
            }

            match self.readmit(entry, now) {
                Ok(()) => {
                    log::info!("Returned {} to pending after revert of {}", tx_id, block_id);
                    report.restored.push(tx_id);
                }
                Err(reason) => {
                    log::warn!("Discarded {} after revert of {}: {}", tx_id, block_id, reason);
                    report.discarded.push((tx_id, reason));
                }
            }
        }

        report
    }

    /// Put a reverted registration back in the pool if it still holds
    fn readmit(&self, entry: UndoEntry, now: DateTime<Utc>) -> Result<(), String> {
        let account = self
            .ledger
            .get_account(&entry.address)
            .ok_or_else(|| format!("sender account {} no longer exists", entry.address))?;
        if account.is_multisignature() {
            return Err(format!("account {} already has multisignatures", entry.address));
        }
        if !self.ledger.has_sufficient_balance(&entry.address, entry.transaction.fee) {
            return Err(MultisigError::InsufficientFunds {
                address: entry.address,
                balance: account.balance,
                required: entry.transaction.fee,
            }
            .to_string());
        }

        let transaction = entry.transaction;
        let all_valid = entry.signatures.iter().all(|s| {
            transaction.asset.has_member(&s.signer_public_key)
                && verify_hex(
                    self.verifier.as_ref(),
                    &s.signature,
                    &s.signer_public_key,
                    &transaction,
                )
        });
        if !all_valid {
            return Err("signatures no longer verify".to_string());
        }

        let mut pending = PendingEntry::new(transaction, entry.pending_since);
        pending.signatures = entry.signatures;
        pending.transaction.status = TxStatus::Pending;
        if pending.is_expired(now) {
            return Err(MultisigError::Expired(pending.transaction.id.clone()).to_string());
        }

        self.pool.restore(pending).map_err(|e| e.to_string())
    }

    /// Check if a transaction is confirmed in a retained block
    pub fn is_confirmed(&self, tx_id: &str) -> bool {
        self.confirmed_in(tx_id).is_some()
    }

    /// Block that confirmed `tx_id`
    pub fn confirmed_in(&self, tx_id: &str) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.confirmed.get(tx_id).cloned()
    }

    /// Retained undo data, oldest block first
    pub fn undo_log(&self) -> Vec<UndoData> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .order
            .iter()
            .filter_map(|block_id| state.undo.get(block_id).cloned())
            .collect()
    }

    /// Reload undo data saved by [`undo_log`](Self::undo_log)
    ///
    /// Blocks already known are skipped. The confirmed index is rebuilt
    /// from the restored entries.
    pub fn restore_undo(&self, undo_log: Vec<UndoData>) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut restored = 0;
        for undo in undo_log {
            if undo.is_empty() || state.undo.contains_key(&undo.block_id) {
                continue;
            }
            state.store(undo);
            restored += 1;
        }
        restored
    }

    /// Number of blocks with retained undo data
    pub fn undo_depth(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }
}
