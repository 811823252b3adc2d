//! Registration lifecycle
//!
//! `Received -> Validated -> Pending -> Ready -> Confirmed`, with
//! `Rejected` for failed validation and `Expired` for entries whose
//! lifetime ran out. Confirmation is driven only by chain events.

use crate::core::{AppliedBlock, ChainEvent, Ledger, Transaction, TxStatus};
use crate::multisig::config::EngineConfig;
use crate::multisig::error::MultisigError;
use crate::multisig::gateway::{BlockReport, ConfirmationGateway, RollbackReport};
use crate::multisig::keysgroup::KeysgroupValidator;
use crate::multisig::pool::{ExpiredTransaction, PendingEntry, PendingPool, SignatureOutcome};
use crate::multisig::verifier::{verify_hex, verify_sender, SchnorrVerifier, SignatureVerifier};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Sent once per transaction when it reaches quorum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyNotice {
    pub transaction_id: String,
    pub sender_address: String,
    pub signatures: usize,
}

/// Result of handling a chain event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Applied(BlockReport),
    Reverted(RollbackReport),
}

/// Drives registrations from submission to confirmation
pub struct TransactionStateMachine {
    config: EngineConfig,
    validator: KeysgroupValidator,
    verifier: Arc<dyn SignatureVerifier>,
    ledger: Arc<dyn Ledger>,
    pool: Arc<PendingPool>,
    gateway: ConfirmationGateway,
    ready_tx: Mutex<Option<mpsc::UnboundedSender<ReadyNotice>>>,
}

impl TransactionStateMachine {
    /// Create an engine over `ledger` using Schnorr verification
    pub fn new(config: EngineConfig, ledger: Arc<dyn Ledger>) -> Self {
        Self::with_verifier(config, ledger, Arc::new(SchnorrVerifier))
    }

    pub fn with_verifier(
        config: EngineConfig,
        ledger: Arc<dyn Ledger>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let pool = Arc::new(PendingPool::new(verifier.clone()));
        let gateway = ConfirmationGateway::new(ledger.clone(), pool.clone(), verifier.clone());
        Self {
            validator: KeysgroupValidator::from_config(&config),
            config,
            verifier,
            ledger,
            pool,
            gateway,
            ready_tx: Mutex::new(None),
        }
    }

    /// Subscribe to Ready transitions; replaces any earlier subscriber
    pub fn ready_notifications(&self) -> mpsc::UnboundedReceiver<ReadyNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.ready_tx.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    // ===== Submission =====

    /// Validate a registration and admit it to the pending pool
    pub fn submit_transaction(&self, mut tx: Transaction) -> Result<String, MultisigError> {
        tx.status = TxStatus::Received;
        if let Err(e) = self.validate_transaction(&tx) {
            log::warn!("Rejected multisignature {}: {}", tx.id, e);
            return Err(e);
        }
        tx.status = TxStatus::Validated;

        let tx_id = tx.id.clone();
        let members = tx.asset.keysgroup.len();
        let min = tx.asset.min;
        self.pool.admit(tx)?;
        log::info!(
            "Admitted multisignature {} ({} of {} signatures required)",
            tx_id,
            min,
            members
        );
        Ok(tx_id)
    }

    fn validate_transaction(&self, tx: &Transaction) -> Result<(), MultisigError> {
        if !tx.is_multisignature() {
            return Err(MultisigError::InvalidTransactionType(tx.tx_type));
        }

        self.validator.validate(&tx.asset, &tx.sender_public_key)?;

        let expected = self
            .config
            .fees
            .multisignature_fee(tx.asset.keysgroup.len());
        if tx.fee != expected {
            return Err(MultisigError::InvalidFee {
                expected,
                actual: tx.fee,
            });
        }
        if !tx.has_valid_id() {
            return Err(MultisigError::InvalidTransactionId);
        }
        if !verify_sender(self.verifier.as_ref(), tx) {
            return Err(MultisigError::SignatureVerificationFailed);
        }
        if self.gateway.is_confirmed(&tx.id) {
            return Err(MultisigError::AlreadyConfirmed(tx.id.clone()));
        }
        if self.pool.was_expired(&tx.id) {
            return Err(MultisigError::Expired(tx.id.clone()));
        }

        let address = tx.sender_address();
        let account = self.ledger.get_account(&address);
        if account.as_ref().is_some_and(|a| a.is_multisignature()) {
            return Err(MultisigError::AlreadyMultisignature(address));
        }
        if !self.ledger.has_sufficient_balance(&address, tx.fee) {
            return Err(MultisigError::InsufficientFunds {
                balance: account.map(|a| a.balance).unwrap_or(0),
                address,
                required: tx.fee,
            });
        }
        Ok(())
    }

    /// Record a co-signer signature on a pending registration
    pub fn submit_signature(
        &self,
        tx_id: &str,
        signer_public_key: &str,
        signature: &str,
    ) -> Result<SignatureOutcome, MultisigError> {
        self.submit_signature_at(tx_id, signer_public_key, signature, Utc::now())
    }

    pub fn submit_signature_at(
        &self,
        tx_id: &str,
        signer_public_key: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<SignatureOutcome, MultisigError> {
        if self.pool.is_expired(tx_id, now) {
            self.pool.expire(tx_id);
            return Err(MultisigError::Expired(tx_id.to_string()));
        }
        if !self.pool.contains(tx_id) && self.pool.was_expired(tx_id) {
            return Err(MultisigError::Expired(tx_id.to_string()));
        }
        if !self.pool.contains(tx_id) && self.gateway.is_confirmed(tx_id) {
            return Err(MultisigError::AlreadyConfirmed(tx_id.to_string()));
        }

        let outcome = self
            .pool
            .record_signature(tx_id, signer_public_key, signature)?;
        log::debug!(
            "Accepted signature from {} on {} ({}/{})",
            signer_public_key,
            tx_id,
            outcome.accepted,
            outcome.required
        );

        if outcome.became_ready {
            log::info!("Multisignature {} is ready for confirmation", tx_id);
            self.notify_ready(tx_id, outcome.accepted);
        }
        Ok(outcome)
    }

    fn notify_ready(&self, tx_id: &str, signatures: usize) {
        let mut sender = self.ready_tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            return;
        };
        let sender_address = self
            .pool
            .get(tx_id)
            .map(|entry| entry.transaction.sender_address())
            .unwrap_or_default();
        let notice = ReadyNotice {
            transaction_id: tx_id.to_string(),
            sender_address,
            signatures,
        };
        if tx.send(notice).is_err() {
            log::debug!("Ready subscriber dropped");
            *sender = None;
        }
    }

    // ===== Chain events =====

    pub fn handle_event(&self, event: ChainEvent) -> EventOutcome {
        match event {
            ChainEvent::BlockApplied(block) => EventOutcome::Applied(self.apply_block(&block)),
            ChainEvent::BlockReverted { block_id } => {
                EventOutcome::Reverted(self.revert_block(&block_id))
            }
        }
    }

    /// Confirm the registrations included in an applied block
    pub fn apply_block(&self, block: &AppliedBlock) -> BlockReport {
        self.apply_block_at(block, Utc::now())
    }

    pub fn apply_block_at(&self, block: &AppliedBlock, now: DateTime<Utc>) -> BlockReport {
        let report = self.gateway.confirm_block(block, now);
        if !report.confirmed.is_empty() || !report.failed.is_empty() {
            log::info!(
                "Block {} at height {}: {} confirmed, {} failed",
                block.block_id,
                block.height,
                report.confirmed.len(),
                report.failed.len()
            );
        }
        report
    }

    /// Undo the confirmations of a reverted block
    pub fn revert_block(&self, block_id: &str) -> RollbackReport {
        self.revert_block_at(block_id, Utc::now())
    }

    pub fn revert_block_at(&self, block_id: &str, now: DateTime<Utc>) -> RollbackReport {
        let report = self.gateway.rollback(block_id, now);
        if !report.restored.is_empty() || !report.discarded.is_empty() {
            log::info!(
                "Reverted block {}: {} restored, {} discarded",
                block_id,
                report.restored.len(),
                report.discarded.len()
            );
        }
        report
    }

    /// Drop pending registrations whose lifetime has run out
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Vec<ExpiredTransaction> {
        self.pool.evict_expired(now)
    }

    /// Re-admit pending entries loaded from a snapshot
    ///
    /// Each entry must still pass the sender checks and carry only valid
    /// member signatures; anything else is dropped.
    pub fn restore_pending(&self, entries: Vec<PendingEntry>, now: DateTime<Utc>) -> usize {
        let mut restored = 0;
        for entry in entries {
            let tx_id = entry.transaction.id.clone();
            match self.check_restorable(&entry, now) {
                Ok(()) => match self.pool.restore(entry) {
                    Ok(()) => restored += 1,
                    Err(e) => log::warn!("Skipping pending {}: {}", tx_id, e),
                },
                Err(e) => log::warn!("Skipping pending {}: {}", tx_id, e),
            }
        }
        restored
    }

    fn check_restorable(&self, entry: &PendingEntry, now: DateTime<Utc>) -> Result<(), MultisigError> {
        let tx = &entry.transaction;
        if entry.is_expired(now) {
            return Err(MultisigError::Expired(tx.id.clone()));
        }
        self.validate_transaction(tx)?;
        let signatures_valid = entry.signatures.iter().all(|s| {
            tx.asset.has_member(&s.signer_public_key)
                && verify_hex(self.verifier.as_ref(), &s.signature, &s.signer_public_key, tx)
        });
        let mut signers: Vec<String> = entry
            .signatures
            .iter()
            .map(|s| s.signer_public_key.to_ascii_lowercase())
            .collect();
        signers.sort();
        signers.dedup();
        if !signatures_valid || signers.len() != entry.signatures.len() {
            return Err(MultisigError::SignatureVerificationFailed);
        }
        Ok(())
    }

    // ===== Queries =====

    /// Lifecycle state of a known transaction
    pub fn status(&self, tx_id: &str) -> Option<TxStatus> {
        if let Some(status) = self.pool.status(tx_id) {
            return Some(status);
        }
        if self.gateway.is_confirmed(tx_id) {
            return Some(TxStatus::Confirmed);
        }
        self.pool.was_expired(tx_id).then_some(TxStatus::Expired)
    }

    /// Registrations at quorum, oldest first
    pub fn ready_transactions(&self) -> Vec<Transaction> {
        self.pool.ready_transactions()
    }

    pub fn pending_count(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> &PendingPool {
        &self.pool
    }

    pub fn gateway(&self) -> &ConfirmationGateway {
        &self.gateway
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for TransactionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionStateMachine")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish()
    }
}
