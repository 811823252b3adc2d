//! Pending registration pool
//!
//! Holds registrations that are waiting for co-signer signatures.
//! Entries for different transactions are independent; each entry sits
//! behind its own mutex so that quorum checks and signature inserts for
//! one transaction are serialized.
//!
//! Lock order is always map, then entry. Code holding an entry lock
//! never takes the map lock.

use crate::core::{SignatureRecord, Transaction, TxStatus};
use crate::multisig::error::MultisigError;
use crate::multisig::verifier::{verify_hex, SignatureVerifier};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Expired transaction IDs remembered after they leave the pool
pub const MAX_EXPIRED_RECORDS: usize = 10_000;

// =============================================================================
// Pool Entry
// =============================================================================

/// A registration awaiting quorum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub transaction: Transaction,
    /// Accepted co-signer signatures in arrival order
    pub signatures: Vec<SignatureRecord>,
    /// When the entry was admitted
    pub created_at: DateTime<Utc>,
}

impl PendingEntry {
    pub fn new(transaction: Transaction, created_at: DateTime<Utc>) -> Self {
        Self {
            transaction,
            signatures: Vec::new(),
            created_at,
        }
    }

    /// Number of accepted signatures
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Quorum required by the registration
    pub fn required(&self) -> u8 {
        self.transaction.asset.min
    }

    /// Check if enough co-signers have signed
    pub fn is_ready(&self) -> bool {
        self.signatures.len() >= self.required() as usize
    }

    /// Check if `public_key` has already signed
    pub fn has_signed(&self, public_key: &str) -> bool {
        self.signatures
            .iter()
            .any(|s| s.signer_public_key.eq_ignore_ascii_case(public_key))
    }

    /// Public keys of the co-signers that have signed
    pub fn signed_by(&self) -> Vec<&str> {
        self.signatures
            .iter()
            .map(|s| s.signer_public_key.as_str())
            .collect()
    }

    /// Moment the lifetime runs out
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(i64::from(self.transaction.asset.lifetime))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    fn refresh_status(&mut self) {
        self.transaction.status = if self.is_ready() {
            TxStatus::Ready
        } else {
            TxStatus::Pending
        };
    }
}

/// Result of an accepted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub transaction_id: String,
    /// Signatures accepted so far
    pub accepted: usize,
    /// Quorum
    pub required: u8,
    /// True only for the signature that reached quorum
    pub became_ready: bool,
}

impl SignatureOutcome {
    pub fn is_ready(&self) -> bool {
        self.accepted >= self.required as usize
    }
}

/// A registration removed because its lifetime ran out
#[derive(Debug, Clone)]
pub struct ExpiredTransaction {
    pub transaction: Transaction,
    pub signatures: usize,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub entries: usize,
    pub ready: usize,
    pub signatures: usize,
}

struct Slot {
    entry: PendingEntry,
    /// Set once the entry left the pool; late callers holding the
    /// `Arc` must treat it as unknown
    removed: bool,
}

type SlotRef = Arc<Mutex<Slot>>;

#[derive(Default)]
struct ExpiredIndex {
    ids: HashSet<String>,
    /// Insertion order, for pruning
    order: VecDeque<String>,
}

impl ExpiredIndex {
    fn insert(&mut self, tx_id: &str) {
        if !self.ids.insert(tx_id.to_string()) {
            return;
        }
        self.order.push_back(tx_id.to_string());
        while self.order.len() > MAX_EXPIRED_RECORDS {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }
}

fn lock(slot: &SlotRef) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Pending Pool
// =============================================================================

/// Registry of registrations awaiting quorum, keyed by transaction ID
pub struct PendingPool {
    entries: RwLock<HashMap<String, SlotRef>>,
    /// Leaf lock; never held while taking the map or an entry
    expired: Mutex<ExpiredIndex>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl PendingPool {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            expired: Mutex::new(ExpiredIndex::default()),
            verifier,
        }
    }

    fn slot(&self, tx_id: &str) -> Option<SlotRef> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tx_id)
            .cloned()
    }

    fn all_slots(&self) -> Vec<SlotRef> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Drop `tx_id` from the map if it still points at `slot`
    fn detach(&self, tx_id: &str, slot: &SlotRef) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(tx_id).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            entries.remove(tx_id);
        }
    }

    fn mark_expired(&self, tx_id: &str) {
        self.expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tx_id);
    }

    /// Check if `tx_id` left the pool because its lifetime ran out
    pub fn was_expired(&self, tx_id: &str) -> bool {
        self.expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .contains(tx_id)
    }

    /// Admit a validated transaction with an empty signer set
    pub fn admit(&self, transaction: Transaction) -> Result<(), MultisigError> {
        self.admit_at(transaction, Utc::now())
    }

    /// Admit with an explicit creation time
    pub fn admit_at(
        &self,
        transaction: Transaction,
        created_at: DateTime<Utc>,
    ) -> Result<(), MultisigError> {
        self.insert(PendingEntry::new(transaction, created_at))
    }

    /// Re-insert an entry together with its accepted signatures
    pub fn restore(&self, entry: PendingEntry) -> Result<(), MultisigError> {
        self.insert(entry)
    }

    fn insert(&self, mut entry: PendingEntry) -> Result<(), MultisigError> {
        let tx_id = entry.transaction.id.clone();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&tx_id) {
            return Err(MultisigError::AlreadyPending(tx_id));
        }
        entry.refresh_status();
        entries.insert(
            tx_id,
            Arc::new(Mutex::new(Slot {
                entry,
                removed: false,
            })),
        );
        Ok(())
    }

    /// Record a co-signer signature
    ///
    /// Unknown signers, repeat signers and bad signatures all fail with
    /// [`MultisigError::SignatureVerificationFailed`].
    pub fn record_signature(
        &self,
        tx_id: &str,
        signer_public_key: &str,
        signature: &str,
    ) -> Result<SignatureOutcome, MultisigError> {
        let slot = self
            .slot(tx_id)
            .ok_or_else(|| MultisigError::UnknownTransaction(tx_id.to_string()))?;
        let mut guard = lock(&slot);
        if guard.removed {
            return Err(MultisigError::UnknownTransaction(tx_id.to_string()));
        }
        let entry = &mut guard.entry;

        if !entry.transaction.asset.has_member(signer_public_key) {
            log::debug!("Signer {} is not in the keysgroup of {}", signer_public_key, tx_id);
            return Err(MultisigError::SignatureVerificationFailed);
        }
        if entry.has_signed(signer_public_key) {
            log::debug!("Signer {} already signed {}", signer_public_key, tx_id);
            return Err(MultisigError::SignatureVerificationFailed);
        }
        if !verify_hex(
            self.verifier.as_ref(),
            signature,
            signer_public_key,
            &entry.transaction,
        ) {
            log::debug!("Invalid signature from {} on {}", signer_public_key, tx_id);
            return Err(MultisigError::SignatureVerificationFailed);
        }

        let was_ready = entry.is_ready();
        entry.signatures.push(SignatureRecord::new(
            tx_id,
            signer_public_key,
            signature,
        ));
        entry.refresh_status();

        Ok(SignatureOutcome {
            transaction_id: tx_id.to_string(),
            accepted: entry.signature_count(),
            required: entry.required(),
            became_ready: !was_ready && entry.is_ready(),
        })
    }

    /// True iff accepted signatures reach the quorum
    pub fn is_ready(&self, tx_id: &str) -> bool {
        self.slot(tx_id)
            .map(|slot| {
                let guard = lock(&slot);
                !guard.removed && guard.entry.is_ready()
            })
            .unwrap_or(false)
    }

    /// Evict an entry
    pub fn remove(&self, tx_id: &str) -> Option<PendingEntry> {
        let slot = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.remove(tx_id)?
        };
        let mut guard = lock(&slot);
        if guard.removed {
            return None;
        }
        guard.removed = true;
        Some(guard.entry.clone())
    }

    /// Evict an entry whose lifetime ran out and remember it as expired
    pub fn expire(&self, tx_id: &str) -> Option<PendingEntry> {
        let entry = self.remove(tx_id)?;
        log::warn!(
            "Pending multisignature {} expired with {}/{} signatures",
            tx_id,
            entry.signature_count(),
            entry.required()
        );
        self.mark_expired(tx_id);
        Some(entry)
    }

    /// Promote a ready entry out of the pool
    ///
    /// Under the entry lock: rejects an entry whose lifetime ran out at
    /// `now` and evicts it, re-checks the quorum, runs `commit`, and on
    /// success marks the entry removed. A failed commit leaves the entry
    /// pending.
    pub fn promote<T, F>(
        &self,
        tx_id: &str,
        now: DateTime<Utc>,
        commit: F,
    ) -> Result<(T, PendingEntry), MultisigError>
    where
        F: FnOnce(&PendingEntry) -> Result<T, MultisigError>,
    {
        let slot = self
            .slot(tx_id)
            .ok_or_else(|| MultisigError::UnknownTransaction(tx_id.to_string()))?;
        let promoted = {
            let mut guard = lock(&slot);
            if guard.removed {
                return Err(MultisigError::UnknownTransaction(tx_id.to_string()));
            }
            if guard.entry.is_expired(now) {
                guard.removed = true;
                log::warn!(
                    "Pending multisignature {} expired before confirmation with {}/{} signatures",
                    tx_id,
                    guard.entry.signature_count(),
                    guard.entry.required()
                );
                Err(MultisigError::Expired(tx_id.to_string()))
            } else if !guard.entry.is_ready() {
                return Err(MultisigError::InsufficientSignatures {
                    have: guard.entry.signature_count(),
                    need: guard.entry.required(),
                });
            } else {
                let value = commit(&guard.entry)?;
                guard.removed = true;
                guard.entry.transaction.status = TxStatus::Confirmed;
                Ok((value, guard.entry.clone()))
            }
        };
        self.detach(tx_id, &slot);
        if promoted.is_err() {
            self.mark_expired(tx_id);
        }
        promoted
    }

    /// Remove every entry whose lifetime has run out at `now`
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Vec<ExpiredTransaction> {
        let mut expired = Vec::new();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        entries.retain(|tx_id, slot| {
            let mut guard = lock(slot);
            if guard.removed || !guard.entry.is_expired(now) {
                return !guard.removed;
            }
            guard.removed = true;
            let mut transaction = guard.entry.transaction.clone();
            transaction.status = TxStatus::Expired;
            log::warn!(
                "Pending multisignature {} expired with {}/{} signatures",
                tx_id,
                guard.entry.signature_count(),
                guard.entry.required()
            );
            expired.push(ExpiredTransaction {
                transaction,
                signatures: guard.entry.signature_count(),
                created_at: guard.entry.created_at,
                expired_at: guard.entry.expires_at(),
            });
            false
        });
        drop(entries);

        for e in &expired {
            self.mark_expired(&e.transaction.id);
        }
        expired
    }

    /// Copy of a pending entry
    pub fn get(&self, tx_id: &str) -> Option<PendingEntry> {
        let slot = self.slot(tx_id)?;
        let guard = lock(&slot);
        (!guard.removed).then(|| guard.entry.clone())
    }

    /// Check if an entry's lifetime has run out
    pub fn is_expired(&self, tx_id: &str, now: DateTime<Utc>) -> bool {
        self.get(tx_id).is_some_and(|entry| entry.is_expired(now))
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.get(tx_id).is_some()
    }

    /// Current status of a pending transaction
    pub fn status(&self, tx_id: &str) -> Option<TxStatus> {
        self.get(tx_id).map(|entry| entry.transaction.status)
    }

    /// Accepted signatures of a pending transaction
    pub fn signatures(&self, tx_id: &str) -> Option<Vec<SignatureRecord>> {
        self.get(tx_id).map(|entry| entry.signatures)
    }

    /// Copies of all live entries, oldest first
    pub fn snapshot(&self) -> Vec<PendingEntry> {
        let mut list: Vec<PendingEntry> = self
            .all_slots()
            .iter()
            .filter_map(|slot| {
                let guard = lock(slot);
                (!guard.removed).then(|| guard.entry.clone())
            })
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }

    /// Transactions that have reached quorum, for block producers
    pub fn ready_transactions(&self) -> Vec<Transaction> {
        self.snapshot()
            .into_iter()
            .filter(PendingEntry::is_ready)
            .map(|entry| entry.transaction)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> PoolStats {
        let entries = self.snapshot();
        PoolStats {
            entries: entries.len(),
            ready: entries.iter().filter(|e| e.is_ready()).count(),
            signatures: entries.iter().map(PendingEntry::signature_count).sum(),
        }
    }
}

impl std::fmt::Debug for PendingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingPool")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KeysgroupMember, MultisignatureRequest};
    use crate::crypto::KeyPair;
    use crate::multisig::verifier::SchnorrVerifier;

    fn pool() -> PendingPool {
        PendingPool::new(Arc::new(SchnorrVerifier))
    }

    fn registration(min: u8, members: &[&KeyPair]) -> Transaction {
        let sender = KeyPair::generate();
        Transaction::new_multisignature(
            &sender,
            MultisignatureRequest::new(
                min,
                24,
                members
                    .iter()
                    .map(|k| KeysgroupMember::add(k.public_key_hex()))
                    .collect(),
            ),
            1000,
            Utc::now().timestamp(),
        )
        .unwrap()
    }

    fn sign(pool: &PendingPool, tx: &Transaction, signer: &KeyPair) -> Result<SignatureOutcome, MultisigError> {
        pool.record_signature(&tx.id, &signer.public_key_hex(), &tx.co_sign(signer).unwrap())
    }

    #[test]
    fn test_admit_and_duplicate() {
        let a = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);

        pool.admit(tx.clone()).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.status(&tx.id), Some(TxStatus::Pending));
        assert_eq!(
            pool.admit(tx.clone()),
            Err(MultisigError::AlreadyPending(tx.id.clone()))
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_unknown_transaction() {
        let a = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);
        assert_eq!(
            sign(&pool, &tx, &a),
            Err(MultisigError::UnknownTransaction(tx.id.clone()))
        );
    }

    #[test]
    fn test_quorum_progression() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let pool = pool();
        let tx = registration(2, &[&a, &b]);
        pool.admit(tx.clone()).unwrap();

        let first = sign(&pool, &tx, &a).unwrap();
        assert_eq!(first.accepted, 1);
        assert!(!first.became_ready);
        assert!(!pool.is_ready(&tx.id));
        assert_eq!(pool.status(&tx.id), Some(TxStatus::Pending));

        let second = sign(&pool, &tx, &b).unwrap();
        assert_eq!(second.accepted, 2);
        assert!(second.became_ready);
        assert!(pool.is_ready(&tx.id));
        assert_eq!(pool.status(&tx.id), Some(TxStatus::Ready));
        assert_eq!(pool.ready_transactions().len(), 1);
    }

    #[test]
    fn test_duplicate_signer_rejected() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let pool = pool();
        let tx = registration(2, &[&a, &b]);
        pool.admit(tx.clone()).unwrap();

        sign(&pool, &tx, &a).unwrap();
        assert_eq!(
            sign(&pool, &tx, &a),
            Err(MultisigError::SignatureVerificationFailed)
        );
        assert_eq!(pool.get(&tx.id).unwrap().signature_count(), 1);
    }

    #[test]
    fn test_unauthorized_signer_never_changes_count() {
        let a = KeyPair::generate();
        let outsider = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);
        pool.admit(tx.clone()).unwrap();

        for _ in 0..3 {
            assert_eq!(
                sign(&pool, &tx, &outsider),
                Err(MultisigError::SignatureVerificationFailed)
            );
        }
        assert_eq!(pool.get(&tx.id).unwrap().signature_count(), 0);
    }

    #[test]
    fn test_forged_signature_rejected() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a, &b]);
        pool.admit(tx.clone()).unwrap();

        // b's signature presented under a's key
        let forged = tx.co_sign(&b).unwrap();
        assert_eq!(
            pool.record_signature(&tx.id, &a.public_key_hex(), &forged),
            Err(MultisigError::SignatureVerificationFailed)
        );
        assert_eq!(
            pool.record_signature(&tx.id, &a.public_key_hex(), "not-hex"),
            Err(MultisigError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_remove() {
        let a = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);
        pool.admit(tx.clone()).unwrap();

        assert!(pool.remove(&tx.id).is_some());
        assert!(pool.remove(&tx.id).is_none());
        assert!(pool.is_empty());
        assert_eq!(
            sign(&pool, &tx, &a),
            Err(MultisigError::UnknownTransaction(tx.id.clone()))
        );
    }

    #[test]
    fn test_promote_requires_quorum() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let pool = pool();
        let tx = registration(2, &[&a, &b]);
        pool.admit(tx.clone()).unwrap();
        sign(&pool, &tx, &a).unwrap();

        let result = pool.promote(&tx.id, Utc::now(), |_| Ok(()));
        assert_eq!(
            result.unwrap_err(),
            MultisigError::InsufficientSignatures { have: 1, need: 2 }
        );
        assert!(pool.contains(&tx.id));

        sign(&pool, &tx, &b).unwrap();
        let ((), entry) = pool.promote(&tx.id, Utc::now(), |_| Ok(())).unwrap();
        assert_eq!(entry.transaction.status, TxStatus::Confirmed);
        assert!(!pool.contains(&tx.id));
        assert!(matches!(
            pool.promote(&tx.id, Utc::now(), |_| Ok(())),
            Err(MultisigError::UnknownTransaction(_))
        ));
    }

    #[test]
    fn test_failed_commit_keeps_entry() {
        let a = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);
        pool.admit(tx.clone()).unwrap();
        sign(&pool, &tx, &a).unwrap();

        let result: Result<((), PendingEntry), _> =
            pool.promote(&tx.id, Utc::now(), |_| Err(MultisigError::AlreadyMultisignature("x".into())));
        assert!(result.is_err());
        assert!(pool.is_ready(&tx.id));
    }

    #[test]
    fn test_evict_expired() {
        let a = KeyPair::generate();
        let pool = pool();
        let old = registration(1, &[&a]);
        let fresh = registration(1, &[&a]);
        let now = Utc::now();

        pool.admit_at(old.clone(), now - Duration::hours(25)).unwrap();
        pool.admit_at(fresh.clone(), now).unwrap();

        let expired = pool.evict_expired(now);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].transaction.id, old.id);
        assert_eq!(expired[0].transaction.status, TxStatus::Expired);
        assert!(!pool.contains(&old.id));
        assert!(pool.contains(&fresh.id));

        assert!(pool.evict_expired(now).is_empty());
        assert!(pool.was_expired(&old.id));
        assert!(!pool.was_expired(&fresh.id));
    }

    #[test]
    fn test_promote_rejects_expired_entry() {
        let a = KeyPair::generate();
        let pool = pool();
        let tx = registration(1, &[&a]);
        let now = Utc::now();
        pool.admit_at(tx.clone(), now - Duration::hours(25)).unwrap();
        sign(&pool, &tx, &a).unwrap();

        let mut committed = false;
        let result = pool.promote(&tx.id, now, |_| {
            committed = true;
            Ok(())
        });
        assert_eq!(result.unwrap_err(), MultisigError::Expired(tx.id.clone()));
        assert!(!committed);
        assert!(!pool.contains(&tx.id));
        assert!(pool.was_expired(&tx.id));
    }

    #[test]
    fn test_expired_index_is_bounded() {
        let mut index = ExpiredIndex::default();
        for i in 0..=MAX_EXPIRED_RECORDS {
            index.insert(&format!("tx-{}", i));
        }
        index.insert("tx-1");
        assert_eq!(index.ids.len(), MAX_EXPIRED_RECORDS);
        assert!(!index.ids.contains("tx-0"));
        assert!(index.ids.contains(&format!("tx-{}", MAX_EXPIRED_RECORDS)));
    }

    #[test]
    fn test_restore_keeps_signatures() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let pool = pool();
        let tx = registration(2, &[&a, &b]);
        pool.admit(tx.clone()).unwrap();
        sign(&pool, &tx, &a).unwrap();

        let entry = pool.remove(&tx.id).unwrap();
        pool.restore(entry).unwrap();
        assert_eq!(pool.get(&tx.id).unwrap().signed_by(), vec![a.public_key_hex().as_str()]);

        let outcome = sign(&pool, &tx, &b).unwrap();
        assert!(outcome.became_ready);
    }

    #[test]
    fn test_stats() {
        let a = KeyPair::generate();
        let pool = pool();
        let t1 = registration(1, &[&a]);
        let t2 = registration(1, &[&a]);
        pool.admit(t1.clone()).unwrap();
        pool.admit(t2).unwrap();
        sign(&pool, &t1, &a).unwrap();

        assert_eq!(
            pool.stats(),
            PoolStats {
                entries: 2,
                ready: 1,
                signatures: 1
            }
        );
    }

    #[test]
    fn test_concurrent_signatures_reach_ready_once() {
        for _ in 0..20 {
            let a = KeyPair::generate();
            let b = KeyPair::generate();
            let pool = Arc::new(pool());
            let tx = registration(2, &[&a, &b]);
            pool.admit(tx.clone()).unwrap();

            let handles: Vec<_> = [a, b]
                .into_iter()
                .map(|signer| {
                    let pool = pool.clone();
                    let tx = tx.clone();
                    std::thread::spawn(move || sign(&pool, &tx, &signer).unwrap())
                })
                .collect();

            let outcomes: Vec<SignatureOutcome> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(outcomes.iter().filter(|o| o.became_ready).count(), 1);
            assert_eq!(pool.get(&tx.id).unwrap().signature_count(), 2);
        }
    }
}
