//! Multisig-Ledger: multisignature account registration for a ledger node
//!
//! This crate converts single-key accounts into M-of-N accounts:
//! - Ordered keysgroup validation with stable error messages
//! - BIP-340 Schnorr signatures (secp256k1) for senders and co-signers
//! - A concurrent pending pool collecting co-signer signatures
//! - Block-driven confirmation with rollback on reverted blocks
//! - Periodic expiry of registrations that never reach quorum
//! - JSON snapshots of accounts and pending registrations
//!
//! # Example
//!
//! ```rust
//! use multisig_ledger::core::{InMemoryLedger, KeysgroupMember, MultisignatureRequest, Transaction};
//! use multisig_ledger::crypto::KeyPair;
//! use multisig_ledger::multisig::{EngineConfig, TransactionStateMachine};
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(InMemoryLedger::new());
//! let machine = TransactionStateMachine::new(EngineConfig::default(), ledger.clone());
//!
//! let sender = KeyPair::generate();
//! let cosigner = KeyPair::generate();
//! ledger.credit(&sender.address(), 1_000_000_000);
//!
//! let request = MultisignatureRequest::new(1, 24, vec![KeysgroupMember::add(cosigner.public_key_hex())]);
//! let tx = Transaction::new_multisignature(&sender, request, 1_000_000_000, 0).unwrap();
//! let tx_id = machine.submit_transaction(tx.clone()).unwrap();
//!
//! let signature = tx.co_sign(&cosigner).unwrap();
//! let outcome = machine.submit_signature(&tx_id, &cosigner.public_key_hex(), &signature).unwrap();
//! assert!(outcome.became_ready);
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use api::MultisigApi;
pub use core::{
    Account, AppliedBlock, ChainEvent, InMemoryLedger, Ledger, MultisignatureRequest,
    SignerConfig, Transaction, TxStatus,
};
pub use crypto::KeyPair;
pub use multisig::{
    ConfirmationGateway, EngineConfig, MultisigError, MultisigService, PendingPool,
    TransactionStateMachine,
};
pub use storage::{NodeSnapshot, SnapshotStorage};
