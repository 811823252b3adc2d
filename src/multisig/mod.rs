//! Multisignature account registration
//!
//! Converts a single-key account into an M-of-N account. A registration
//! names a keysgroup and a quorum `min`; it waits in the pending pool until
//! `min` keysgroup members have signed it, and only a block carrying it
//! commits the new signer set to the ledger.
//!
//! # Example
//!
//! ```ignore
//! use multisig_ledger::multisig::TransactionStateMachine;
//!
//! let machine = TransactionStateMachine::new(EngineConfig::default(), ledger);
//!
//! // Sender submits a 2-of-2 registration
//! let tx_id = machine.submit_transaction(tx)?;
//!
//! // Co-signers sign the same transaction
//! machine.submit_signature(&tx_id, &key_a, &sig_a)?;
//! machine.submit_signature(&tx_id, &key_b, &sig_b)?;
//!
//! // Block processing confirms it
//! machine.handle_event(ChainEvent::BlockApplied(block));
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod keysgroup;
pub mod pool;
pub mod service;
pub mod state_machine;
pub mod verifier;

pub use config::{ConfigError, EngineConfig};
pub use error::{ErrorCategory, ErrorKind, MultisigError};
pub use gateway::{BlockReport, ConfirmationGateway, RollbackReport};
pub use keysgroup::KeysgroupValidator;
pub use pool::{
    ExpiredTransaction, PendingEntry, PendingPool, PoolStats, SignatureOutcome, MAX_EXPIRED_RECORDS,
};
pub use service::{
    run_chain_listener, spawn_expiry_sweeper, MultisigService, EVENT_CHANNEL_CAPACITY,
    LISTENER_DRAIN_TIMEOUT,
};
pub use state_machine::{EventOutcome, ReadyNotice, TransactionStateMachine};
pub use verifier::{SchnorrVerifier, SignatureVerifier};
