//! Core ledger components
//!
//! This module contains the data model shared by the engine:
//! - Registration transactions and signature records
//! - Accounts and signer configurations
//! - The ledger store contract
//! - Chain events and undo data
//! - Fee schedule

pub mod account;
pub mod chain_state;
pub mod fee;
pub mod ledger;
pub mod transaction;

pub use account::{Account, SignerConfig};
pub use chain_state::{AppliedBlock, ChainEvent, UndoData, UndoEntry, MAX_UNDO_BLOCKS};
pub use fee::{FeeSchedule, MULTISIGNATURE_FEE};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
pub use transaction::{
    KeysgroupMember, MultisignatureRequest, Operator, SignatureRecord, Transaction, TxStatus,
    MULTISIGNATURE_TYPE,
};
