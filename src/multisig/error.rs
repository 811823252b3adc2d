//! Multisignature errors
//!
//! Display strings are stable: transport layers surface them verbatim
//! and client integrations assert on them.

use crate::core::LedgerError;
use thiserror::Error;

/// Errors related to multisignature registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid multisignature keysgroup. Must not be empty")]
    EmptyKeysgroup,
    #[error("Invalid multisignature keysgroup. Can not contain sender")]
    SenderInKeysgroup,
    #[error("Invalid multisignature keysgroup. Must not contain empty members")]
    EmptyMember,
    #[error("Invalid math operator in multisignature keysgroup")]
    MissingOperator,
    #[error("Invalid math operator in multisignature keysgroup")]
    InvalidOperator(char),
    #[error("Invalid public key in multisignature keysgroup: {0}")]
    InvalidMemberKey(String),
    #[error("Encountered duplicate public key in multisignature keysgroup")]
    DuplicateMember,
    // Enforced bound is min <= keysgroup size; the wording is kept for clients.
    #[error("Invalid multisignature min. Must be less than keysgroup size")]
    InvalidMinRelativeToSize,
    #[error("Invalid multisignature keysgroup. Must contain at most {max} members")]
    KeysgroupTooLarge { max: usize },
    #[error("Invalid multisignature lifetime. Must be between {min} and {max}")]
    InvalidLifetime { min: u8, max: u8 },
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(u8),
    #[error("Invalid transaction fee: expected {expected}, got {actual}")]
    InvalidFee { expected: u64, actual: u64 },
    #[error("Invalid transaction id")]
    InvalidTransactionId,
    #[error("Account already has multisignatures enabled: {0}")]
    AlreadyMultisignature(String),
    #[error("Account does not have enough funds: {address} balance: {balance} required: {required}")]
    InsufficientFunds {
        address: String,
        balance: u64,
        required: u64,
    },
    #[error("Transaction is already pending: {0}")]
    AlreadyPending(String),
    #[error("Transaction not found: {0}")]
    UnknownTransaction(String),
    #[error("Failed to verify signature")]
    SignatureVerificationFailed,
    #[error("Transaction expired: {0}")]
    Expired(String),
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: u8 },
    #[error("Transaction already confirmed: {0}")]
    AlreadyConfirmed(String),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Stable error kinds, one per reportable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyKeysgroup,
    SenderInKeysgroup,
    EmptyMember,
    InvalidOperator,
    InvalidMemberKey,
    DuplicateMember,
    InvalidMinRelativeToSize,
    KeysgroupTooLarge,
    InvalidLifetime,
    InvalidTransaction,
    AlreadyMultisignature,
    InsufficientFunds,
    AlreadyPending,
    UnknownTransaction,
    SignatureVerificationFailed,
    Expired,
    InsufficientSignatures,
    AlreadyConfirmed,
    Ledger,
}

/// Broad error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed registration; resubmit a corrected transaction
    Structural,
    /// Sender cannot pay; resubmit after funding
    Economic,
    /// Caller and pool state disagree
    PoolConflict,
    /// Signature or signer rejected
    Cryptographic,
    /// Terminal lifecycle state
    Lifecycle,
    /// Account store failure
    Ledger,
}

impl MultisigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MultisigError::EmptyKeysgroup => ErrorKind::EmptyKeysgroup,
            MultisigError::SenderInKeysgroup => ErrorKind::SenderInKeysgroup,
            MultisigError::EmptyMember => ErrorKind::EmptyMember,
            MultisigError::MissingOperator | MultisigError::InvalidOperator(_) => {
                ErrorKind::InvalidOperator
            }
            MultisigError::InvalidMemberKey(_) => ErrorKind::InvalidMemberKey,
            MultisigError::DuplicateMember => ErrorKind::DuplicateMember,
            MultisigError::InvalidMinRelativeToSize => ErrorKind::InvalidMinRelativeToSize,
            MultisigError::KeysgroupTooLarge { .. } => ErrorKind::KeysgroupTooLarge,
            MultisigError::InvalidLifetime { .. } => ErrorKind::InvalidLifetime,
            MultisigError::InvalidTransactionType(_)
            | MultisigError::InvalidFee { .. }
            | MultisigError::InvalidTransactionId => ErrorKind::InvalidTransaction,
            MultisigError::AlreadyMultisignature(_) => ErrorKind::AlreadyMultisignature,
            MultisigError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            MultisigError::AlreadyPending(_) => ErrorKind::AlreadyPending,
            MultisigError::UnknownTransaction(_) => ErrorKind::UnknownTransaction,
            MultisigError::SignatureVerificationFailed => ErrorKind::SignatureVerificationFailed,
            MultisigError::Expired(_) => ErrorKind::Expired,
            MultisigError::InsufficientSignatures { .. } => ErrorKind::InsufficientSignatures,
            MultisigError::AlreadyConfirmed(_) => ErrorKind::AlreadyConfirmed,
            MultisigError::Ledger(_) => ErrorKind::Ledger,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::EmptyKeysgroup
            | ErrorKind::SenderInKeysgroup
            | ErrorKind::EmptyMember
            | ErrorKind::InvalidOperator
            | ErrorKind::InvalidMemberKey
            | ErrorKind::DuplicateMember
            | ErrorKind::InvalidMinRelativeToSize
            | ErrorKind::KeysgroupTooLarge
            | ErrorKind::InvalidLifetime
            | ErrorKind::InvalidTransaction
            | ErrorKind::AlreadyMultisignature => ErrorCategory::Structural,
            ErrorKind::InsufficientFunds => ErrorCategory::Economic,
            ErrorKind::AlreadyPending
            | ErrorKind::UnknownTransaction
            | ErrorKind::InsufficientSignatures
            | ErrorKind::AlreadyConfirmed => ErrorCategory::PoolConflict,
            ErrorKind::SignatureVerificationFailed => ErrorCategory::Cryptographic,
            ErrorKind::Expired => ErrorCategory::Lifecycle,
            ErrorKind::Ledger => ErrorCategory::Ledger,
        }
    }

    /// True if the caller can fix the problem and retry
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Lifecycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_messages() {
        assert_eq!(
            MultisigError::EmptyKeysgroup.to_string(),
            "Invalid multisignature keysgroup. Must not be empty"
        );
        assert_eq!(
            MultisigError::SenderInKeysgroup.to_string(),
            "Invalid multisignature keysgroup. Can not contain sender"
        );
        assert_eq!(
            MultisigError::InvalidMinRelativeToSize.to_string(),
            "Invalid multisignature min. Must be less than keysgroup size"
        );
        assert_eq!(
            MultisigError::SignatureVerificationFailed.to_string(),
            "Failed to verify signature"
        );
        assert_eq!(
            MultisigError::InsufficientFunds {
                address: "1abc".to_string(),
                balance: 0,
                required: 10,
            }
            .to_string(),
            "Account does not have enough funds: 1abc balance: 0 required: 10"
        );
    }

    #[test]
    fn test_operator_errors_share_kind() {
        let missing = MultisigError::MissingOperator;
        let wrong = MultisigError::InvalidOperator('-');

        assert_eq!(missing.kind(), ErrorKind::InvalidOperator);
        assert_eq!(wrong.kind(), ErrorKind::InvalidOperator);
        assert_eq!(missing.to_string(), wrong.to_string());
        assert_ne!(missing, wrong);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            MultisigError::DuplicateMember.category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            MultisigError::AlreadyPending("x".into()).category(),
            ErrorCategory::PoolConflict
        );
        assert_eq!(
            MultisigError::SignatureVerificationFailed.category(),
            ErrorCategory::Cryptographic
        );
        assert!(!MultisigError::Expired("x".into()).is_recoverable());
        assert!(MultisigError::InsufficientFunds {
            address: String::new(),
            balance: 0,
            required: 1
        }
        .is_recoverable());
    }
}
