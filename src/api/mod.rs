//! Transport-facing API
//!
//! Request and response types for a transport layer (HTTP, RPC) to
//! expose. JSON field names are camelCase.
//!
//! # Operations
//!
//! - `submit_transaction` - Submit a registration
//!   (`{success, transactionId, message?}`)
//! - `submit_signature` - Submit a co-signer signature
//!   (`{success, message?}`, errors prefixed "Error processing signature: ")
//! - `get_pending` / `list_pending` - Inspect the pending pool

pub mod handlers;

pub use handlers::{
    ApiError, MultisigApi, PendingTxInfo, PoolResponse, SignatureRequest,
    SubmitSignatureResponse, SubmitTransactionResponse, SIGNATURE_ERROR_PREFIX,
};
