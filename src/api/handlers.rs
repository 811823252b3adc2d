//! Request handlers for multisignature operations
//!
//! Handlers never fail: every error is reported in the response body
//! using the stable error strings.

use crate::core::Transaction;
use crate::multisig::{PendingEntry, PoolStats, TransactionStateMachine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prefix on every signature error message
pub const SIGNATURE_ERROR_PREFIX: &str = "Error processing signature: ";

/// Shared state for handlers
#[derive(Clone, Debug)]
pub struct MultisigApi {
    pub machine: Arc<TransactionStateMachine>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTransactionResponse {
    pub success: bool,
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSignatureResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Pending registration info
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTxInfo {
    pub id: String,
    pub sender_address: String,
    pub min: u8,
    pub lifetime: u8,
    pub keysgroup: Vec<String>,
    pub signatures_collected: usize,
    pub signed_by: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub expires_at: String,
}

impl From<&PendingEntry> for PendingTxInfo {
    fn from(entry: &PendingEntry) -> Self {
        let tx = &entry.transaction;
        Self {
            id: tx.id.clone(),
            sender_address: tx.sender_address(),
            min: tx.asset.min,
            lifetime: tx.asset.lifetime,
            keysgroup: tx.asset.keysgroup.iter().map(|m| m.to_string()).collect(),
            signatures_collected: entry.signature_count(),
            signed_by: entry.signed_by().iter().map(|s| s.to_string()).collect(),
            status: tx.status.to_string(),
            created_at: entry.created_at.to_rfc3339(),
            expires_at: entry.expires_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResponse {
    pub pending_transactions: usize,
    pub ready_transactions: usize,
    pub signatures: usize,
    pub transactions: Vec<PendingTxInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub error: String,
}

// ============================================================================
// Request Types
// ============================================================================

/// Co-signer signature submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    pub transaction_id: String,
    pub public_key: String,
    pub signature: String,
}

// ============================================================================
// Handlers
// ============================================================================

impl MultisigApi {
    pub fn new(machine: Arc<TransactionStateMachine>) -> Self {
        Self { machine }
    }

    /// Submit a registration transaction
    pub fn submit_transaction(&self, tx: Transaction) -> SubmitTransactionResponse {
        let tx_id = tx.id.clone();
        match self.machine.submit_transaction(tx) {
            Ok(transaction_id) => SubmitTransactionResponse {
                success: true,
                transaction_id,
                message: None,
            },
            Err(e) => SubmitTransactionResponse {
                success: false,
                transaction_id: tx_id,
                message: Some(e.to_string()),
            },
        }
    }

    /// Submit a registration given as a JSON body
    pub fn submit_transaction_json(&self, body: &str) -> SubmitTransactionResponse {
        match serde_json::from_str::<Transaction>(body) {
            Ok(tx) => self.submit_transaction(tx),
            Err(e) => SubmitTransactionResponse {
                success: false,
                transaction_id: String::new(),
                message: Some(format!("Invalid transaction: {}", e)),
            },
        }
    }

    /// Submit a co-signer signature
    pub fn submit_signature(&self, req: SignatureRequest) -> SubmitSignatureResponse {
        match self
            .machine
            .submit_signature(&req.transaction_id, &req.public_key, &req.signature)
        {
            Ok(_) => SubmitSignatureResponse {
                success: true,
                message: None,
            },
            Err(e) => SubmitSignatureResponse {
                success: false,
                message: Some(format!("{}{}", SIGNATURE_ERROR_PREFIX, e)),
            },
        }
    }

    /// Submit a signature given as a JSON body
    pub fn submit_signature_json(&self, body: &str) -> SubmitSignatureResponse {
        match serde_json::from_str::<SignatureRequest>(body) {
            Ok(req) => self.submit_signature(req),
            Err(e) => SubmitSignatureResponse {
                success: false,
                message: Some(format!("{}{}", SIGNATURE_ERROR_PREFIX, e)),
            },
        }
    }

    /// Details of one pending registration
    pub fn get_pending(&self, tx_id: &str) -> Result<PendingTxInfo, ApiError> {
        self.machine
            .pool()
            .get(tx_id)
            .map(|entry| PendingTxInfo::from(&entry))
            .ok_or_else(|| ApiError {
                error: format!("Transaction not found: {}", tx_id),
            })
    }

    /// All pending registrations with pool totals
    pub fn list_pending(&self) -> PoolResponse {
        let transactions: Vec<PendingTxInfo> = self
            .machine
            .pool()
            .snapshot()
            .iter()
            .map(PendingTxInfo::from)
            .collect();
        let PoolStats {
            entries,
            ready,
            signatures,
        } = self.machine.pool().stats();

        PoolResponse {
            pending_transactions: entries,
            ready_transactions: ready,
            signatures,
            transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InMemoryLedger, KeysgroupMember, MultisignatureRequest};
    use crate::crypto::KeyPair;
    use crate::multisig::EngineConfig;
    use chrono::Utc;

    fn api() -> (Arc<InMemoryLedger>, MultisigApi) {
        let ledger = Arc::new(InMemoryLedger::new());
        let machine = TransactionStateMachine::new(EngineConfig::default(), ledger.clone());
        (ledger, MultisigApi::new(Arc::new(machine)))
    }

    fn registration(sender: &KeyPair, members: &[&KeyPair], min: u8) -> Transaction {
        Transaction::new_multisignature(
            sender,
            MultisignatureRequest::new(
                min,
                24,
                members
                    .iter()
                    .map(|k| KeysgroupMember::add(k.public_key_hex()))
                    .collect(),
            ),
            500_000_000 * (members.len() as u64 + 1),
            Utc::now().timestamp(),
        )
        .unwrap()
    }

    #[test]
    fn test_submit_transaction_response() {
        let (ledger, api) = api();
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        ledger.credit(&sender.address(), 10_000_000_000);

        let tx = registration(&sender, &[&a], 1);
        let response = api.submit_transaction(tx.clone());
        assert!(response.success);
        assert_eq!(response.transaction_id, tx.id);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["transactionId"], tx.id);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_submit_transaction_error_message() {
        let (_ledger, api) = api();
        let sender = KeyPair::generate();
        let a = KeyPair::generate();

        let response = api.submit_transaction(registration(&sender, &[&a], 1));
        assert!(!response.success);
        assert!(response
            .message
            .unwrap()
            .starts_with("Account does not have enough funds: "));
    }

    #[test]
    fn test_submit_transaction_json() {
        let (ledger, api) = api();
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        ledger.credit(&sender.address(), 10_000_000_000);

        let tx = registration(&sender, &[&a], 1);
        let body = serde_json::to_string(&tx).unwrap();
        assert!(api.submit_transaction_json(&body).success);

        let bad = api.submit_transaction_json("{\"id\": 5}");
        assert!(!bad.success);
        assert!(bad.message.unwrap().starts_with("Invalid transaction: "));
    }

    #[test]
    fn test_null_keysgroup_member_reports_empty_member() {
        let (ledger, api) = api();
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        ledger.credit(&sender.address(), 10_000_000_000);

        let tx = registration(&sender, &[&a], 1);
        let mut body = serde_json::to_value(&tx).unwrap();
        body["asset"]["keysgroup"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::Value::Null);

        let response = api.submit_transaction_json(&body.to_string());
        assert!(!response.success);
        assert_eq!(
            response.message.unwrap(),
            "Invalid multisignature keysgroup. Must not contain empty members"
        );
        assert_eq!(api.list_pending().pending_transactions, 0);
    }

    #[test]
    fn test_signature_flow_and_prefix() {
        let (ledger, api) = api();
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        ledger.credit(&sender.address(), 10_000_000_000);

        let tx = registration(&sender, &[&a, &b], 2);
        api.submit_transaction(tx.clone());

        let req = SignatureRequest {
            transaction_id: tx.id.clone(),
            public_key: a.public_key_hex(),
            signature: tx.co_sign(&a).unwrap(),
        };
        assert_eq!(
            api.submit_signature(req.clone()),
            SubmitSignatureResponse {
                success: true,
                message: None
            }
        );

        let repeat = api.submit_signature(req);
        assert!(!repeat.success);
        assert_eq!(
            repeat.message.unwrap(),
            "Error processing signature: Failed to verify signature"
        );

        let info = api.get_pending(&tx.id).unwrap();
        assert_eq!(info.signatures_collected, 1);
        assert_eq!(info.status, "pending");
        assert_eq!(api.list_pending().pending_transactions, 1);
    }

    #[test]
    fn test_signature_json_body() {
        let (_ledger, api) = api();
        let body = r#"{"transactionId":"missing","publicKey":"aa","signature":"bb"}"#;
        let response = api.submit_signature_json(body);
        assert_eq!(
            response.message.unwrap(),
            "Error processing signature: Transaction not found: missing"
        );
        assert!(api.get_pending("missing").is_err());
    }
}
