//! Multisignature registration transactions
//!
//! A registration turns the sender's single-key account into an account
//! controlled by a keysgroup of co-signers. The sender signs the
//! transaction's signing digest; every co-signer later signs the same
//! digest and submits the signature separately.

use crate::crypto::{public_key_to_address, sha256, sha256_hex, KeyError, KeyPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Wire tag of the multisignature registration transaction type
pub const MULTISIGNATURE_TYPE: u8 = 4;

// =============================================================================
// Keysgroup
// =============================================================================

/// Keysgroup operator prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `+`: add the key as a co-signer
    Add,
    /// Any other prefix character
    Other(char),
}

impl Operator {
    pub fn as_char(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Other(c) => *c,
        }
    }
}

/// A keysgroup entry, wire form `"+<hex public key>"`
///
/// Parsing never fails: malformed entries are kept as-is so the
/// keysgroup validator can report them in its fixed order. A JSON
/// `null` member decodes as an empty member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub struct KeysgroupMember {
    pub operator: Option<Operator>,
    /// Hex-encoded public key
    pub public_key: String,
}

impl KeysgroupMember {
    /// Member that adds `public_key` as a co-signer
    pub fn add(public_key: impl Into<String>) -> Self {
        Self {
            operator: Some(Operator::Add),
            public_key: public_key.into(),
        }
    }

    /// Parse the wire form
    pub fn parse(raw: &str) -> Self {
        let mut chars = raw.chars();
        match chars.next() {
            None => Self {
                operator: None,
                public_key: String::new(),
            },
            Some(c) if c.is_ascii_hexdigit() => Self {
                operator: None,
                public_key: raw.to_string(),
            },
            Some('+') => Self {
                operator: Some(Operator::Add),
                public_key: chars.as_str().to_string(),
            },
            Some(c) => Self {
                operator: Some(Operator::Other(c)),
                public_key: chars.as_str().to_string(),
            },
        }
    }

    /// True for a member with neither operator nor key
    pub fn is_empty(&self) -> bool {
        self.operator.is_none() && self.public_key.is_empty()
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        match self.operator {
            Some(op) => out.extend_from_slice(op.as_char().encode_utf8(&mut buf).as_bytes()),
            None => out.push(0),
        }
        match hex::decode(&self.public_key) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(_) => out.extend_from_slice(self.public_key.as_bytes()),
        }
    }
}

impl From<Option<String>> for KeysgroupMember {
    fn from(raw: Option<String>) -> Self {
        Self::parse(raw.as_deref().unwrap_or_default())
    }
}

impl From<KeysgroupMember> for String {
    fn from(member: KeysgroupMember) -> Self {
        member.to_string()
    }
}

impl fmt::Display for KeysgroupMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.operator {
            write!(f, "{}", op.as_char())?;
        }
        f.write_str(&self.public_key)
    }
}

/// Asset of a registration: the proposed keysgroup and quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisignatureRequest {
    /// Signatures required to confirm (quorum)
    pub min: u8,
    /// Hours the registration may stay pending
    pub lifetime: u8,
    /// Proposed co-signers, in signer order
    pub keysgroup: Vec<KeysgroupMember>,
}

impl MultisignatureRequest {
    pub fn new(min: u8, lifetime: u8, keysgroup: Vec<KeysgroupMember>) -> Self {
        Self {
            min,
            lifetime,
            keysgroup,
        }
    }

    /// Build a request from wire-form keysgroup strings
    pub fn from_raw<S: AsRef<str>>(min: u8, lifetime: u8, keysgroup: &[S]) -> Self {
        Self::new(
            min,
            lifetime,
            keysgroup
                .iter()
                .map(|raw| KeysgroupMember::parse(raw.as_ref()))
                .collect(),
        )
    }

    /// Member public keys in keysgroup order
    pub fn member_keys(&self) -> Vec<String> {
        self.keysgroup.iter().map(|m| m.public_key.clone()).collect()
    }

    /// Check if `public_key` is a proposed co-signer
    pub fn has_member(&self, public_key: &str) -> bool {
        self.keysgroup
            .iter()
            .any(|m| m.public_key.eq_ignore_ascii_case(public_key))
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Lifecycle status of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TxStatus {
    #[default]
    Received,
    Validated,
    Pending,
    Ready,
    Confirmed,
    Rejected,
    Expired,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStatus::Received => "received",
            TxStatus::Validated => "validated",
            TxStatus::Pending => "pending",
            TxStatus::Ready => "ready",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Rejected => "rejected",
            TxStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// A multisignature registration transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Content hash over the canonical bytes, signature included
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: u8,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    /// Hex-encoded sender public key
    pub sender_public_key: String,
    pub fee: u64,
    pub asset: MultisignatureRequest,
    /// Hex-encoded sender signature over the signing digest
    pub signature: String,
    #[serde(default)]
    pub status: TxStatus,
}

impl Transaction {
    /// Create and sign a registration for `sender`
    pub fn new_multisignature(
        sender: &KeyPair,
        asset: MultisignatureRequest,
        fee: u64,
        timestamp: i64,
    ) -> Result<Self, KeyError> {
        let mut tx = Self {
            id: String::new(),
            tx_type: MULTISIGNATURE_TYPE,
            timestamp,
            sender_public_key: sender.public_key_hex(),
            fee,
            asset,
            signature: String::new(),
            status: TxStatus::Received,
        };
        tx.sign(sender)?;
        Ok(tx)
    }

    /// Canonical bytes without the signature
    ///
    /// `type | timestamp (i64 LE) | sender key | fee (u64 LE) | min | lifetime | members`
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.asset.keysgroup.len() * 33);
        out.push(self.tx_type);
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        match hex::decode(&self.sender_public_key) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(_) => out.extend_from_slice(self.sender_public_key.as_bytes()),
        }
        out.extend_from_slice(&self.fee.to_le_bytes());
        out.push(self.asset.min);
        out.push(self.asset.lifetime);
        for member in &self.asset.keysgroup {
            member.write_bytes(&mut out);
        }
        out
    }

    /// Digest signed by the sender and by every co-signer
    pub fn signing_digest(&self) -> Vec<u8> {
        sha256(&self.signing_bytes())
    }

    /// Canonical bytes including the sender signature
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = self.signing_bytes();
        match hex::decode(&self.signature) {
            Ok(bytes) => out.extend_from_slice(&bytes),
            Err(_) => out.extend_from_slice(self.signature.as_bytes()),
        }
        out
    }

    /// Recompute the content hash
    pub fn calculate_id(&self) -> String {
        sha256_hex(&self.bytes())
    }

    /// Check the stored id against the content
    pub fn has_valid_id(&self) -> bool {
        !self.id.is_empty() && self.id == self.calculate_id()
    }

    /// Sign as the sender and refresh the id
    pub fn sign(&mut self, sender: &KeyPair) -> Result<(), KeyError> {
        self.signature = sender.sign_hex(&self.signing_digest())?;
        self.id = self.calculate_id();
        Ok(())
    }

    /// Produce a co-signer signature (hex) for this transaction
    pub fn co_sign(&self, signer: &KeyPair) -> Result<String, KeyError> {
        signer.sign_hex(&self.signing_digest())
    }

    /// Address of the account being converted
    pub fn sender_address(&self) -> String {
        match hex::decode(&self.sender_public_key) {
            Ok(bytes) => public_key_to_address(&bytes),
            Err(_) => public_key_to_address(self.sender_public_key.as_bytes()),
        }
    }

    pub fn is_multisignature(&self) -> bool {
        self.tx_type == MULTISIGNATURE_TYPE
    }
}

// =============================================================================
// Signature Records
// =============================================================================

/// An accepted co-signer signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub transaction_id: String,
    /// Hex-encoded co-signer public key
    pub signer_public_key: String,
    /// Hex-encoded signature
    pub signature: String,
    pub received_at: DateTime<Utc>,
}

impl SignatureRecord {
    pub fn new(
        transaction_id: impl Into<String>,
        signer_public_key: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            signer_public_key: signer_public_key.into(),
            signature: signature.into(),
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request(keys: &[&KeyPair]) -> MultisignatureRequest {
        MultisignatureRequest::new(
            2,
            24,
            keys.iter()
                .map(|k| KeysgroupMember::add(k.public_key_hex()))
                .collect(),
        )
    }

    #[test]
    fn test_member_parsing() {
        let key = "ab".repeat(32);

        let add = KeysgroupMember::parse(&format!("+{}", key));
        assert_eq!(add.operator, Some(Operator::Add));
        assert_eq!(add.public_key, key);

        let minus = KeysgroupMember::parse(&format!("-{}", key));
        assert_eq!(minus.operator, Some(Operator::Other('-')));

        let bare = KeysgroupMember::parse(&key);
        assert_eq!(bare.operator, None);
        assert_eq!(bare.public_key, key);

        assert!(KeysgroupMember::parse("").is_empty());
        assert_eq!(add.to_string(), format!("+{}", key));
    }

    #[test]
    fn test_member_serde_uses_wire_form() {
        let key = "cd".repeat(32);
        let member = KeysgroupMember::add(key.clone());
        let json = serde_json::to_string(&member).unwrap();
        assert_eq!(json, format!("\"+{}\"", key));

        let back: KeysgroupMember = serde_json::from_str(&json).unwrap();
        assert_eq!(back, member);
    }

    #[test]
    fn test_null_member_decodes_as_empty() {
        let members: Vec<KeysgroupMember> = serde_json::from_str(r#"[null, ""]"#).unwrap();
        assert!(members.iter().all(KeysgroupMember::is_empty));
    }

    #[test]
    fn test_transaction_id_and_signature() {
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        let b = KeyPair::generate();

        let tx = Transaction::new_multisignature(&sender, sample_request(&[&a, &b]), 1500, 1_000)
            .unwrap();

        assert!(tx.has_valid_id());
        assert_eq!(tx.tx_type, MULTISIGNATURE_TYPE);
        assert_eq!(tx.sender_address(), sender.address());

        let signature = hex::decode(&tx.signature).unwrap();
        assert!(sender.verify(&tx.signing_digest(), &signature).unwrap());
    }

    #[test]
    fn test_id_changes_with_content() {
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        let b = KeyPair::generate();

        let tx = Transaction::new_multisignature(&sender, sample_request(&[&a, &b]), 1500, 1_000)
            .unwrap();
        let mut tampered = tx.clone();
        tampered.asset.min = 1;

        assert!(!tampered.has_valid_id());
        assert_ne!(tx.signing_digest(), tampered.signing_digest());
    }

    #[test]
    fn test_co_signature_covers_digest() {
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let tx = Transaction::new_multisignature(&sender, sample_request(&[&a, &b]), 1500, 1_000)
            .unwrap();

        let sig = hex::decode(tx.co_sign(&a).unwrap()).unwrap();
        assert!(a.verify(&tx.signing_digest(), &sig).unwrap());
        assert!(!b.verify(&tx.signing_digest(), &sig).unwrap());
    }

    #[test]
    fn test_transaction_json_shape() {
        let sender = KeyPair::generate();
        let a = KeyPair::generate();
        let tx = Transaction::new_multisignature(&sender, sample_request(&[&a]), 1000, 7).unwrap();

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], 4);
        assert!(value["senderPublicKey"].is_string());
        assert_eq!(value["asset"]["keysgroup"][0], format!("+{}", a.public_key_hex()));
    }
}
