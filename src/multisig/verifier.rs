//! Signature verification
//!
//! Co-signers and the sender sign the transaction's signing digest.
//! Verification is a pure CPU check and never mutates state.

use crate::core::Transaction;
use crate::crypto::verify_digest;

/// Checks that a signature was produced by a public key over a transaction
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, signature: &[u8], signer_public_key: &[u8], transaction: &Transaction)
        -> bool;
}

/// BIP-340 Schnorr verification over secp256k1
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrVerifier;

impl SignatureVerifier for SchnorrVerifier {
    fn verify(
        &self,
        signature: &[u8],
        signer_public_key: &[u8],
        transaction: &Transaction,
    ) -> bool {
        match verify_digest(signer_public_key, &transaction.signing_digest(), signature) {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("Rejecting malformed signature for {}: {}", transaction.id, e);
                false
            }
        }
    }
}

/// Verify hex-encoded signature and key, treating bad hex as a failed check
pub fn verify_hex(
    verifier: &dyn SignatureVerifier,
    signature_hex: &str,
    signer_public_key_hex: &str,
    transaction: &Transaction,
) -> bool {
    match (hex::decode(signature_hex), hex::decode(signer_public_key_hex)) {
        (Ok(signature), Ok(public_key)) => verifier.verify(&signature, &public_key, transaction),
        _ => false,
    }
}

/// Verify the sender's own signature on a transaction
pub fn verify_sender(verifier: &dyn SignatureVerifier, transaction: &Transaction) -> bool {
    verify_hex(
        verifier,
        &transaction.signature,
        &transaction.sender_public_key,
        transaction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KeysgroupMember, MultisignatureRequest};
    use crate::crypto::KeyPair;

    fn registration(sender: &KeyPair, member: &KeyPair, timestamp: i64) -> Transaction {
        Transaction::new_multisignature(
            sender,
            MultisignatureRequest::new(1, 24, vec![KeysgroupMember::add(member.public_key_hex())]),
            1000,
            timestamp,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_co_signature() {
        let sender = KeyPair::generate();
        let member = KeyPair::generate();
        let tx = registration(&sender, &member, 1);

        let sig = tx.co_sign(&member).unwrap();
        assert!(verify_hex(&SchnorrVerifier, &sig, &member.public_key_hex(), &tx));
        assert!(verify_sender(&SchnorrVerifier, &tx));
    }

    #[test]
    fn test_signature_for_other_transaction() {
        let sender = KeyPair::generate();
        let member = KeyPair::generate();
        let tx1 = registration(&sender, &member, 1);
        let tx2 = registration(&sender, &member, 2);

        let sig = tx1.co_sign(&member).unwrap();
        assert!(!verify_hex(&SchnorrVerifier, &sig, &member.public_key_hex(), &tx2));
    }

    #[test]
    fn test_wrong_signer_key() {
        let sender = KeyPair::generate();
        let member = KeyPair::generate();
        let tx = registration(&sender, &member, 1);

        let sig = tx.co_sign(&member).unwrap();
        assert!(!verify_hex(&SchnorrVerifier, &sig, &sender.public_key_hex(), &tx));
    }

    #[test]
    fn test_malformed_inputs() {
        let sender = KeyPair::generate();
        let member = KeyPair::generate();
        let tx = registration(&sender, &member, 1);
        let sig = tx.co_sign(&member).unwrap();

        assert!(!verify_hex(&SchnorrVerifier, "zz", &member.public_key_hex(), &tx));
        assert!(!verify_hex(&SchnorrVerifier, &sig[..20], &member.public_key_hex(), &tx));
        assert!(!verify_hex(&SchnorrVerifier, &sig, "00ff", &tx));
    }
}
