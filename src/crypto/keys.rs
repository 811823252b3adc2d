//! Schnorr key management
//!
//! Account and co-signer keys are BIP-340 Schnorr keys on secp256k1.
//! Public keys travel as 32-byte x-only keys (64 hex chars) and
//! signatures as 64 bytes.

use rand::rngs::OsRng;
use ripemd::Ripemd160;
use secp256k1::{schnorr, Keypair as SchnorrKeypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use sha2::Digest;
use thiserror::Error;

use super::hash::{double_sha256, sha256};

/// Length of a serialized public key in bytes
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of a serialized signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;

/// Address version byte
const ADDRESS_VERSION: u8 = 0x00;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid digest length: expected 32 bytes, got {0}")]
    InvalidDigest(usize),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A signing key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    keypair: SchnorrKeypair,
    pub public_key: XOnlyPublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, _) = secp.generate_keypair(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let keypair = SchnorrKeypair::from_secret_key(&secp, &secret_key);
        let (public_key, _parity) = keypair.x_only_public_key();
        Self {
            secret_key,
            keypair,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Raw 32-byte public key
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.public_key.serialize()
    }

    /// Get the public key as a hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Account address controlled by this key
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key_bytes())
    }

    /// Sign a 32-byte digest
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_digest(&self.keypair, digest)
    }

    /// Sign a digest and hex-encode the signature
    pub fn sign_hex(&self, digest: &[u8]) -> Result<String, KeyError> {
        Ok(hex::encode(self.sign(digest)?))
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
        verify_digest(&self.public_key_bytes(), digest, signature)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Convert a public key to an account address
///
/// Address = Base58Check(version || RIPEMD160(SHA256(pubkey)))
pub fn public_key_to_address(public_key: &[u8]) -> String {
    let sha256_hash = sha256(public_key);

    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let ripemd_hash = ripemd.finalize();

    let mut address_bytes = vec![ADDRESS_VERSION];
    address_bytes.extend_from_slice(&ripemd_hash);

    let checksum = double_sha256(&address_bytes);
    address_bytes.extend_from_slice(&checksum[..4]);

    bs58::encode(address_bytes).into_string()
}

/// Parse a 32-byte x-only public key
pub fn parse_public_key(bytes: &[u8]) -> Result<XOnlyPublicKey, KeyError> {
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(KeyError::InvalidPublicKey);
    }
    XOnlyPublicKey::from_slice(bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Produce a Schnorr signature over a 32-byte digest
fn sign_digest(keypair: &SchnorrKeypair, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
    if digest.len() != 32 {
        return Err(KeyError::InvalidDigest(digest.len()));
    }
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let signature = secp.sign_schnorr(&message, keypair);
    Ok(signature.as_ref().to_vec())
}

/// Verify a Schnorr signature over a 32-byte digest
///
/// Returns `Ok(false)` for a well-formed signature that does not match;
/// malformed keys or signatures are errors.
pub fn verify_digest(public_key: &[u8], digest: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
    if digest.len() != 32 {
        return Err(KeyError::InvalidDigest(digest.len()));
    }
    let public_key = parse_public_key(public_key)?;
    if signature.len() != SIGNATURE_LENGTH {
        return Err(KeyError::InvalidSignature);
    }
    let signature =
        schnorr::Signature::from_slice(signature).map_err(|_| KeyError::InvalidSignature)?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest_slice(digest)?;
    Ok(secp.verify_schnorr(&signature, &message, &public_key).is_ok())
}
