//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing
//! - Schnorr key management (secp256k1, 32-byte x-only public keys)
//! - Address derivation

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, sha256, sha256_hex};
pub use keys::{
    parse_public_key, public_key_to_address, verify_digest, KeyError, KeyPair, PUBLIC_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
