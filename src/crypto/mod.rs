//! Cryptographic primitives for the wallet
//!
//! This module provides:
//! - SHA-256, HASH160, Keccak-256 and HMAC-SHA512 digests
//! - secp256k1 private/public keys and bech32 account addresses
//! - Deterministic ECDSA signatures (plain and recoverable)

pub mod hash;
pub mod keys;
pub mod signature;

pub use hash::{double_sha256, hash160, hmac_sha512, keccak256, sha256};
pub use keys::{
    address_to_bytes, compress, decompress, encode_address, KeyError, PrivateKey, PublicKey,
    ADDRESS_LEN, ADDRESS_PREFIX,
};
pub use signature::{
    recover_public_key, sign_digest, sign_message, sign_recoverable, verify_digest,
    verify_message,
};
