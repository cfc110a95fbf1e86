//! secp256k1 key material for DX accounts
//!
//! Private keys are raw 32-byte scalars; public keys are curve points with
//! a compressed (33 bytes) and an uncompressed (65 bytes) wire form.
//!
//! Account addresses mix two conventions: the 20-byte payload is the
//! Ethereum one (`Keccak256(X || Y)[12..]`) while the text form is Cosmos
//! bech32 with the `dx` human-readable prefix.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use bech32::{FromBase32, ToBase32, Variant};
use secp256k1::{Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::keccak256;

/// Human-readable prefix of account addresses
pub const ADDRESS_PREFIX: &str = "dx";

/// Length of a private key scalar
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a compressed public key (`0x02`/`0x03` || X)
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;

/// Length of an uncompressed public key (`0x04` || X || Y)
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// Length of an address payload
pub const ADDRESS_LEN: usize = 20;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key scalar")]
    InvalidScalar,
    #[error("Invalid public key point")]
    InvalidPoint,
    #[error("Invalid key length: {0} bytes")]
    InvalidLength(usize),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

// =============================================================================
// Private Key
// =============================================================================

/// A secp256k1 private key together with its public key
#[derive(Clone)]
pub struct PrivateKey {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl PrivateKey {
    /// Create a private key from 32 raw bytes
    ///
    /// Fails with [`KeyError::InvalidScalar`] unless `0 < d < n`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Create a private key from a hex-encoded scalar
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidScalar)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let inner = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key: PublicKey { inner },
        }
    }

    /// Raw 32-byte scalar
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.secret_key.secret_bytes()
    }

    /// Scalar as a hex string
    /// WARNING: Keep this secret!
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The public key derived by scalar base-point multiplication
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Public Key
// =============================================================================

/// A point on secp256k1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey {
    inner: secp256k1::PublicKey,
}

impl PublicKey {
    /// Parse a public key from its compressed or uncompressed form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match (bytes.len(), bytes.first()) {
            (COMPRESSED_PUBLIC_KEY_LEN, Some(0x02 | 0x03))
            | (UNCOMPRESSED_PUBLIC_KEY_LEN, Some(0x04)) => {}
            (COMPRESSED_PUBLIC_KEY_LEN | UNCOMPRESSED_PUBLIC_KEY_LEN, _) => {
                return Err(KeyError::InvalidPoint)
            }
            (len, _) => return Err(KeyError::InvalidLength(len)),
        }
        let inner = secp256k1::PublicKey::from_slice(bytes).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self { inner })
    }

    /// Parse a public key from hex (either wire form)
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPoint)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_inner(inner: secp256k1::PublicKey) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &secp256k1::PublicKey {
        &self.inner
    }

    /// Compressed form: parity byte followed by X
    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_LEN] {
        self.inner.serialize()
    }

    /// Uncompressed form: `0x04` followed by X and Y
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LEN] {
        self.inner.serialize_uncompressed()
    }

    /// Affine X coordinate (big-endian)
    pub fn x(&self) -> [u8; 32] {
        let mut x = [0u8; 32];
        x.copy_from_slice(&self.to_uncompressed()[1..33]);
        x
    }

    /// Affine Y coordinate (big-endian)
    pub fn y(&self) -> [u8; 32] {
        let mut y = [0u8; 32];
        y.copy_from_slice(&self.to_uncompressed()[33..]);
        y
    }

    /// Compressed form as hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// 20-byte address payload: low-order 20 bytes of `Keccak256(X || Y)`
    pub fn address_bytes(&self) -> [u8; ADDRESS_LEN] {
        let hash = keccak256(&self.to_uncompressed()[1..]);
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
        address
    }

    /// Bech32 account address with the `dx` prefix
    pub fn address(&self) -> String {
        // ADDRESS_PREFIX is a valid human-readable part, so encoding cannot fail
        self.address_with_prefix(ADDRESS_PREFIX).unwrap_or_default()
    }

    /// Bech32 address with a custom human-readable prefix
    pub fn address_with_prefix(&self, prefix: &str) -> Result<String, KeyError> {
        encode_address(prefix, &self.address_bytes())
    }
}

impl fmt::Display for PublicKey {
    /// Base64 of the compressed form, as the chain displays public keys
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", B64.encode(self.to_compressed()))
    }
}

// =============================================================================
// Wire-form helpers
// =============================================================================

/// Convert an uncompressed public key into its compressed form
pub fn compress(uncompressed: &[u8]) -> Result<[u8; COMPRESSED_PUBLIC_KEY_LEN], KeyError> {
    if uncompressed.len() != UNCOMPRESSED_PUBLIC_KEY_LEN {
        return Err(KeyError::InvalidLength(uncompressed.len()));
    }
    Ok(PublicKey::from_bytes(uncompressed)?.to_compressed())
}

/// Recover the uncompressed form of a compressed public key
pub fn decompress(compressed: &[u8]) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyError> {
    if compressed.len() != COMPRESSED_PUBLIC_KEY_LEN {
        return Err(KeyError::InvalidLength(compressed.len()));
    }
    Ok(PublicKey::from_bytes(compressed)?.to_uncompressed())
}

/// Bech32-encode a 20-byte address payload
pub fn encode_address(prefix: &str, payload: &[u8]) -> Result<String, KeyError> {
    bech32::encode(prefix, payload.to_base32(), Variant::Bech32)
        .map_err(|e| KeyError::InvalidAddress(e.to_string()))
}

/// Decode a bech32 address (any prefix) back into its 20-byte payload
pub fn address_to_bytes(address: &str) -> Result<[u8; ADDRESS_LEN], KeyError> {
    let (_, data, variant) =
        bech32::decode(address).map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
    if variant != Variant::Bech32 {
        return Err(KeyError::InvalidAddress(format!("{address}: not bech32")));
    }
    let payload = Vec::<u8>::from_base32(&data)
        .map_err(|e| KeyError::InvalidAddress(e.to_string()))?;
    payload
        .try_into()
        .map_err(|p: Vec<u8>| KeyError::InvalidAddress(format!("{address}: {} byte payload", p.len())))
}
