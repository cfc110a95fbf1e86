//! Errors raised by mnemonic handling and hierarchical key derivation

use thiserror::Error;

use crate::crypto::KeyError;

/// Mnemonic and HD derivation errors
#[derive(Error, Debug)]
pub enum HdError {
    #[error("Invalid entropy size: {0} bits (expected 128, 160, 192, 224 or 256)")]
    InvalidEntropySize(usize),
    #[error("Mnemonic checksum mismatch")]
    InvalidChecksum,
    #[error("Invalid mnemonic word list: {0}")]
    InvalidWordlist(String),
    #[error("Invalid derivation path {0:?}")]
    InvalidPath(String),
    #[error("Master extended key required to derive path {0:?}")]
    RequiresMasterKey(String),
    #[error("Hardened derivation requires a private extended key")]
    HardenedRequiresPrivateKey,
    #[error("Extended key is not private")]
    NotPrivate,
    #[error("Invalid seed length: {0} bytes (expected 16 to 64)")]
    InvalidSeedLength(usize),
    #[error("Seed produces an unusable master key")]
    UnusableSeed,
    #[error("No valid child key left after index {0}")]
    DerivationExhausted(u32),
    #[error("Invalid serialized extended key: {0}")]
    InvalidExtendedKey(String),
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),
}

impl From<bip39::Error> for HdError {
    fn from(err: bip39::Error) -> Self {
        match err {
            bip39::Error::BadEntropyBitCount(bits) => HdError::InvalidEntropySize(bits),
            bip39::Error::InvalidChecksum => HdError::InvalidChecksum,
            bip39::Error::BadWordCount(count) => {
                HdError::InvalidWordlist(format!("{count} words"))
            }
            bip39::Error::UnknownWord(index) => {
                HdError::InvalidWordlist(format!("unknown word at position {index}"))
            }
            other => HdError::InvalidWordlist(other.to_string()),
        }
    }
}
