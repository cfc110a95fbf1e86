//! Hierarchical deterministic key management
//!
//! This module provides:
//! - BIP39 mnemonic phrases and seeds
//! - BIP32 derivation path parsing
//! - BIP32 extended keys with xprv/xpub serialization

pub mod error;
pub mod extended_key;
pub mod mnemonic;
pub mod path;

pub use error::HdError;
pub use extended_key::ExtendedKey;
pub use mnemonic::{Mnemonic, DEFAULT_ENTROPY_BITS, SEED_LEN, SUPPORTED_ENTROPY_BITS};
pub use path::{ChildIndex, DerivationPath, DEFAULT_DERIVATION_PATH, HARDENED_OFFSET};
