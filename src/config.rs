//! Wallet configuration
//!
//! Defaults match the DX network: `dx` addresses, the Ethereum coin type
//! path `m/44'/60'/0'/0/0`, 24-word mnemonics and `tdel` as the base coin.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{encode_address, ADDRESS_LEN, ADDRESS_PREFIX};
use crate::hd::{DerivationPath, DEFAULT_DERIVATION_PATH, DEFAULT_ENTROPY_BITS, SUPPORTED_ENTROPY_BITS};
use crate::tx::{is_valid_coin_symbol, DEFAULT_INITIAL_GAS};

/// Base coin of the test network
pub const DEFAULT_BASE_COIN: &str = "tdel";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters accounts are derived and transactions are built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Bech32 human-readable prefix of account addresses
    pub address_prefix: String,
    /// BIP32 path of the account key
    pub derivation_path: String,
    /// Entropy size of generated mnemonics
    pub mnemonic_bits: usize,
    /// Coin special fees are paid in
    pub base_coin: String,
    /// Gas the fee estimation starts from
    pub initial_gas: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            address_prefix: ADDRESS_PREFIX.to_string(),
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
            mnemonic_bits: DEFAULT_ENTROPY_BITS,
            base_coin: DEFAULT_BASE_COIN.to_string(),
            initial_gas: DEFAULT_INITIAL_GAS,
        }
    }
}

impl WalletConfig {
    /// Load and validate a JSON configuration file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Reject values no account could be built with
    pub fn validate(&self) -> Result<(), ConfigError> {
        encode_address(&self.address_prefix, &[0u8; ADDRESS_LEN])
            .map_err(|_| invalid(format!("address prefix {:?}", self.address_prefix)))?;
        if self.address_prefix.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(invalid(format!(
                "address prefix {:?} must be lowercase",
                self.address_prefix
            )));
        }
        self.derivation_path
            .parse::<DerivationPath>()
            .map_err(|_| invalid(format!("derivation path {:?}", self.derivation_path)))?;
        if !SUPPORTED_ENTROPY_BITS.contains(&self.mnemonic_bits) {
            return Err(invalid(format!("mnemonic size {} bits", self.mnemonic_bits)));
        }
        if !is_valid_coin_symbol(&self.base_coin) {
            return Err(invalid(format!("base coin {:?}", self.base_coin)));
        }
        if self.initial_gas == 0 {
            return Err(invalid("initial gas must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid(reason)
}
