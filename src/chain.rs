//! Chain context collaborator
//!
//! Signing needs the chain ID plus the signer's account number and
//! sequence. A node serves those values; this module abstracts the source
//! so accounts can be bound online or offline.

use std::collections::HashMap;

use thiserror::Error;

/// Errors returned by a chain context source
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Account {0} is not known to the chain")]
    UnknownAccount(String),
    #[error("Chain context unavailable: {0}")]
    Unavailable(String),
}

/// Source of the values a signer must bind before signing
pub trait ChainContextProvider {
    /// Identifier of the chain transactions are signed for
    fn chain_id(&self) -> Result<String, ChainError>;

    /// Account number and next sequence of `address`
    fn account_number_and_sequence(&self, address: &str) -> Result<(u64, u64), ChainError>;
}

/// Fixed chain context, for offline signing
#[derive(Debug, Clone, Default)]
pub struct StaticChainContext {
    chain_id: String,
    accounts: HashMap<String, (u64, u64)>,
}

impl StaticChainContext {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            accounts: HashMap::new(),
        }
    }

    /// Register an account's number and sequence
    pub fn with_account(mut self, address: impl Into<String>, number: u64, sequence: u64) -> Self {
        self.accounts.insert(address.into(), (number, sequence));
        self
    }
}

impl ChainContextProvider for StaticChainContext {
    fn chain_id(&self) -> Result<String, ChainError> {
        if self.chain_id.is_empty() {
            return Err(ChainError::Unavailable("chain ID is empty".to_string()));
        }
        Ok(self.chain_id.clone())
    }

    fn account_number_and_sequence(&self, address: &str) -> Result<(u64, u64), ChainError> {
        self.accounts
            .get(address)
            .copied()
            .ok_or_else(|| ChainError::UnknownAccount(address.to_string()))
    }
}
