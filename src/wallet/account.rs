//! Account: a derived key bound to a chain, signing standard transactions
//!
//! An account starts unbound. Setting the chain ID, then the account number
//! and sequence, makes it able to sign. Signing never touches the sequence;
//! the caller increments it once a broadcast is confirmed.

use std::fmt;

use log::{debug, warn};
use num_bigint::BigUint;
use thiserror::Error;

use crate::chain::{ChainContextProvider, ChainError};
use crate::check::{issue_check, CheckError};
use crate::config::{ConfigError, WalletConfig};
use crate::crypto::{sign_message, KeyError, PrivateKey, PublicKey, ADDRESS_PREFIX};
use crate::hd::{ExtendedKey, HdError, Mnemonic, DEFAULT_DERIVATION_PATH, DEFAULT_ENTROPY_BITS};
use crate::tx::{
    estimate_gas_wanted, special_fee, Coins, Msg, StdFee, StdSignature, StdTx, TransactionError,
};

/// Rounds of gas estimation before settling on the last estimate
pub const MAX_GAS_ROUNDS: usize = 8;

// =============================================================================
// Error Types
// =============================================================================

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
    #[error("HD error: {0}")]
    HdError(#[from] HdError),
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("Check error: {0}")]
    CheckError(#[from] CheckError),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Chain error: {0}")]
    ChainError(#[from] ChainError),
}

/// Broad class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input: entropy size, path syntax, key bytes, message fields
    InputValidation,
    /// Signing attempted before the chain context was bound
    ChainContextMissing,
    /// Scalar or point out of range, signature generation failure
    Cryptographic,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::CryptoError(e) => key_error_kind(e),
            WalletError::HdError(e) => match e {
                HdError::UnusableSeed | HdError::DerivationExhausted(_) => ErrorKind::Cryptographic,
                HdError::KeyError(k) => key_error_kind(k),
                _ => ErrorKind::InputValidation,
            },
            WalletError::TransactionError(e) => match e {
                TransactionError::ChainContextMissing(_) => ErrorKind::ChainContextMissing,
                TransactionError::KeyError(k) => key_error_kind(k),
                _ => ErrorKind::InputValidation,
            },
            WalletError::CheckError(e) => match e {
                CheckError::ChainContextMissing => ErrorKind::ChainContextMissing,
                CheckError::SigningFailed(_) => ErrorKind::Cryptographic,
                CheckError::KeyError(k) => key_error_kind(k),
                _ => ErrorKind::InputValidation,
            },
            WalletError::ConfigError(_) => ErrorKind::InputValidation,
            WalletError::ChainError(_) => ErrorKind::ChainContextMissing,
        }
    }
}

fn key_error_kind(err: &KeyError) -> ErrorKind {
    match err {
        KeyError::InvalidLength(_) | KeyError::InvalidAddress(_) => ErrorKind::InputValidation,
        _ => ErrorKind::Cryptographic,
    }
}

// =============================================================================
// Account
// =============================================================================

/// Where an account is in its signing lifecycle
///
/// Signed and ready-to-broadcast are states of the transaction, not the
/// account; see [`StdTx::is_signed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// No chain ID
    Unbound,
    /// Chain ID set, account number or sequence missing
    ChainBound,
    /// Ready to sign
    AccountBound,
}

/// A key derived for the DX chain plus the context needed to sign with it
#[derive(Clone)]
pub struct Account {
    private_key: PrivateKey,
    address: String,
    chain_id: Option<String>,
    account_number: Option<u64>,
    sequence: Option<u64>,
}

impl Account {
    /// Create an account from a fresh 24-word mnemonic
    ///
    /// The mnemonic is returned alongside; it is the only way to restore
    /// the account.
    pub fn generate(passphrase: &str) -> Result<(Self, Mnemonic), WalletError> {
        let mnemonic = Mnemonic::generate(DEFAULT_ENTROPY_BITS, passphrase)?;
        let account = Self::from_mnemonic(&mnemonic)?;
        Ok((account, mnemonic))
    }

    /// Like [`Account::generate`], with the mnemonic size, path and prefix from `config`
    pub fn generate_with_config(
        passphrase: &str,
        config: &WalletConfig,
    ) -> Result<(Self, Mnemonic), WalletError> {
        let mnemonic = Mnemonic::generate(config.mnemonic_bits, passphrase)?;
        let account = Self::from_mnemonic_with_config(&mnemonic, config)?;
        Ok((account, mnemonic))
    }

    /// Restore an account from its mnemonic words
    pub fn from_mnemonic_words(words: &str, passphrase: &str) -> Result<Self, WalletError> {
        Self::from_mnemonic(&Mnemonic::from_words(words, passphrase)?)
    }

    /// Derive the account key at `m/44'/60'/0'/0/0`
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self, WalletError> {
        Self::from_mnemonic_with_path(mnemonic, DEFAULT_DERIVATION_PATH)
    }

    pub fn from_mnemonic_with_path(mnemonic: &Mnemonic, path: &str) -> Result<Self, WalletError> {
        Self::derive(mnemonic, path, ADDRESS_PREFIX)
    }

    /// Derive with the path and address prefix from `config`
    pub fn from_mnemonic_with_config(
        mnemonic: &Mnemonic,
        config: &WalletConfig,
    ) -> Result<Self, WalletError> {
        config.validate()?;
        Self::derive(mnemonic, &config.derivation_path, &config.address_prefix)
    }

    /// Import a raw private key with the default prefix
    pub fn from_private_key(private_key: PrivateKey) -> Result<Self, WalletError> {
        Self::with_prefix(private_key, ADDRESS_PREFIX)
    }

    fn derive(mnemonic: &Mnemonic, path: &str, prefix: &str) -> Result<Self, WalletError> {
        let root = ExtendedKey::master_from_seed(mnemonic.seed())?;
        let private_key = root.derive_path(path)?.to_private_key()?;
        let account = Self::with_prefix(private_key, prefix)?;
        debug!("Derived account {} at {}", account.address, path);
        Ok(account)
    }

    fn with_prefix(private_key: PrivateKey, prefix: &str) -> Result<Self, WalletError> {
        let address = private_key.public_key().address_with_prefix(prefix)?;
        Ok(Self {
            private_key,
            address,
            chain_id: None,
            account_number: None,
            sequence: None,
        })
    }

    // =========================================================================
    // Chain context
    // =========================================================================

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    pub fn with_account_number(mut self, account_number: u64) -> Self {
        self.account_number = Some(account_number);
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Fill chain ID, account number and sequence from `provider`
    pub fn bind<P: ChainContextProvider + ?Sized>(self, provider: &P) -> Result<Self, WalletError> {
        let chain_id = provider.chain_id()?;
        let (number, sequence) = provider.account_number_and_sequence(&self.address)?;
        debug!(
            "Bound {} to {} (account {}, sequence {})",
            self.address, chain_id, number, sequence
        );
        Ok(self
            .with_chain_id(chain_id)
            .with_account_number(number)
            .with_sequence(sequence))
    }

    /// Advance the sequence after a confirmed broadcast; returns the new value
    pub fn increment_sequence(&mut self) -> Result<u64, WalletError> {
        let sequence = self
            .sequence
            .ok_or(TransactionError::ChainContextMissing("sequence"))?;
        let next = sequence
            .checked_add(1)
            .ok_or_else(|| TransactionError::InvalidMessage("sequence overflow".to_string()))?;
        self.sequence = Some(next);
        Ok(next)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Bech32 address
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        self.private_key.public_key()
    }

    /// Get the account's private key
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn account_number(&self) -> Option<u64> {
        self.account_number
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn state(&self) -> AccountState {
        match (&self.chain_id, self.account_number, self.sequence) {
            (None, _, _) => AccountState::Unbound,
            (Some(_), Some(_), Some(_)) => AccountState::AccountBound,
            (Some(_), _, _) => AccountState::ChainBound,
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Assemble an unsigned transaction
    pub fn create_transaction(&self, msgs: Vec<Msg>, fee: StdFee, memo: &str) -> StdTx {
        StdTx::new(msgs, fee, memo)
    }

    /// Sign `tx` and append the signature
    ///
    /// Fails with a chain-context error before any signing when the chain
    /// ID, account number or sequence is unset.
    pub fn sign_transaction(&self, mut tx: StdTx) -> Result<StdTx, WalletError> {
        let (chain_id, account_number, sequence) = self.signing_context()?;
        for msg in &tx.msgs {
            msg.validate_basic()?;
        }

        let sign_bytes = tx.sign_bytes(chain_id, account_number, sequence)?;
        let signature = sign_message(&self.private_key, &sign_bytes);
        tx.add_signature(StdSignature {
            pub_key: *self.public_key(),
            signature: signature.to_vec(),
        });

        debug!(
            "Signed transaction with {} message(s) as {} (sequence {})",
            tx.msgs.len(),
            self.address,
            sequence
        );
        Ok(tx)
    }

    /// Build and sign a transaction whose gas matches its own estimate
    ///
    /// Starts from `initial_gas` and re-signs with each new estimate until
    /// the two agree.
    pub fn new_signed_transaction(
        &self,
        msgs: Vec<Msg>,
        fee_coins: Coins,
        memo: &str,
        initial_gas: u64,
    ) -> Result<StdTx, WalletError> {
        let mut gas = initial_gas;
        let mut tx = self.sign_transaction(self.create_transaction(
            msgs.clone(),
            StdFee::new(gas, fee_coins.clone()),
            memo,
        ))?;

        for _ in 1..MAX_GAS_ROUNDS {
            let estimated = estimate_gas_wanted(&tx)?;
            if estimated == gas {
                return Ok(tx);
            }
            gas = estimated;
            tx = self.sign_transaction(self.create_transaction(
                msgs.clone(),
                StdFee::new(gas, fee_coins.clone()),
                memo,
            ))?;
        }

        if estimate_gas_wanted(&tx)? != gas {
            warn!(
                "Gas estimate did not settle after {} rounds, using {}",
                MAX_GAS_ROUNDS, gas
            );
        }
        Ok(tx)
    }

    /// Like [`Account::new_signed_transaction`], with the starting gas and
    /// base coin from `config`
    ///
    /// Special fees the messages require (coin creation) are added to
    /// `fee_coins` in the base coin.
    pub fn new_signed_transaction_with_config(
        &self,
        msgs: Vec<Msg>,
        mut fee_coins: Coins,
        memo: &str,
        config: &WalletConfig,
    ) -> Result<StdTx, WalletError> {
        for extra in msgs.iter().filter_map(|msg| special_fee(msg, &config.base_coin)) {
            debug!("Adding special fee of {} {}", extra.amount, extra.denom);
            match fee_coins.iter_mut().find(|coin| coin.denom == extra.denom) {
                Some(coin) => coin.amount += extra.amount,
                None => fee_coins.push(extra),
            }
        }
        self.new_signed_transaction(msgs, fee_coins, memo, config.initial_gas)
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Issue a check on the account's chain, returned in base58 form
    pub fn issue_check(
        &self,
        coin: &str,
        amount: BigUint,
        nonce: &[u8],
        due_block: u64,
        passphrase: &str,
    ) -> Result<String, WalletError> {
        let chain_id = self.chain_id.as_deref().ok_or(CheckError::ChainContextMissing)?;
        Ok(issue_check(
            &self.private_key,
            chain_id,
            coin,
            amount,
            nonce,
            due_block,
            passphrase,
        )?)
    }

    fn signing_context(&self) -> Result<(&str, u64, u64), TransactionError> {
        let chain_id = self
            .chain_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(TransactionError::ChainContextMissing("chain ID"))?;
        let account_number = self
            .account_number
            .ok_or(TransactionError::ChainContextMissing("account number"))?;
        let sequence = self
            .sequence
            .ok_or(TransactionError::ChainContextMissing("sequence"))?;
        Ok((chain_id, account_number, sequence))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("account_number", &self.account_number)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}
