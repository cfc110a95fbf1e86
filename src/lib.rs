//! DX Wallet: client-side key management and signing for the DX chain
//!
//! This crate provides:
//! - BIP39 mnemonics and BIP32 hierarchical key derivation
//! - secp256k1 keys with bech32 `dx` addresses
//! - Accounts that build and sign Cosmos SDK standard transactions
//! - Amino binary and JSON encoding with fee and gas estimation
//! - Password-locked checks (bearer vouchers) in base58 form
//!
//! Nothing here talks to the network: the chain ID, account number and
//! sequence come from a [`ChainContextProvider`], and broadcasting the
//! resulting JSON is left to the caller.
//!
//! # Example
//!
//! ```rust
//! use dx_wallet::tx::{Coin, Msg};
//! use dx_wallet::wallet::Account;
//!
//! // Create an account from a fresh mnemonic
//! let (account, mnemonic) = Account::generate("").unwrap();
//! println!("Address: {} ({} words)", account.address(), mnemonic.word_count());
//!
//! // Bind the chain context and sign a transfer
//! let account = account
//!     .with_chain_id("decimal-testnet")
//!     .with_account_number(0)
//!     .with_sequence(0);
//! let send = Msg::send_coin(
//!     account.address(),
//!     "dx1npvwllfr9dqr8erajqqr6s0vxnk2ak550f7ed0",
//!     Coin::new("tdel", 1_000u32),
//! );
//! let tx = account
//!     .new_signed_transaction(vec![send], Vec::new(), "", 16384)
//!     .unwrap();
//! println!("{}", tx.to_json().unwrap());
//! ```

pub mod chain;
pub mod check;
pub mod config;
pub mod crypto;
pub mod hd;
pub mod tx;
pub mod wallet;

// Re-export commonly used types
pub use chain::{ChainContextProvider, ChainError, StaticChainContext};
pub use check::{issue_check, Check, CheckError};
pub use config::{ConfigError, WalletConfig};
pub use crypto::{KeyError, PrivateKey, PublicKey};
pub use hd::{DerivationPath, ExtendedKey, HdError, Mnemonic};
pub use tx::{BroadcastMode, Coin, Msg, StdFee, StdTx, TransactionError};
pub use wallet::{Account, AccountState, ErrorKind, WalletError};
