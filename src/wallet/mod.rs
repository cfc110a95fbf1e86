//! Wallet module for account management and signing

pub mod account;

pub use account::{Account, AccountState, ErrorKind, WalletError, MAX_GAS_ROUNDS};
