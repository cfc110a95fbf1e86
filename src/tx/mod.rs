//! Transactions for the DX chain
//!
//! This module provides:
//! - Coins with arbitrary-precision amounts
//! - The chain's message types
//! - Amino binary and JSON encoding
//! - Standard transactions, their sign bytes and signatures
//! - Fee and gas estimation

pub mod amino;
pub mod coin;
pub mod fee;
pub mod msg;
pub mod std_tx;

pub use coin::{is_valid_coin_symbol, Coin, Coins};
pub use fee::{estimate_gas_wanted, message_units, special_fee, DEFAULT_INITIAL_GAS};
pub use msg::Msg;
pub use std_tx::{std_sign_bytes, BroadcastMode, StdFee, StdSignature, StdTx, TransactionError};
