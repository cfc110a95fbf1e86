//! Fee and gas estimation
//!
//! Fees are measured in units (1 unit = 10^15 smallest coin units = 0.001
//! of a whole coin). A transaction pays a fixed number of units per
//! message plus 2 units for every byte of its binary encoding. Gas wanted
//! equals that unit total.

use num_bigint::BigUint;

use super::coin::{Coin, COIN_EXPONENT};
use super::msg::Msg;
use super::std_tx::{StdTx, TransactionError};

// =============================================================================
// Constants
// =============================================================================

/// Smallest coin units in one fee unit
pub const UNIT_EXPONENT: u32 = 15;

/// Units charged per byte of the binary transaction
pub const BYTE_FEE_UNITS: u64 = 2;

/// Gas the first estimation round starts from
pub const DEFAULT_INITIAL_GAS: u64 = 16 * 1024;

/// Extra units per multi-send leg beyond the first
pub const MULTI_SEND_EXTRA_UNITS: u64 = 5;

/// Fixed units per message, keyed by `route/type`
///
/// Governance messages are free.
pub const MESSAGE_UNITS: &[(&str, u64)] = &[
    ("coin/create_coin", 100),
    ("coin/send_coin", 10),
    ("coin/multi_send_coin", 10),
    ("coin/buy_coin", 100),
    ("coin/sell_coin", 100),
    ("coin/sell_all_coin", 100),
    ("coin/redeem_check", 30),
    ("coin/update_coin", 100),
    ("multisig/create_wallet", 100),
    ("multisig/create_transaction", 100),
    ("multisig/sign_transaction", 100),
    ("validator/declare_candidate", 10_000),
    ("validator/edit_candidate", 10_000),
    ("validator/delegate", 200),
    ("validator/unbond", 200),
    ("validator/set_online", 100),
    ("validator/set_offline", 100),
    ("gov/submit_proposal", 0),
    ("gov/vote", 0),
];

// =============================================================================
// Estimation
// =============================================================================

/// Fixed units for a registered message name, if the chain charges it
pub fn unit_fee(amino_name: &str) -> Option<u64> {
    MESSAGE_UNITS
        .iter()
        .find(|(name, _)| *name == amino_name)
        .map(|(_, units)| *units)
}

/// Fixed units charged for one message
pub fn message_units(msg: &Msg) -> u64 {
    let base = unit_fee(&msg.amino_name()).unwrap_or_default();
    match msg {
        Msg::MultiSendCoin(m) => {
            let extra = m.sends.len().saturating_sub(1) as u64;
            base + extra * MULTI_SEND_EXTRA_UNITS
        }
        _ => base,
    }
}

/// Units charged for the binary size of the transaction
pub fn byte_units(tx: &StdTx) -> Result<u64, TransactionError> {
    Ok(tx.to_binary()?.len() as u64 * BYTE_FEE_UNITS)
}

/// Gas the transaction needs: byte cost plus every message's fixed cost
pub fn estimate_gas_wanted(tx: &StdTx) -> Result<u64, TransactionError> {
    let messages: u64 = tx.msgs.iter().map(message_units).sum();
    Ok(byte_units(tx)? + messages)
}

/// Convert fee units to smallest coin units
pub fn units_to_amount(units: u64) -> BigUint {
    BigUint::from(units) * BigUint::from(10u8).pow(UNIT_EXPONENT)
}

/// Extra payment in the base coin that some messages require on success
///
/// Creating a coin costs more the shorter its symbol is.
pub fn special_fee(msg: &Msg, base_coin: &str) -> Option<Coin> {
    let Msg::CreateCoin(create) = msg else {
        return None;
    };
    let whole: u64 = match create.symbol.len() {
        3 => 1_000_000,
        4 => 100_000,
        5 => 10_000,
        6 => 1_000,
        _ => 100,
    };
    let amount = BigUint::from(whole) * BigUint::from(10u8).pow(COIN_EXPONENT);
    Some(Coin::new(base_coin, amount))
}
