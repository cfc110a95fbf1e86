//! Bearer checks (vouchers) redeemable for coins

pub mod check;

pub use check::{issue_check, passphrase_key, Check, CheckError};
