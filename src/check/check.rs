//! Check issuance
//!
//! A check is a bearer voucher for an amount of a coin. It carries two
//! signatures made in a fixed order:
//! 1. the lock: a recoverable signature over the check without the lock,
//!    made with a key derived from a passphrase (`sha256(passphrase)`)
//! 2. the issuer signature over the whole check, lock included
//!
//! The check is RLP-encoded as
//! `[chain_id, coin, amount, nonce, due_block, lock, v, r, s]` and handed
//! out as a base58 string.

use std::fmt;
use std::str::FromStr;

use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;
use rlp::{Rlp, RlpStream};
use thiserror::Error;

use crate::crypto::signature::{RECOVERABLE_SIGNATURE_LEN, SIGNATURE_LEN};
use crate::crypto::{keccak256, recover_public_key, sha256, sign_recoverable, KeyError, PrivateKey, PublicKey};
use crate::tx::is_valid_coin_symbol;

/// Offset added to the recovery id in the `v` field
pub const V_OFFSET: u8 = 27;

const RLP_FIELDS: usize = 9;

// =============================================================================
// Error Types
// =============================================================================

/// Check-related errors
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Invalid amount: must be positive")]
    InvalidAmount,
    #[error("Invalid coin symbol: {0:?}")]
    InvalidCoinSymbol(String),
    #[error("Chain context missing: chain ID is not set")]
    ChainContextMissing,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Malformed check: {0}")]
    Malformed(String),
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),
}

impl From<rlp::DecoderError> for CheckError {
    fn from(err: rlp::DecoderError) -> Self {
        CheckError::Malformed(err.to_string())
    }
}

// =============================================================================
// Check
// =============================================================================

/// A check and its signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub chain_id: String,
    pub coin: String,
    pub amount: BigUint,
    pub nonce: Vec<u8>,
    pub due_block: u64,
    /// 65-byte recoverable passphrase signature as an integer
    pub lock: BigUint,
    pub v: BigUint,
    pub r: BigUint,
    pub s: BigUint,
}

impl Check {
    /// An unsigned check; validates the chain ID, coin and amount
    pub fn new(
        chain_id: &str,
        coin: &str,
        amount: BigUint,
        nonce: &[u8],
        due_block: u64,
    ) -> Result<Self, CheckError> {
        if chain_id.is_empty() {
            return Err(CheckError::ChainContextMissing);
        }
        if !is_valid_coin_symbol(coin) {
            return Err(CheckError::InvalidCoinSymbol(coin.to_string()));
        }
        if amount.is_zero() {
            return Err(CheckError::InvalidAmount);
        }
        Ok(Self {
            chain_id: chain_id.to_string(),
            coin: coin.to_string(),
            amount,
            nonce: nonce.to_vec(),
            due_block,
            lock: BigUint::zero(),
            v: BigUint::zero(),
            r: BigUint::zero(),
            s: BigUint::zero(),
        })
    }

    /// Build, lock and sign a check
    ///
    /// The lock is computed first; the issuer signature covers it.
    pub fn issue(
        issuer: &PrivateKey,
        chain_id: &str,
        coin: &str,
        amount: BigUint,
        nonce: &[u8],
        due_block: u64,
        passphrase: &str,
    ) -> Result<Self, CheckError> {
        let mut check = Self::new(chain_id, coin, amount, nonce, due_block)?;

        let lock_key = passphrase_key(passphrase)?;
        check.set_lock(&sign_recoverable(&lock_key, &check.hash_without_lock()));
        check.set_signature(&sign_recoverable(issuer, &check.hash()));

        debug!("Issued check for {} {} due at block {}", check.amount, check.coin, due_block);
        Ok(check)
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    /// Keccak-256 of `rlp([chain_id, coin, amount, nonce, due_block])`
    pub fn hash_without_lock(&self) -> [u8; 32] {
        let mut stream = RlpStream::new_list(5);
        self.append_body(&mut stream);
        keccak256(&stream.out())
    }

    /// Keccak-256 of `rlp([chain_id, coin, amount, nonce, due_block, lock])`
    pub fn hash(&self) -> [u8; 32] {
        let mut stream = RlpStream::new_list(6);
        self.append_body(&mut stream);
        stream.append(&int_bytes(&self.lock));
        keccak256(&stream.out())
    }

    fn append_body(&self, stream: &mut RlpStream) {
        stream
            .append(&self.chain_id.as_str())
            .append(&self.coin.as_str())
            .append(&int_bytes(&self.amount))
            .append(&self.nonce)
            .append(&self.due_block);
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    /// Store a 65-byte recoverable passphrase signature as the lock
    pub fn set_lock(&mut self, signature: &[u8; RECOVERABLE_SIGNATURE_LEN]) {
        self.lock = BigUint::from_bytes_be(signature);
    }

    /// Store the issuer signature as `r`, `s` and `v = recid + 27`
    pub fn set_signature(&mut self, signature: &[u8; RECOVERABLE_SIGNATURE_LEN]) {
        self.r = BigUint::from_bytes_be(&signature[..32]);
        self.s = BigUint::from_bytes_be(&signature[32..SIGNATURE_LEN]);
        self.v = BigUint::from(signature[SIGNATURE_LEN]) + V_OFFSET;
    }

    /// The lock as 65 bytes `r || s || recid`
    pub fn lock_signature(&self) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], CheckError> {
        left_pad(&self.lock)
    }

    /// The issuer signature as 65 bytes `r || s || recid`
    pub fn issuer_signature(&self) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], CheckError> {
        let r: [u8; 32] = left_pad(&self.r)?;
        let s: [u8; 32] = left_pad(&self.s)?;
        let recovery_id = u8::try_from(&self.v)
            .ok()
            .and_then(|v| v.checked_sub(V_OFFSET))
            .ok_or_else(|| CheckError::Malformed(format!("v = {}", self.v)))?;

        let mut signature = [0u8; RECOVERABLE_SIGNATURE_LEN];
        signature[..32].copy_from_slice(&r);
        signature[32..SIGNATURE_LEN].copy_from_slice(&s);
        signature[SIGNATURE_LEN] = recovery_id;
        Ok(signature)
    }

    /// Public key that signed the check
    pub fn issuer(&self) -> Result<PublicKey, CheckError> {
        Ok(recover_public_key(&self.hash(), &self.issuer_signature()?)?)
    }

    /// Public key of the passphrase that locked the check
    pub fn lock_public_key(&self) -> Result<PublicKey, CheckError> {
        Ok(recover_public_key(&self.hash_without_lock(), &self.lock_signature()?)?)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// RLP encoding of all nine fields
    pub fn to_rlp(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(RLP_FIELDS);
        self.append_body(&mut stream);
        stream
            .append(&int_bytes(&self.lock))
            .append(&int_bytes(&self.v))
            .append(&int_bytes(&self.r))
            .append(&int_bytes(&self.s));
        stream.out().to_vec()
    }

    /// Base58 bearer string
    pub fn encode(&self) -> String {
        bs58::encode(self.to_rlp()).into_string()
    }

    /// Parse an RLP-encoded check
    pub fn from_rlp(bytes: &[u8]) -> Result<Self, CheckError> {
        let rlp = Rlp::new(bytes);
        if !rlp.is_list() || rlp.item_count()? != RLP_FIELDS {
            return Err(CheckError::Malformed(format!(
                "expected a list of {RLP_FIELDS} items"
            )));
        }
        let int_at = |index: usize| -> Result<BigUint, CheckError> {
            Ok(BigUint::from_bytes_be(rlp.at(index)?.data()?))
        };
        Ok(Self {
            chain_id: rlp.val_at(0)?,
            coin: rlp.val_at(1)?,
            amount: int_at(2)?,
            nonce: rlp.val_at(3)?,
            due_block: rlp.val_at(4)?,
            lock: int_at(5)?,
            v: int_at(6)?,
            r: int_at(7)?,
            s: int_at(8)?,
        })
    }

    /// Parse a base58 bearer string
    ///
    /// Only decodes; redeeming a check is the chain's business.
    pub fn decode(encoded: &str) -> Result<Self, CheckError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CheckError::Malformed(e.to_string()))?;
        Self::from_rlp(&bytes)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Check {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Issue a check and return its base58 bearer string
pub fn issue_check(
    issuer: &PrivateKey,
    chain_id: &str,
    coin: &str,
    amount: BigUint,
    nonce: &[u8],
    due_block: u64,
    passphrase: &str,
) -> Result<String, CheckError> {
    Ok(Check::issue(issuer, chain_id, coin, amount, nonce, due_block, passphrase)?.encode())
}

/// Key a passphrase locks checks with: the scalar `sha256(passphrase)`
pub fn passphrase_key(passphrase: &str) -> Result<PrivateKey, CheckError> {
    PrivateKey::from_bytes(&sha256(passphrase.as_bytes()))
        .map_err(|e| CheckError::SigningFailed(format!("passphrase key: {e}")))
}

/// Minimal big-endian bytes; zero encodes as no bytes
fn int_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

fn left_pad<const N: usize>(value: &BigUint) -> Result<[u8; N], CheckError> {
    let bytes = int_bytes(value);
    if bytes.len() > N {
        return Err(CheckError::Malformed(format!("integer wider than {N} bytes")));
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_digest;

    const CHAIN_ID: &str = "decimal-testnet";

    fn issuer() -> PrivateKey {
        PrivateKey::from_hex("1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727")
            .unwrap()
    }

    fn one_coin() -> BigUint {
        BigUint::from(10u8).pow(18)
    }

    fn issued() -> Check {
        Check::issue(&issuer(), CHAIN_ID, "tdel", one_coin(), &[1], 999_999, "secret").unwrap()
    }

    #[test]
    fn test_hash_without_lock_vector() {
        let check = Check::new(CHAIN_ID, "tdel", one_coin(), &[1], 999_999).unwrap();
        assert_eq!(
            hex::encode(check.hash_without_lock()),
            "693efd030cc53a793c6069de393124a693c54a6124f4b80c8c0a725e8df62d44"
        );
    }

    #[test]
    fn test_dual_signature_integrity() {
        let check = issued();

        let lock_key = passphrase_key("secret").unwrap();
        assert_eq!(&check.lock_public_key().unwrap(), lock_key.public_key());
        let lock = check.lock_signature().unwrap();
        assert!(lock[64] <= 1);
        assert!(verify_digest(lock_key.public_key(), &check.hash_without_lock(), &lock[..64]).unwrap());

        assert_eq!(&check.issuer().unwrap(), issuer().public_key());
        let signature = check.issuer_signature().unwrap();
        assert!(verify_digest(issuer().public_key(), &check.hash(), &signature[..64]).unwrap());
        assert!(check.v == BigUint::from(27u8) || check.v == BigUint::from(28u8));
    }

    #[test]
    fn test_lock_is_covered_by_issuer_signature() {
        let check = issued();
        let mut relocked = check.clone();
        let other_key = passphrase_key("other").unwrap();
        relocked.set_lock(&sign_recoverable(&other_key, &relocked.hash_without_lock()));

        assert_ne!(relocked.hash(), check.hash());
        assert_ne!(&relocked.issuer().unwrap(), issuer().public_key());
    }

    #[test]
    fn test_amount_bit_flip_invalidates_signature() {
        let check = issued();
        let mut tampered = check.clone();
        tampered.amount ^= BigUint::from(1u8);

        let signature = tampered.issuer_signature().unwrap();
        assert!(!verify_digest(issuer().public_key(), &tampered.hash(), &signature[..64]).unwrap());
        assert_ne!(&tampered.issuer().unwrap(), issuer().public_key());
    }

    #[test]
    fn test_encode_decode() {
        let check = issued();
        let encoded = check.encode();
        let decoded: Check = encoded.parse().unwrap();
        assert_eq!(decoded, check);
        assert_eq!(decoded.to_string(), encoded);
        assert!(Check::decode("0OIl").is_err());
        assert!(Check::decode(&bs58::encode([0xc0]).into_string()).is_err());
    }

    #[test]
    fn test_issue_is_deterministic() {
        let a = issue_check(&issuer(), CHAIN_ID, "tdel", one_coin(), &[1], 10, "pin").unwrap();
        let b = issue_check(&issuer(), CHAIN_ID, "tdel", one_coin(), &[1], 10, "pin").unwrap();
        assert_eq!(a, b);
        let c = issue_check(&issuer(), CHAIN_ID, "tdel", one_coin(), &[2], 10, "pin").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_issue_validates_input() {
        let key = issuer();
        assert!(matches!(
            issue_check(&key, CHAIN_ID, "tdel", BigUint::zero(), &[1], 10, "pin"),
            Err(CheckError::InvalidAmount)
        ));
        assert!(matches!(
            issue_check(&key, CHAIN_ID, "t!", one_coin(), &[1], 10, "pin"),
            Err(CheckError::InvalidCoinSymbol(_))
        ));
        assert!(matches!(
            issue_check(&key, "", "tdel", one_coin(), &[1], 10, "pin"),
            Err(CheckError::ChainContextMissing)
        ));
    }

    #[test]
    fn test_malformed_v_is_rejected() {
        let mut check = issued();
        check.v = BigUint::from(5u8);
        assert!(matches!(check.issuer(), Err(CheckError::Malformed(_))));
    }
}
