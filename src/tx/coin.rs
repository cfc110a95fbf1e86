//! Coin amounts
//!
//! Amounts are arbitrary-precision unsigned integers counted in the smallest
//! unit (1 coin = 10^18 units). On the wire they travel as decimal strings.

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::amino::{self, AminoWriter};

/// Units per whole coin
pub const COIN_EXPONENT: u32 = 18;

/// A denomination paired with an amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "biguint_string")]
    pub amount: BigUint,
}

/// An ordered list of coins
pub type Coins = Vec<Coin>;

/// Whether `symbol` is a valid coin symbol: 3 to 10 ASCII letters or digits,
/// starting with a letter
pub fn is_valid_coin_symbol(symbol: &str) -> bool {
    (3..=10).contains(&symbol.len())
        && symbol.bytes().all(|b| b.is_ascii_alphanumeric())
        && symbol.as_bytes()[0].is_ascii_alphabetic()
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<BigUint>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    /// A coin worth `whole` full coins (`whole * 10^18` units)
    pub fn whole(denom: impl Into<String>, whole: u64) -> Self {
        Self::new(denom, BigUint::from(whole) * BigUint::from(10u8).pow(COIN_EXPONENT))
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Amino binary body: denom (1), amount as decimal string (2)
    pub(crate) fn encode_amino(&self, writer: &mut AminoWriter) {
        writer.string(1, &self.denom);
        writer.string(2, &self.amount.to_str_radix(10));
    }

    pub(crate) fn to_amino_bytes(&self) -> Vec<u8> {
        amino::encode_with(|w| self.encode_amino(w))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Serde adapter rendering a `BigUint` as a decimal string
pub(crate) mod biguint_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| de::Error::custom(format!("invalid integer {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_coin_scaling() {
        let coin = Coin::whole("tdel", 3);
        assert_eq!(coin.amount.to_string(), "3000000000000000000");
        assert_eq!(coin.to_string(), "3000000000000000000tdel");
    }

    #[test]
    fn test_coin_symbol_rules() {
        assert!(is_valid_coin_symbol("del"));
        assert!(is_valid_coin_symbol("tdel"));
        assert!(is_valid_coin_symbol("COIN2024X"));
        assert!(!is_valid_coin_symbol("ab"));
        assert!(!is_valid_coin_symbol("abcdefghijk"));
        assert!(!is_valid_coin_symbol("1abc"));
        assert!(!is_valid_coin_symbol("ab-c"));
        assert!(!is_valid_coin_symbol(""));
    }

    #[test]
    fn test_json_amount_is_string() {
        let coin = Coin::new("tdel", 42u32);
        let json = serde_json::to_string(&coin).unwrap();
        assert_eq!(json, r#"{"denom":"tdel","amount":"42"}"#);
        let parsed: Coin = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, coin);
        assert!(serde_json::from_str::<Coin>(r#"{"denom":"tdel","amount":"-1"}"#).is_err());
    }

    #[test]
    fn test_amino_encoding() {
        let coin = Coin::new("del", 5u32);
        assert_eq!(
            coin.to_amino_bytes(),
            vec![0x0a, 3, b'd', b'e', b'l', 0x12, 1, b'5']
        );
    }
}
