//! Amino wire primitives
//!
//! The chain speaks the legacy Amino codec of the Cosmos SDK:
//! - binary: protobuf-like field keys (`field << 3 | typ3`), uvarint
//!   lengths, and a 4-byte type prefix in front of every registered type
//!   reached through an interface
//! - JSON: `{"type": <registered name>, "value": ...}` envelopes; sign bytes
//!   are the same JSON with object keys sorted and HTML characters escaped
//!
//! Binary fields holding a default value (empty string, empty bytes, zero
//! integer, empty struct) are omitted, as the Go codec does.

use serde::Serialize;

use crate::crypto::{sha256, PublicKey};

/// Registered name of secp256k1 public keys
pub const PUB_KEY_SECP256K1_NAME: &str = "tendermint/PubKeySecp256k1";

/// Registered name of ed25519 consensus keys
pub const PUB_KEY_ED25519_NAME: &str = "tendermint/PubKeyEd25519";

/// Registered name of standard transactions
pub const STD_TX_NAME: &str = "cosmos-sdk/StdTx";

const TYP3_VARINT: u8 = 0;
const TYP3_BYTE_LENGTH: u8 = 2;

// =============================================================================
// Type prefixes
// =============================================================================

/// Four-byte prefix of a registered type name
///
/// `sha256(name)`, leading zero bytes dropped, three disambiguation bytes
/// skipped, leading zero bytes dropped again, then the next four bytes.
pub fn type_prefix(name: &str) -> [u8; 4] {
    let hash = sha256(name.as_bytes());
    let rest = hash
        .iter()
        .skip_while(|b| **b == 0)
        .skip(3)
        .skip_while(|b| **b == 0);

    let mut prefix = [0u8; 4];
    for (slot, byte) in prefix.iter_mut().zip(rest) {
        *slot = *byte;
    }
    prefix
}

// =============================================================================
// Binary encoding
// =============================================================================

/// Append an unsigned LEB128 varint
pub fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Prefix `bytes` with their uvarint length
pub fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 4);
    put_uvarint(&mut out, bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Run `f` against a fresh writer and return the bytes it produced
pub fn encode_with(f: impl FnOnce(&mut AminoWriter)) -> Vec<u8> {
    let mut writer = AminoWriter::new();
    f(&mut writer);
    writer.into_bytes()
}

/// Writer for the fields of one Amino struct
#[derive(Debug, Default)]
pub struct AminoWriter {
    buf: Vec<u8>,
}

impl AminoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a registered type's prefix (bare concrete encoding)
    pub fn with_prefix(name: &str) -> Self {
        Self {
            buf: type_prefix(name).to_vec(),
        }
    }

    fn key(&mut self, field: u32, typ3: u8) {
        put_uvarint(&mut self.buf, (u64::from(field) << 3) | u64::from(typ3));
    }

    fn length_delimited(&mut self, field: u32, bytes: &[u8]) {
        self.key(field, TYP3_BYTE_LENGTH);
        put_uvarint(&mut self.buf, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn uvarint(&mut self, field: u32, value: u64) {
        if value != 0 {
            self.key(field, TYP3_VARINT);
            put_uvarint(&mut self.buf, value);
        }
    }

    pub fn bytes(&mut self, field: u32, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.length_delimited(field, bytes);
        }
    }

    pub fn string(&mut self, field: u32, value: &str) {
        self.bytes(field, value.as_bytes());
    }

    /// Embedded struct or interface value, omitted when empty
    pub fn message(&mut self, field: u32, encoded: &[u8]) {
        self.bytes(field, encoded);
    }

    /// One element of a repeated struct or interface field, always written
    pub fn repeated(&mut self, field: u32, encoded: &[u8]) {
        self.length_delimited(field, encoded);
    }

    /// Repeated integers, packed into one length-delimited field
    pub fn packed_uvarints(&mut self, field: u32, values: &[u64]) {
        let mut packed = Vec::new();
        for value in values {
            put_uvarint(&mut packed, *value);
        }
        self.bytes(field, &packed);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Public key as an interface value: prefix, then the 33 bytes length-prefixed
pub fn encode_public_key(public_key: &PublicKey) -> Vec<u8> {
    encode_registered_bytes(PUB_KEY_SECP256K1_NAME, &public_key.to_compressed())
}

/// A registered byte-array type: its prefix, then the bytes length-prefixed
pub fn encode_registered_bytes(name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut out = type_prefix(name).to_vec();
    out.extend_from_slice(&length_prefixed(bytes));
    out
}

// =============================================================================
// JSON encoding
// =============================================================================

/// Serialize with object keys sorted at every level and strings escaped
/// the way Go's `encoding/json` escapes them before Go 1.22
pub fn to_sorted_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    // serde_json::Value keeps objects in a BTreeMap, so keys come out sorted
    let sorted = serde_json::to_value(value)?;
    Ok(escape_html(&serde_json::to_string(&sorted)?).into_bytes())
}

/// Rewrite serde_json string escapes into Go's forms
///
/// `<`, `>`, `&`, U+2028 and U+2029 become `\uXXXX` escapes, and the short
/// `\b` and `\f` escapes become `\u0008` and `\u000c`. None of these
/// characters appear in JSON syntax outside strings.
pub fn escape_html(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars();
    while let Some(c) = chars.next() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\\' => match chars.next() {
                Some('b') => out.push_str("\\u0008"),
                Some('f') => out.push_str("\\u000c"),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

/// Serde adapter rendering 64-bit integers as decimal strings (Amino JSON)
pub(crate) mod u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter rendering a list of 64-bit integers as decimal strings
pub(crate) mod u64_vec_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(u64::to_string))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| s.parse().map_err(de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_type_prefixes() {
        let cases = [
            ("tendermint/PubKeySecp256k1", "eb5ae987"),
            ("cosmos-sdk/StdTx", "282816a9"),
            ("coin/send_coin", "0e61a2e8"),
            ("coin/multi_send_coin", "c2a36c1f"),
            ("coin/create_coin", "3f0038b4"),
            ("coin/redeem_check", "13285e5c"),
            ("validator/delegate", "01460aa4"),
            ("validator/set_offline", "51f5833b"),
            ("tendermint/PubKeyEd25519", "1624de64"),
        ];
        for (name, expected) in cases {
            assert_eq!(hex::encode(type_prefix(name)), expected, "{name}");
        }
    }

    #[test]
    fn test_uvarint() {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, 0);
        put_uvarint(&mut buf, 127);
        put_uvarint(&mut buf, 300);
        assert_eq!(buf, vec![0x00, 0x7f, 0xac, 0x02]);
    }

    #[test]
    fn test_default_fields_are_omitted() {
        let bytes = encode_with(|w| {
            w.string(1, "");
            w.uvarint(2, 0);
            w.message(3, &[]);
            w.uvarint(4, 16384);
            w.repeated(5, &[]);
        });
        assert_eq!(bytes, vec![0x20, 0x80, 0x80, 0x01, 0x2a, 0x00]);
    }

    #[test]
    fn test_packed_uvarints() {
        let bytes = encode_with(|w| {
            w.packed_uvarints(1, &[1, 300]);
            w.packed_uvarints(2, &[]);
        });
        assert_eq!(bytes, vec![0x0a, 3, 0x01, 0xac, 0x02]);
    }

    #[test]
    fn test_public_key_encoding() {
        let key = crate::crypto::PrivateKey::from_bytes(&[1u8; 32]).unwrap();
        let encoded = encode_public_key(key.public_key());
        assert_eq!(&encoded[..5], &[0xeb, 0x5a, 0xe9, 0x87, 0x21]);
        assert_eq!(encoded.len(), 38);
    }

    #[test]
    fn test_sorted_json_escapes_html() {
        let value = serde_json::json!({"b": "<a&b>", "a": {"z": 1, "y": [2]}});
        let json = String::from_utf8(to_sorted_json(&value).unwrap()).unwrap();
        assert_eq!(json, r#"{"a":{"y":[2],"z":1},"b":"\u003ca\u0026b\u003e"}"#);
    }

    #[test]
    fn test_control_escapes_use_go_form() {
        let value = serde_json::json!({"memo": "a\u{8}b\u{c}c\\b\n"});
        let json = String::from_utf8(to_sorted_json(&value).unwrap()).unwrap();
        assert_eq!(json, r#"{"memo":"a\u0008b\u000cc\\b\n"}"#);
    }
}
