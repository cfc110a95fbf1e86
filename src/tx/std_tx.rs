//! Standard transactions (`cosmos-sdk/StdTx`)
//!
//! A `StdTx` carries messages, a fee, the signatures collected so far and
//! a memo. What each signer actually signs is [`std_sign_bytes`]: the
//! sorted JSON of the chain ID, the signer's account number and sequence,
//! the fee, the messages and the memo.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::amino::{self, u64_string, AminoWriter, PUB_KEY_SECP256K1_NAME, STD_TX_NAME};
use super::coin::Coins;
use super::msg::Msg;
use crate::crypto::{verify_message, KeyError, PublicKey};

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Chain context missing: {0} is not set")]
    ChainContextMissing(&'static str),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("No signature at index {0}")]
    NoSuchSignature(usize),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),
}

// =============================================================================
// Fee
// =============================================================================

/// Fee paid for a transaction: coins plus the gas limit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Coins,
    #[serde(with = "u64_string")]
    pub gas: u64,
}

impl StdFee {
    pub fn new(gas: u64, amount: Coins) -> Self {
        Self { amount, gas }
    }

    fn to_amino_bytes(&self) -> Vec<u8> {
        amino::encode_with(|w| {
            for coin in &self.amount {
                w.repeated(1, &coin.to_amino_bytes());
            }
            w.uvarint(2, self.gas);
        })
    }
}

// =============================================================================
// Signature
// =============================================================================

/// A signer's public key and its signature over the sign bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdSignature {
    pub pub_key: PublicKey,
    /// Compact `R || S`
    pub signature: Vec<u8>,
}

impl StdSignature {
    fn to_amino_bytes(&self) -> Vec<u8> {
        amino::encode_with(|w| {
            w.message(1, &amino::encode_public_key(&self.pub_key));
            w.bytes(2, &self.signature);
        })
    }

    fn to_json(&self) -> SignatureJson {
        SignatureJson {
            pub_key: Envelope {
                kind: PUB_KEY_SECP256K1_NAME,
                value: B64.encode(self.pub_key.to_compressed()),
            },
            signature: B64.encode(&self.signature),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// How a node should handle a broadcast transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BroadcastMode {
    #[default]
    Sync,
    Async,
    Block,
}

impl BroadcastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastMode::Sync => "sync",
            BroadcastMode::Async => "async",
            BroadcastMode::Block => "block",
        }
    }
}

/// An unsigned or (partially) signed standard transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdTx {
    pub msgs: Vec<Msg>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    pub memo: String,
}

impl StdTx {
    /// Assemble an unsigned transaction
    pub fn new(msgs: Vec<Msg>, fee: StdFee, memo: impl Into<String>) -> Self {
        Self {
            msgs,
            fee,
            signatures: Vec::new(),
            memo: memo.into(),
        }
    }

    /// Bytes a signer with the given account number and sequence must sign
    pub fn sign_bytes(
        &self,
        chain_id: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<Vec<u8>, TransactionError> {
        std_sign_bytes(chain_id, account_number, sequence, &self.fee, &self.msgs, &self.memo)
    }

    /// Append a signature; earlier signatures are kept
    pub fn add_signature(&mut self, signature: StdSignature) {
        self.signatures.push(signature);
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Check signature `index` against the sign bytes for the given signer context
    pub fn verify_signature(
        &self,
        index: usize,
        chain_id: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<bool, TransactionError> {
        let signature = self
            .signatures
            .get(index)
            .ok_or(TransactionError::NoSuchSignature(index))?;
        let sign_bytes = self.sign_bytes(chain_id, account_number, sequence)?;
        Ok(verify_message(&signature.pub_key, &sign_bytes, &signature.signature)?)
    }

    /// Amino JSON: `{"type":"cosmos-sdk/StdTx","value":{...}}`
    pub fn to_json(&self) -> Result<String, TransactionError> {
        let envelope = Envelope {
            kind: STD_TX_NAME,
            value: self.json_value(),
        };
        Ok(amino::escape_html(&serde_json::to_string(&envelope)?))
    }

    /// Body accepted by the node's `txs` endpoint: `{"tx":{...},"mode":"sync"}`
    pub fn to_broadcast_json(&self, mode: BroadcastMode) -> Result<String, TransactionError> {
        let body = BroadcastBody {
            tx: self.json_value(),
            mode: mode.as_str(),
        };
        Ok(amino::escape_html(&serde_json::to_string(&body)?))
    }

    /// Length-prefixed Amino binary form
    pub fn to_binary(&self) -> Result<Vec<u8>, TransactionError> {
        let mut w = AminoWriter::with_prefix(STD_TX_NAME);
        for msg in &self.msgs {
            w.repeated(1, &msg.to_amino_bytes()?);
        }
        w.message(2, &self.fee.to_amino_bytes());
        for signature in &self.signatures {
            w.repeated(3, &signature.to_amino_bytes());
        }
        w.string(4, &self.memo);
        Ok(amino::length_prefixed(&w.into_bytes()))
    }

    fn json_value(&self) -> StdTxJson<'_> {
        StdTxJson {
            msg: &self.msgs,
            fee: &self.fee,
            signatures: self
                .is_signed()
                .then(|| self.signatures.iter().map(StdSignature::to_json).collect()),
            memo: &self.memo,
        }
    }
}

/// Canonical sign bytes of a transaction for one signer
///
/// Sorted JSON of `account_number`, `chain_id`, `fee`, `memo`, `msgs` and
/// `sequence`, with integers as decimal strings.
pub fn std_sign_bytes(
    chain_id: &str,
    account_number: u64,
    sequence: u64,
    fee: &StdFee,
    msgs: &[Msg],
    memo: &str,
) -> Result<Vec<u8>, TransactionError> {
    let doc = json!({
        "account_number": account_number.to_string(),
        "chain_id": chain_id,
        "fee": serde_json::to_value(fee)?,
        "memo": memo,
        "msgs": serde_json::to_value(msgs)?,
        "sequence": sequence.to_string(),
    });
    Ok(amino::to_sorted_json(&doc)?)
}

// =============================================================================
// JSON shapes
// =============================================================================

#[derive(Serialize)]
struct Envelope<T> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: T,
}

#[derive(Serialize)]
struct SignatureJson {
    pub_key: Envelope<String>,
    signature: String,
}

#[derive(Serialize)]
struct StdTxJson<'a> {
    msg: &'a [Msg],
    fee: &'a StdFee,
    /// `null` until the first signature, as Go renders a nil slice
    signatures: Option<Vec<SignatureJson>>,
    memo: &'a str,
}

#[derive(Serialize)]
struct BroadcastBody<'a> {
    tx: StdTxJson<'a>,
    mode: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_message, PrivateKey};
    use crate::tx::Coin;

    const SENDER: &str = "dx10e0525sfrf53yh2aljmm3sn9jq5njk7lzeq5jy";
    const RECEIVER: &str = "dx1npvwllfr9dqr8erajqqr6s0vxnk2ak550f7ed0";

    fn sample_tx(memo: &str) -> StdTx {
        let msg = Msg::send_coin(SENDER, RECEIVER, Coin::new("tdel", 1u32));
        StdTx::new(vec![msg], StdFee::new(16384, Vec::new()), memo)
    }

    fn signer() -> PrivateKey {
        PrivateKey::from_hex("0000000000000000000000000000000000000000000000000000000000000001")
            .unwrap()
    }

    fn signed_tx(memo: &str) -> StdTx {
        let key = signer();
        let mut tx = sample_tx(memo);
        let sign_bytes = tx.sign_bytes("decimal-testnet", 7, 3).unwrap();
        tx.add_signature(StdSignature {
            pub_key: *key.public_key(),
            signature: sign_message(&key, &sign_bytes).to_vec(),
        });
        tx
    }

    #[test]
    fn test_sign_bytes_layout() {
        let sign_bytes = String::from_utf8(
            sample_tx("hi").sign_bytes("decimal-testnet", 7, 3).unwrap(),
        )
        .unwrap();
        assert_eq!(
            sign_bytes,
            format!(
                concat!(
                    r#"{{"account_number":"7","chain_id":"decimal-testnet","#,
                    r#""fee":{{"amount":[],"gas":"16384"}},"memo":"hi","#,
                    r#""msgs":[{{"type":"coin/send_coin","value":{{"coin":{{"amount":"1","denom":"tdel"}},"#,
                    r#""receiver":"{}","sender":"{}"}}}}],"sequence":"3"}}"#
                ),
                RECEIVER, SENDER
            )
        );
    }

    #[test]
    fn test_sign_bytes_escape_html() {
        let sign_bytes = sample_tx("<a&b>").sign_bytes("chain", 0, 0).unwrap();
        let text = String::from_utf8(sign_bytes).unwrap();
        assert!(text.contains(r#""memo":"\u003ca\u0026b\u003e""#));
    }

    #[test]
    fn test_sign_bytes_escape_backspace_and_form_feed() {
        let sign_bytes = sample_tx("a\u{8}b\u{c}c").sign_bytes("chain", 0, 0).unwrap();
        let text = String::from_utf8(sign_bytes).unwrap();
        assert!(text.contains(r#""memo":"a\u0008b\u000cc""#));
    }

    #[test]
    fn test_verify_signature() {
        let tx = signed_tx("memo");
        assert!(tx.verify_signature(0, "decimal-testnet", 7, 3).unwrap());
        assert!(!tx.verify_signature(0, "decimal-testnet", 7, 4).unwrap());
        assert!(!tx.verify_signature(0, "decimal-testnet", 8, 3).unwrap());
        assert!(!tx.verify_signature(0, "other-chain", 7, 3).unwrap());
        assert!(matches!(
            tx.verify_signature(1, "decimal-testnet", 7, 3),
            Err(TransactionError::NoSuchSignature(1))
        ));
    }

    #[test]
    fn test_mutated_fields_invalidate_signature() {
        let mut tx = signed_tx("memo");
        tx.memo = "other memo".to_string();
        assert!(!tx.verify_signature(0, "decimal-testnet", 7, 3).unwrap());

        let mut tx = signed_tx("memo");
        tx.fee.gas += 1;
        assert!(!tx.verify_signature(0, "decimal-testnet", 7, 3).unwrap());
    }

    #[test]
    fn test_json_envelope() {
        let tx = signed_tx("memo");
        let json = tx.to_json().unwrap();
        assert!(json.starts_with(
            r#"{"type":"cosmos-sdk/StdTx","value":{"msg":[{"type":"coin/send_coin","value":{"sender":"#
        ));
        assert!(json.contains(r#""fee":{"amount":[],"gas":"16384"},"signatures":[{"pub_key":{"type":"tendermint/PubKeySecp256k1","value":"Anm+Zn753LusVaBilc6HCwcCm/zbLc4o2VnygVsW+BeY"},"signature":""#));
        assert!(json.ends_with(r#""}],"memo":"memo"}}"#));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed["value"]["signatures"][0]["signature"].as_str().map(|s| B64.decode(s).unwrap().len()),
            Some(64)
        );
    }

    #[test]
    fn test_broadcast_json() {
        let tx = signed_tx("memo");
        let body = tx.to_broadcast_json(BroadcastMode::Sync).unwrap();
        let envelope = tx.to_json().unwrap();
        let value = &envelope[r#"{"type":"cosmos-sdk/StdTx","value":"#.len()..envelope.len() - 1];
        assert_eq!(body, format!(r#"{{"tx":{value},"mode":"sync"}}"#));
    }

    #[test]
    fn test_unsigned_json_has_null_signatures() {
        let json = sample_tx("").to_json().unwrap();
        assert!(json.ends_with(r#""signatures":null,"memo":""}}"#));
    }

    #[test]
    fn test_binary_layout() {
        let tx = signed_tx("memo");
        let binary = tx.to_binary().unwrap();

        let mut cursor = 0usize;
        let mut length = 0u64;
        let mut shift = 0;
        loop {
            let byte = binary[cursor];
            cursor += 1;
            length |= u64::from(byte & 0x7f) << shift;
            shift += 7;
            if byte < 0x80 {
                break;
            }
        }
        assert_eq!(binary.len() - cursor, length as usize);
        assert_eq!(&binary[cursor..cursor + 4], &[0x28, 0x28, 0x16, 0xa9]);
        assert!(binary.ends_with(&[0x22, 4, b'm', b'e', b'm', b'o']));

        let key = signer().public_key().to_compressed();
        let mut pub_key_field = vec![0x0a, 38, 0xeb, 0x5a, 0xe9, 0x87, 0x21];
        pub_key_field.extend_from_slice(&key);
        assert!(binary
            .windows(pub_key_field.len())
            .any(|window| window == pub_key_field.as_slice()));
    }

    #[test]
    fn test_multiple_signers_sign_independently() {
        let mut tx = signed_tx("memo");
        let second = PrivateKey::from_bytes(&[2u8; 32]).unwrap();
        let sign_bytes = tx.sign_bytes("decimal-testnet", 11, 0).unwrap();
        tx.add_signature(StdSignature {
            pub_key: *second.public_key(),
            signature: sign_message(&second, &sign_bytes).to_vec(),
        });

        assert!(tx.verify_signature(0, "decimal-testnet", 7, 3).unwrap());
        assert!(tx.verify_signature(1, "decimal-testnet", 11, 0).unwrap());
    }
}
