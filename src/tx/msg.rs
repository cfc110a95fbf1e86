//! Chain messages carried by a transaction
//!
//! Every message is registered with the chain codec under `route/type`.
//! JSON follows the Amino envelope `{"type": .., "value": {..}}` with fields
//! in declaration order; binary fields are numbered in the same order.

use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::amino::{self, u64_string, u64_vec_string, AminoWriter, PUB_KEY_ED25519_NAME};
use super::coin::{biguint_string, is_valid_coin_symbol, Coin, Coins, COIN_EXPONENT};
use super::std_tx::TransactionError;
use crate::crypto::address_to_bytes;

// =============================================================================
// Coin module
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateCoin {
    pub sender: String,
    pub title: String,
    pub symbol: String,
    #[serde(with = "u64_string")]
    pub constant_reserve_ratio: u64,
    #[serde(with = "biguint_string")]
    pub initial_volume: BigUint,
    #[serde(with = "biguint_string")]
    pub initial_reserve: BigUint,
    #[serde(with = "biguint_string")]
    pub limit_volume: BigUint,
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendCoin {
    pub sender: String,
    pub coin: Coin,
    pub receiver: String,
}

/// One leg of a multi-send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Send {
    pub coin: Coin,
    pub receiver: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiSendCoin {
    pub sender: String,
    pub sends: Vec<Send>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBuyCoin {
    pub sender: String,
    pub coin_to_buy: Coin,
    pub max_coin_to_sell: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSellCoin {
    pub sender: String,
    pub coin_to_sell: Coin,
    pub min_coin_to_buy: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSellAllCoin {
    pub sender: String,
    pub coin_to_sell: Coin,
    pub min_coin_to_buy: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRedeemCheck {
    pub sender: String,
    pub check: String,
    pub proof: String,
}

/// Change the supply limit or identity of a coin the sender created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateCoin {
    pub sender: String,
    pub symbol: String,
    #[serde(with = "biguint_string")]
    pub limit_volume: BigUint,
    pub identity: String,
}

// =============================================================================
// Multisig module
// =============================================================================

/// Most owners a multisig wallet may have
pub const MAX_MULTISIG_OWNERS: usize = 16;

/// Largest voting weight of one owner
pub const MAX_OWNER_WEIGHT: u64 = 1024;

/// Create a wallet controlled by weighted owners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateWallet {
    pub sender: String,
    pub owners: Vec<String>,
    #[serde(with = "u64_vec_string")]
    pub weights: Vec<u64>,
    #[serde(with = "u64_string")]
    pub threshold: u64,
}

/// Propose a transfer out of a multisig wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateTransaction {
    pub sender: String,
    pub wallet: String,
    pub receiver: String,
    pub coins: Coins,
}

/// Confirm a pending multisig transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSignTransaction {
    pub sender: String,
    pub tx_id: String,
}

// =============================================================================
// Validator module
// =============================================================================

/// Public profile of a validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub security_contact: String,
    pub details: String,
}

impl Description {
    fn to_amino_bytes(&self) -> Vec<u8> {
        amino::encode_with(|w| {
            w.string(1, &self.moniker);
            w.string(2, &self.identity);
            w.string(3, &self.website);
            w.string(4, &self.security_contact);
            w.string(5, &self.details);
        })
    }
}

/// Ed25519 consensus key of a validator node
///
/// JSON: `{"type":"tendermint/PubKeyEd25519","value":<base64>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusPubKey(pub [u8; 32]);

#[derive(Serialize, Deserialize)]
struct ConsensusPubKeyJson {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

impl Serialize for ConsensusPubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ConsensusPubKeyJson {
            kind: PUB_KEY_ED25519_NAME.to_string(),
            value: B64.encode(self.0),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConsensusPubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = ConsensusPubKeyJson::deserialize(deserializer)?;
        if json.kind != PUB_KEY_ED25519_NAME {
            return Err(de::Error::custom(format!("unexpected key type {:?}", json.kind)));
        }
        let bytes = B64.decode(&json.value).map_err(de::Error::custom)?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| de::Error::custom(format!("{} byte ed25519 key", b.len())))?;
        Ok(Self(key))
    }
}

/// Register a validator with its self-stake
///
/// `commission` is a decimal fraction such as `"0.100000000000000000"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeclareCandidate {
    pub commission: String,
    pub validator_addr: String,
    pub reward_addr: String,
    pub pub_key: ConsensusPubKey,
    pub stake: Coin,
    pub description: Description,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEditCandidate {
    pub validator_address: String,
    pub reward_address: String,
    pub description: Description,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDelegate {
    pub delegator_address: String,
    pub validator_address: String,
    pub coin: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUnbond {
    pub delegator_address: String,
    pub validator_address: String,
    pub coin: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetOnline {
    pub validator_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetOffline {
    pub validator_address: String,
}

// =============================================================================
// Gov module
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub title: String,
    pub description: String,
}

/// Put a text proposal to validators for a block range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitProposal {
    pub content: Content,
    pub proposer: String,
    #[serde(with = "u64_string")]
    pub voting_start_block: u64,
    #[serde(with = "u64_string")]
    pub voting_end_block: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    /// Wire value of the option
    pub fn to_u8(self) -> u8 {
        match self {
            VoteOption::Yes => 1,
            VoteOption::Abstain => 2,
            VoteOption::No => 3,
            VoteOption::NoWithVeto => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    #[serde(with = "u64_string")]
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
}

// =============================================================================
// Msg
// =============================================================================

/// A message understood by the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    #[serde(rename = "coin/create_coin")]
    CreateCoin(MsgCreateCoin),
    #[serde(rename = "coin/send_coin")]
    SendCoin(MsgSendCoin),
    #[serde(rename = "coin/multi_send_coin")]
    MultiSendCoin(MsgMultiSendCoin),
    #[serde(rename = "coin/buy_coin")]
    BuyCoin(MsgBuyCoin),
    #[serde(rename = "coin/sell_coin")]
    SellCoin(MsgSellCoin),
    #[serde(rename = "coin/sell_all_coin")]
    SellAllCoin(MsgSellAllCoin),
    #[serde(rename = "coin/redeem_check")]
    RedeemCheck(MsgRedeemCheck),
    #[serde(rename = "coin/update_coin")]
    UpdateCoin(MsgUpdateCoin),
    #[serde(rename = "multisig/create_wallet")]
    CreateWallet(MsgCreateWallet),
    #[serde(rename = "multisig/create_transaction")]
    CreateTransaction(MsgCreateTransaction),
    #[serde(rename = "multisig/sign_transaction")]
    SignTransaction(MsgSignTransaction),
    #[serde(rename = "validator/declare_candidate")]
    DeclareCandidate(MsgDeclareCandidate),
    #[serde(rename = "validator/edit_candidate")]
    EditCandidate(MsgEditCandidate),
    #[serde(rename = "validator/delegate")]
    Delegate(MsgDelegate),
    #[serde(rename = "validator/unbond")]
    Unbond(MsgUnbond),
    #[serde(rename = "validator/set_online")]
    SetOnline(MsgSetOnline),
    #[serde(rename = "validator/set_offline")]
    SetOffline(MsgSetOffline),
    #[serde(rename = "gov/submit_proposal")]
    SubmitProposal(MsgSubmitProposal),
    #[serde(rename = "gov/vote")]
    Vote(MsgVote),
}

impl Msg {
    /// Plain coin transfer
    pub fn send_coin(sender: impl Into<String>, receiver: impl Into<String>, coin: Coin) -> Self {
        Msg::SendCoin(MsgSendCoin {
            sender: sender.into(),
            coin,
            receiver: receiver.into(),
        })
    }

    /// Module handling the message
    pub fn route(&self) -> &'static str {
        match self {
            Msg::CreateCoin(_)
            | Msg::SendCoin(_)
            | Msg::MultiSendCoin(_)
            | Msg::BuyCoin(_)
            | Msg::SellCoin(_)
            | Msg::SellAllCoin(_)
            | Msg::RedeemCheck(_)
            | Msg::UpdateCoin(_) => "coin",
            Msg::CreateWallet(_) | Msg::CreateTransaction(_) | Msg::SignTransaction(_) => {
                "multisig"
            }
            Msg::DeclareCandidate(_)
            | Msg::EditCandidate(_)
            | Msg::Delegate(_)
            | Msg::Unbond(_)
            | Msg::SetOnline(_)
            | Msg::SetOffline(_) => "validator",
            Msg::SubmitProposal(_) | Msg::Vote(_) => "gov",
        }
    }

    /// Action within the route
    pub fn msg_type(&self) -> &'static str {
        match self {
            Msg::CreateCoin(_) => "create_coin",
            Msg::SendCoin(_) => "send_coin",
            Msg::MultiSendCoin(_) => "multi_send_coin",
            Msg::BuyCoin(_) => "buy_coin",
            Msg::SellCoin(_) => "sell_coin",
            Msg::SellAllCoin(_) => "sell_all_coin",
            Msg::RedeemCheck(_) => "redeem_check",
            Msg::UpdateCoin(_) => "update_coin",
            Msg::CreateWallet(_) => "create_wallet",
            Msg::CreateTransaction(_) => "create_transaction",
            Msg::SignTransaction(_) => "sign_transaction",
            Msg::DeclareCandidate(_) => "declare_candidate",
            Msg::EditCandidate(_) => "edit_candidate",
            Msg::Delegate(_) => "delegate",
            Msg::Unbond(_) => "unbond",
            Msg::SetOnline(_) => "set_online",
            Msg::SetOffline(_) => "set_offline",
            Msg::SubmitProposal(_) => "submit_proposal",
            Msg::Vote(_) => "vote",
        }
    }

    /// Registered codec name, `route/type`
    pub fn amino_name(&self) -> String {
        format!("{}/{}", self.route(), self.msg_type())
    }

    /// Address that must sign the message
    pub fn signer(&self) -> &str {
        match self {
            Msg::CreateCoin(m) => &m.sender,
            Msg::SendCoin(m) => &m.sender,
            Msg::MultiSendCoin(m) => &m.sender,
            Msg::BuyCoin(m) => &m.sender,
            Msg::SellCoin(m) => &m.sender,
            Msg::SellAllCoin(m) => &m.sender,
            Msg::RedeemCheck(m) => &m.sender,
            Msg::UpdateCoin(m) => &m.sender,
            Msg::CreateWallet(m) => &m.sender,
            Msg::CreateTransaction(m) => &m.sender,
            Msg::SignTransaction(m) => &m.sender,
            Msg::DeclareCandidate(m) => &m.validator_addr,
            Msg::EditCandidate(m) => &m.validator_address,
            Msg::Delegate(m) => &m.delegator_address,
            Msg::Unbond(m) => &m.delegator_address,
            Msg::SetOnline(m) => &m.validator_address,
            Msg::SetOffline(m) => &m.validator_address,
            Msg::SubmitProposal(m) => &m.proposer,
            Msg::Vote(m) => &m.voter,
        }
    }

    /// Sorted Amino JSON of the message
    pub fn sign_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(amino::to_sorted_json(self)?)
    }

    /// Stateless checks the chain would reject the message for
    pub fn validate_basic(&self) -> Result<(), TransactionError> {
        check_address(self.signer())?;
        match self {
            Msg::CreateCoin(m) => {
                if !is_valid_coin_symbol(&m.symbol) {
                    return Err(invalid(format!("coin symbol {:?}", m.symbol)));
                }
                if !(10..=100).contains(&m.constant_reserve_ratio) {
                    return Err(invalid(format!(
                        "constant reserve ratio {} outside 10..=100",
                        m.constant_reserve_ratio
                    )));
                }
                if m.initial_volume > m.limit_volume {
                    return Err(invalid("initial volume exceeds limit volume".to_string()));
                }
            }
            Msg::SendCoin(m) => {
                check_address(&m.receiver)?;
                check_positive(&m.coin)?;
            }
            Msg::MultiSendCoin(m) => {
                if m.sends.is_empty() {
                    return Err(invalid("multi-send without sends".to_string()));
                }
                for send in &m.sends {
                    check_address(&send.receiver)?;
                    check_positive(&send.coin)?;
                }
            }
            Msg::BuyCoin(m) => check_positive(&m.coin_to_buy)?,
            Msg::SellCoin(m) => check_positive(&m.coin_to_sell)?,
            Msg::SellAllCoin(_) => {}
            Msg::RedeemCheck(m) => {
                if m.check.is_empty() {
                    return Err(invalid("empty check".to_string()));
                }
            }
            Msg::UpdateCoin(m) => {
                if !is_valid_coin_symbol(&m.symbol) {
                    return Err(invalid(format!("coin symbol {:?}", m.symbol)));
                }
                if m.limit_volume.is_zero() {
                    return Err(invalid("zero limit volume".to_string()));
                }
            }
            Msg::CreateWallet(m) => validate_wallet(m)?,
            Msg::CreateTransaction(m) => {
                check_address(&m.wallet)?;
                check_address(&m.receiver)?;
                if m.coins.is_empty() {
                    return Err(invalid("multisig transaction without coins".to_string()));
                }
                for coin in &m.coins {
                    check_positive(coin)?;
                }
            }
            Msg::SignTransaction(m) => {
                if m.tx_id.is_empty() {
                    return Err(invalid("empty multisig transaction ID".to_string()));
                }
            }
            Msg::DeclareCandidate(m) => {
                check_address(&m.reward_addr)?;
                if commission_units(&m.commission)? > BigUint::from(10u8).pow(COIN_EXPONENT) {
                    return Err(invalid(format!("commission {} above 1", m.commission)));
                }
                check_positive(&m.stake)?;
                if m.description.moniker.is_empty() {
                    return Err(invalid("empty validator moniker".to_string()));
                }
            }
            Msg::EditCandidate(m) => check_address(&m.reward_address)?,
            Msg::Delegate(m) => {
                check_address(&m.validator_address)?;
                check_positive(&m.coin)?;
            }
            Msg::Unbond(m) => {
                check_address(&m.validator_address)?;
                check_positive(&m.coin)?;
            }
            Msg::SetOnline(_) | Msg::SetOffline(_) | Msg::Vote(_) => {}
            Msg::SubmitProposal(m) => {
                if m.content.title.is_empty() {
                    return Err(invalid("empty proposal title".to_string()));
                }
                if m.voting_start_block >= m.voting_end_block {
                    return Err(invalid(format!(
                        "voting blocks {}..{} are empty",
                        m.voting_start_block, m.voting_end_block
                    )));
                }
            }
        }
        Ok(())
    }

    /// Amino binary form as an interface value: type prefix, then the fields
    pub fn to_amino_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        let mut w = AminoWriter::with_prefix(&self.amino_name());
        match self {
            Msg::CreateCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.string(2, &m.title);
                w.string(3, &m.symbol);
                w.uvarint(4, m.constant_reserve_ratio);
                w.string(5, &m.initial_volume.to_str_radix(10));
                w.string(6, &m.initial_reserve.to_str_radix(10));
                w.string(7, &m.limit_volume.to_str_radix(10));
                w.string(8, &m.identity);
            }
            Msg::SendCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.message(2, &m.coin.to_amino_bytes());
                w.bytes(3, &address_to_bytes(&m.receiver)?);
            }
            Msg::MultiSendCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                for send in &m.sends {
                    let mut leg = AminoWriter::new();
                    leg.message(1, &send.coin.to_amino_bytes());
                    leg.bytes(2, &address_to_bytes(&send.receiver)?);
                    w.repeated(2, &leg.into_bytes());
                }
            }
            Msg::BuyCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.message(2, &m.coin_to_buy.to_amino_bytes());
                w.message(3, &m.max_coin_to_sell.to_amino_bytes());
            }
            Msg::SellCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.message(2, &m.coin_to_sell.to_amino_bytes());
                w.message(3, &m.min_coin_to_buy.to_amino_bytes());
            }
            Msg::SellAllCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.message(2, &m.coin_to_sell.to_amino_bytes());
                w.message(3, &m.min_coin_to_buy.to_amino_bytes());
            }
            Msg::RedeemCheck(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.string(2, &m.check);
                w.string(3, &m.proof);
            }
            Msg::UpdateCoin(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.string(2, &m.symbol);
                w.string(3, &m.limit_volume.to_str_radix(10));
                w.string(4, &m.identity);
            }
            Msg::CreateWallet(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                for owner in &m.owners {
                    w.repeated(2, &address_to_bytes(owner)?);
                }
                w.packed_uvarints(3, &m.weights);
                w.uvarint(4, m.threshold);
            }
            Msg::CreateTransaction(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.bytes(2, &address_to_bytes(&m.wallet)?);
                w.bytes(3, &address_to_bytes(&m.receiver)?);
                for coin in &m.coins {
                    w.repeated(4, &coin.to_amino_bytes());
                }
            }
            Msg::SignTransaction(m) => {
                w.bytes(1, &address_to_bytes(&m.sender)?);
                w.string(2, &m.tx_id);
            }
            Msg::DeclareCandidate(m) => {
                w.string(1, &commission_units(&m.commission)?.to_str_radix(10));
                w.bytes(2, &address_to_bytes(&m.validator_addr)?);
                w.bytes(3, &address_to_bytes(&m.reward_addr)?);
                w.message(4, &amino::encode_registered_bytes(PUB_KEY_ED25519_NAME, &m.pub_key.0));
                w.message(5, &m.stake.to_amino_bytes());
                w.message(6, &m.description.to_amino_bytes());
            }
            Msg::EditCandidate(m) => {
                w.bytes(1, &address_to_bytes(&m.validator_address)?);
                w.bytes(2, &address_to_bytes(&m.reward_address)?);
                w.message(3, &m.description.to_amino_bytes());
            }
            Msg::Delegate(m) => {
                w.bytes(1, &address_to_bytes(&m.delegator_address)?);
                w.bytes(2, &address_to_bytes(&m.validator_address)?);
                w.message(3, &m.coin.to_amino_bytes());
            }
            Msg::Unbond(m) => {
                w.bytes(1, &address_to_bytes(&m.delegator_address)?);
                w.bytes(2, &address_to_bytes(&m.validator_address)?);
                w.message(3, &m.coin.to_amino_bytes());
            }
            Msg::SetOnline(m) => w.bytes(1, &address_to_bytes(&m.validator_address)?),
            Msg::SetOffline(m) => w.bytes(1, &address_to_bytes(&m.validator_address)?),
            Msg::SubmitProposal(m) => {
                w.message(
                    1,
                    &amino::encode_with(|c| {
                        c.string(1, &m.content.title);
                        c.string(2, &m.content.description);
                    }),
                );
                w.bytes(2, &address_to_bytes(&m.proposer)?);
                w.uvarint(3, m.voting_start_block);
                w.uvarint(4, m.voting_end_block);
            }
            Msg::Vote(m) => {
                w.uvarint(1, m.proposal_id);
                w.bytes(2, &address_to_bytes(&m.voter)?);
                w.uvarint(3, u64::from(m.option.to_u8()));
            }
        }
        Ok(w.into_bytes())
    }
}

fn invalid(reason: String) -> TransactionError {
    TransactionError::InvalidMessage(reason)
}

fn check_address(address: &str) -> Result<(), TransactionError> {
    address_to_bytes(address)?;
    Ok(())
}

fn validate_wallet(m: &MsgCreateWallet) -> Result<(), TransactionError> {
    if !(2..=MAX_MULTISIG_OWNERS).contains(&m.owners.len()) {
        return Err(invalid(format!(
            "{} owners, expected 2 to {}",
            m.owners.len(),
            MAX_MULTISIG_OWNERS
        )));
    }
    if m.weights.len() != m.owners.len() {
        return Err(invalid(format!(
            "{} weights for {} owners",
            m.weights.len(),
            m.owners.len()
        )));
    }
    let mut seen = HashSet::new();
    for owner in &m.owners {
        if !seen.insert(address_to_bytes(owner)?) {
            return Err(invalid(format!("duplicate owner {owner}")));
        }
    }
    if let Some(weight) = m.weights.iter().find(|w| !(1..=MAX_OWNER_WEIGHT).contains(*w)) {
        return Err(invalid(format!("owner weight {weight} outside 1..={MAX_OWNER_WEIGHT}")));
    }
    let total: u64 = m.weights.iter().sum();
    if m.threshold == 0 || m.threshold > total {
        return Err(invalid(format!(
            "threshold {} outside 1..={}",
            m.threshold, total
        )));
    }
    Ok(())
}

/// Decimal fraction scaled to 18 places, the chain's fixed-point form
fn commission_units(commission: &str) -> Result<BigUint, TransactionError> {
    let bad = || invalid(format!("commission {commission:?}"));
    let (whole, fraction) = commission.split_once('.').unwrap_or((commission, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
        return Err(bad());
    }
    if fraction.len() > COIN_EXPONENT as usize {
        return Err(bad());
    }
    let padded = format!("{whole}{fraction:0<width$}", width = COIN_EXPONENT as usize);
    BigUint::parse_bytes(padded.as_bytes(), 10).ok_or_else(bad)
}

fn check_positive(coin: &Coin) -> Result<(), TransactionError> {
    if coin.amount.is_zero() {
        return Err(invalid(format!("zero amount of {}", coin.denom)));
    }
    Ok(())
}

/// Valid sample messages for the coin update, multisig, validator and gov routes
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::crypto::encode_address;

    pub const SENDER: &str = "dx10e0525sfrf53yh2aljmm3sn9jq5njk7lzeq5jy";
    pub const RECEIVER: &str = "dx1npvwllfr9dqr8erajqqr6s0vxnk2ak550f7ed0";

    pub fn validator() -> String {
        encode_address("dxvaloper", &address_to_bytes(SENDER).unwrap()).unwrap()
    }

    pub fn update_coin() -> Msg {
        Msg::UpdateCoin(MsgUpdateCoin {
            sender: SENDER.to_string(),
            symbol: "test".to_string(),
            limit_volume: BigUint::from(1_000u32),
            identity: "id".to_string(),
        })
    }

    pub fn create_wallet() -> MsgCreateWallet {
        MsgCreateWallet {
            sender: SENDER.to_string(),
            owners: vec![SENDER.to_string(), RECEIVER.to_string()],
            weights: vec![1, 300],
            threshold: 2,
        }
    }

    pub fn create_transaction() -> Msg {
        Msg::CreateTransaction(MsgCreateTransaction {
            sender: SENDER.to_string(),
            wallet: RECEIVER.to_string(),
            receiver: SENDER.to_string(),
            coins: vec![Coin::new("tdel", 5u32)],
        })
    }

    pub fn sign_transaction() -> Msg {
        Msg::SignTransaction(MsgSignTransaction {
            sender: SENDER.to_string(),
            tx_id: "dxmstx1abc".to_string(),
        })
    }

    pub fn declare_candidate() -> MsgDeclareCandidate {
        MsgDeclareCandidate {
            commission: "0.1".to_string(),
            validator_addr: validator(),
            reward_addr: SENDER.to_string(),
            pub_key: ConsensusPubKey([7u8; 32]),
            stake: Coin::new("tdel", 100u32),
            description: Description {
                moniker: "node".to_string(),
                ..Description::default()
            },
        }
    }

    pub fn edit_candidate() -> Msg {
        Msg::EditCandidate(MsgEditCandidate {
            validator_address: validator(),
            reward_address: RECEIVER.to_string(),
            description: Description::default(),
        })
    }

    pub fn submit_proposal() -> MsgSubmitProposal {
        MsgSubmitProposal {
            content: Content {
                title: "Upgrade".to_string(),
                description: "Move to v2".to_string(),
            },
            proposer: validator(),
            voting_start_block: 100,
            voting_end_block: 200,
        }
    }

    pub fn vote() -> Msg {
        Msg::Vote(MsgVote {
            proposal_id: 3,
            voter: validator(),
            option: VoteOption::No,
        })
    }

    pub fn all() -> Vec<Msg> {
        vec![
            update_coin(),
            Msg::CreateWallet(create_wallet()),
            create_transaction(),
            sign_transaction(),
            Msg::DeclareCandidate(declare_candidate()),
            edit_candidate(),
            Msg::SubmitProposal(submit_proposal()),
            vote(),
        ]
    }
}
