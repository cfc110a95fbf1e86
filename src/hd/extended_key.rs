//! BIP32 hierarchical deterministic extended keys
//!
//! An extended key pairs a secp256k1 key with a 32-byte chain code. The
//! master key comes from `HMAC-SHA512("Bitcoin seed", seed)`; every child is
//! derived from its parent with another HMAC-SHA512 keyed by the parent's
//! chain code. Hardened children (index >= 2^31) need the parent's private
//! key, normal children can be derived from the public half alone.

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use secp256k1::{Scalar, Secp256k1, SecretKey};
use zeroize::Zeroize;

use super::error::HdError;
use super::path::{ChildIndex, DerivationPath, HARDENED_OFFSET};
use crate::crypto::{double_sha256, hash160, hmac_sha512, PrivateKey, PublicKey};

/// HMAC key used for master key generation
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Shortest seed accepted for master key generation
pub const MIN_SEED_LEN: usize = 16;

/// Longest seed accepted for master key generation
pub const MAX_SEED_LEN: usize = 64;

/// Mainnet `xprv` version bytes
const PRIVATE_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];

/// Mainnet `xpub` version bytes
const PUBLIC_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

/// Serialized extended key length before the checksum
const SERIALIZED_LEN: usize = 78;

#[derive(Clone)]
enum KeyMaterial {
    Private(PrivateKey),
    Public(PublicKey),
}

/// A BIP32 extended key, private or public
///
/// Extended keys are values: deriving a child or neutering always returns a
/// new key and never changes the receiver.
#[derive(Clone)]
pub struct ExtendedKey {
    key: KeyMaterial,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
    is_master: bool,
}

impl ExtendedKey {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Generate the master private key from a BIP39 seed
    pub fn master_from_seed(seed: &[u8]) -> Result<Self, HdError> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(HdError::InvalidSeedLength(seed.len()));
        }
        let digest = hmac_sha512(MASTER_HMAC_KEY, seed);
        let secret_key = SecretKey::from_slice(&digest[..32]).map_err(|_| HdError::UnusableSeed)?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        Ok(Self {
            key: KeyMaterial::Private(PrivateKey::from_secret_key(secret_key)),
            chain_code,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: 0,
            is_master: true,
        })
    }

    /// Parse a Base58Check `xprv`/`xpub` string
    pub fn from_base58(encoded: &str) -> Result<Self, HdError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| HdError::InvalidExtendedKey(e.to_string()))?;
        if bytes.len() != SERIALIZED_LEN + 4 {
            return Err(HdError::InvalidExtendedKey(format!(
                "{} bytes, expected {}",
                bytes.len(),
                SERIALIZED_LEN + 4
            )));
        }
        let (payload, checksum) = bytes.split_at(SERIALIZED_LEN);
        if double_sha256(payload)[..4] != *checksum {
            return Err(HdError::InvalidExtendedKey("checksum mismatch".to_string()));
        }

        let depth = payload[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&payload[5..9]);
        let mut child_number = [0u8; 4];
        child_number.copy_from_slice(&payload[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let key_data = &payload[45..];
        let mut version = [0u8; 4];
        version.copy_from_slice(&payload[..4]);

        let key = match version {
            PRIVATE_VERSION => {
                if key_data[0] != 0 {
                    return Err(HdError::InvalidExtendedKey(
                        "private key data must start with 0x00".to_string(),
                    ));
                }
                KeyMaterial::Private(PrivateKey::from_bytes(&key_data[1..])?)
            }
            PUBLIC_VERSION => KeyMaterial::Public(PublicKey::from_bytes(key_data)?),
            _ => return Err(HdError::InvalidExtendedKey("unknown version bytes".to_string())),
        };

        Ok(Self {
            key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number: u32::from_be_bytes(child_number),
            is_master: depth == 0 && parent_fingerprint == [0; 4],
        })
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Derive a single child; `index` must be below 2^31
    pub fn child(&self, index: u32, hardened: bool) -> Result<Self, HdError> {
        self.derive_child(ChildIndex::new(index, hardened)?)
    }

    /// Derive the key at a textual path such as `m/44'/60'/0'/0/0`
    pub fn derive_path(&self, path: &str) -> Result<Self, HdError> {
        self.derive(&path.parse::<DerivationPath>()?)
    }

    /// Derive the key at a parsed path
    ///
    /// Absolute paths (`m/...`) are only accepted on a master key; relative
    /// paths are applied to `self`.
    pub fn derive(&self, path: &DerivationPath) -> Result<Self, HdError> {
        if path.is_from_master() && !self.is_master {
            return Err(HdError::RequiresMasterKey(path.to_string()));
        }
        let mut key = self.clone();
        for step in path.steps() {
            key = key.derive_child(*step)?;
        }
        debug!("Derived extended key at depth {} via {}", key.depth, path);
        Ok(key)
    }

    /// Root of an account's external chain: `m/44'/60'/{account}'/0`
    pub fn account_root(&self, account: u32) -> Result<Self, HdError> {
        self.derive_path(&format!("m/44'/60'/{account}'/0"))
    }

    fn derive_child(&self, step: ChildIndex) -> Result<Self, HdError> {
        if step.is_hardened() && !self.is_private() {
            return Err(HdError::HardenedRequiresPrivateKey);
        }
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| HdError::InvalidExtendedKey("maximum depth reached".to_string()))?;

        let mut step = step;
        loop {
            let digest = hmac_sha512(&self.chain_code, &self.child_hmac_data(step));
            if let Some(child) = self.child_from_hmac(step, depth, &digest)? {
                return Ok(child);
            }

            // Invalid child: BIP32 moves on to the next index in the same half
            warn!("BIP32 child {} is invalid, trying the next index", step);
            let next = step.index() + 1;
            if next >= HARDENED_OFFSET {
                return Err(HdError::DerivationExhausted(step.to_u32()));
            }
            step = ChildIndex::new(next, step.is_hardened())?;
        }
    }

    /// HMAC input: `0x00 || k || ser32(i)` when hardened, `serP(K) || ser32(i)` otherwise
    fn child_hmac_data(&self, step: ChildIndex) -> Vec<u8> {
        let mut data = Vec::with_capacity(37);
        match (&self.key, step.is_hardened()) {
            (KeyMaterial::Private(private_key), true) => {
                data.push(0);
                data.extend_from_slice(&private_key.to_bytes());
            }
            _ => data.extend_from_slice(&self.to_public_key().to_compressed()),
        }
        data.extend_from_slice(&step.to_u32().to_be_bytes());
        data
    }

    /// Build the child from the HMAC output, or `None` when `IL >= n` or
    /// the resulting key is the point at infinity / zero scalar
    fn child_from_hmac(
        &self,
        step: ChildIndex,
        depth: u8,
        digest: &[u8; 64],
    ) -> Result<Option<Self>, HdError> {
        let mut il = [0u8; 32];
        il.copy_from_slice(&digest[..32]);
        let tweak = Scalar::from_be_bytes(il);
        il.zeroize();
        let Ok(tweak) = tweak else {
            return Ok(None);
        };

        let key = match &self.key {
            KeyMaterial::Private(private_key) => match private_key.secret_key().add_tweak(&tweak) {
                Ok(secret_key) => KeyMaterial::Private(PrivateKey::from_secret_key(secret_key)),
                Err(_) => return Ok(None),
            },
            KeyMaterial::Public(public_key) => {
                let secp = Secp256k1::verification_only();
                match public_key.inner().add_exp_tweak(&secp, &tweak) {
                    Ok(inner) => KeyMaterial::Public(PublicKey::from_inner(inner)),
                    Err(_) => return Ok(None),
                }
            }
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);
        Ok(Some(Self {
            key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number: step.to_u32(),
            is_master: false,
        }))
    }

    /// The public extended key for this key; a no-op on public keys
    pub fn neuter(&self) -> Self {
        Self {
            key: KeyMaterial::Public(self.to_public_key()),
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            is_master: self.is_master,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyMaterial::Private(_))
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> u32 {
        u32::from_be_bytes(self.parent_fingerprint)
    }

    /// Serialized child index (hardened bit included)
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// First four bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        let id = hash160(&self.to_public_key().to_compressed());
        [id[0], id[1], id[2], id[3]]
    }

    /// Raw key bytes: the 32-byte scalar or the 33-byte compressed point
    pub fn key_bytes(&self) -> Vec<u8> {
        match &self.key {
            KeyMaterial::Private(private_key) => private_key.to_bytes().to_vec(),
            KeyMaterial::Public(public_key) => public_key.to_compressed().to_vec(),
        }
    }

    /// The private key; fails on a neutered key
    pub fn to_private_key(&self) -> Result<PrivateKey, HdError> {
        match &self.key {
            KeyMaterial::Private(private_key) => Ok(private_key.clone()),
            KeyMaterial::Public(_) => Err(HdError::NotPrivate),
        }
    }

    pub fn to_public_key(&self) -> PublicKey {
        match &self.key {
            KeyMaterial::Private(private_key) => *private_key.public_key(),
            KeyMaterial::Public(public_key) => *public_key,
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Base58Check `xprv`/`xpub` form
    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(SERIALIZED_LEN + 4);
        let version = if self.is_private() {
            PRIVATE_VERSION
        } else {
            PUBLIC_VERSION
        };
        payload.extend_from_slice(&version);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_number.to_be_bytes());
        payload.extend_from_slice(&self.chain_code);
        match &self.key {
            KeyMaterial::Private(private_key) => {
                payload.push(0);
                payload.extend_from_slice(&private_key.to_bytes());
            }
            KeyMaterial::Public(public_key) => {
                payload.extend_from_slice(&public_key.to_compressed());
            }
        }
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);

        let encoded = bs58::encode(&payload).into_string();
        payload.zeroize();
        encoded
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.chain_code.zeroize();
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("is_private", &self.is_private())
            .field("is_master", &self.is_master)
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("public_key", &self.to_public_key())
            .finish_non_exhaustive()
    }
}

impl FromStr for ExtendedKey {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hd::Mnemonic;

    const TV1_SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn tv1_master() -> ExtendedKey {
        ExtendedKey::master_from_seed(&hex::decode(TV1_SEED).unwrap()).unwrap()
    }

    #[test]
    fn test_bip32_vector_1() {
        let master = tv1_master();
        assert!(master.is_master());
        assert_eq!(
            master.to_string(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.neuter().to_string(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );

        let child = master.derive_path("m/0'").unwrap();
        assert_eq!(
            child.to_string(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(
            child.neuter().to_string(),
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
        );
        assert_eq!(child.depth(), 1);
        assert_eq!(child.child_number(), HARDENED_OFFSET);
        assert_eq!(child.parent_fingerprint(), u32::from_be_bytes(master.fingerprint()));

        let grandchild = master.derive_path("m/0'/1").unwrap();
        assert_eq!(
            grandchild.to_string(),
            "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs"
        );
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let account = tv1_master().derive_path("m/0'").unwrap();
        let from_private = account.child(1, false).unwrap();
        let from_public = account.neuter().child(1, false).unwrap();

        assert!(!from_public.is_private());
        assert_eq!(from_public.to_public_key(), from_private.to_public_key());
        assert_eq!(from_public.chain_code(), from_private.chain_code());
        assert_eq!(
            from_public.to_string(),
            "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ"
        );
    }

    #[test]
    fn test_default_path_golden_key() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16], "").unwrap();
        let master = ExtendedKey::master_from_seed(mnemonic.seed()).unwrap();
        let key = master.derive_path("m/44'/60'/0'/0/0").unwrap();

        assert_eq!(
            key.to_private_key().unwrap().to_hex(),
            "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
        assert_eq!(key.depth(), 5);

        let via_account = master.account_root(0).unwrap().child(0, false).unwrap();
        assert_eq!(via_account.key_bytes(), key.key_bytes());
    }

    #[test]
    fn test_hardened_and_normal_children_differ() {
        let master = tv1_master();
        let hardened = master.child(0, true).unwrap();
        let normal = master.child(0, false).unwrap();
        assert_ne!(hardened.key_bytes(), normal.key_bytes());
        assert_ne!(hardened.chain_code(), normal.chain_code());
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let public = tv1_master().neuter();
        assert!(matches!(
            public.child(0, true),
            Err(HdError::HardenedRequiresPrivateKey)
        ));
        assert!(matches!(
            public.derive_path("m/0/1'"),
            Err(HdError::HardenedRequiresPrivateKey)
        ));
    }

    #[test]
    fn test_absolute_path_requires_master() {
        let child = tv1_master().child(0, true).unwrap();
        assert!(matches!(
            child.derive_path("m/1"),
            Err(HdError::RequiresMasterKey(_))
        ));
        let relative = child.derive_path("1").unwrap();
        assert_eq!(relative.depth(), 2);
    }

    #[test]
    fn test_derivation_does_not_mutate_parent() {
        let master = tv1_master();
        let before = master.to_string();
        let _ = master.derive_path("m/44'/60'/0'/0/0").unwrap();
        assert_eq!(master.to_string(), before);
    }

    #[test]
    fn test_neuter_is_one_way() {
        let public = tv1_master().neuter();
        assert!(matches!(public.to_private_key(), Err(HdError::NotPrivate)));
        assert_eq!(public.neuter().to_string(), public.to_string());
        assert!(public.is_master());
    }

    #[test]
    fn test_seed_length_bounds() {
        assert!(matches!(
            ExtendedKey::master_from_seed(&[1u8; 15]),
            Err(HdError::InvalidSeedLength(15))
        ));
        assert!(matches!(
            ExtendedKey::master_from_seed(&[1u8; 65]),
            Err(HdError::InvalidSeedLength(65))
        ));
        assert!(ExtendedKey::master_from_seed(&[1u8; 64]).is_ok());
    }

    #[test]
    fn test_invalid_tweak_is_skipped() {
        let master = tv1_master();
        // IL equal to the curve order is not a valid scalar
        let mut digest = [0u8; 64];
        digest[..32].copy_from_slice(
            &hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap(),
        );
        let result = master
            .child_from_hmac(ChildIndex::Normal(0), 1, &digest)
            .unwrap();
        assert!(result.is_none());

        let mut valid = digest;
        valid[0] = 0x01;
        assert!(master
            .child_from_hmac(ChildIndex::Normal(0), 1, &valid)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_base58_round_trip() {
        let key = tv1_master().derive_path("m/0'/1").unwrap();
        let parsed: ExtendedKey = key.to_string().parse().unwrap();
        assert_eq!(parsed.to_string(), key.to_string());
        assert!(!parsed.is_master());
        assert_eq!(parsed.child_number(), 1);

        let public: ExtendedKey = key.neuter().to_string().parse().unwrap();
        assert!(!public.is_private());
    }

    #[test]
    fn test_base58_rejects_corruption() {
        let mut encoded = tv1_master().to_string();
        encoded.pop();
        encoded.push('j');
        assert!(matches!(
            ExtendedKey::from_base58(&encoded),
            Err(HdError::InvalidExtendedKey(_))
        ));
        assert!(ExtendedKey::from_base58("xprv").is_err());
    }
}
