//! BIP39 mnemonic phrases
//!
//! A mnemonic binds together the raw entropy, the checksummed English word
//! list that encodes it, and the 64-byte seed derived from the words and an
//! optional passphrase (PBKDF2-HMAC-SHA512, 2048 rounds).

use std::fmt;

use bip39::Language;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::error::HdError;

/// Entropy sizes accepted by BIP39, in bits
pub const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// Entropy size used for new accounts (24 words)
pub const DEFAULT_ENTROPY_BITS: usize = 256;

/// Length of a BIP39 seed
pub const SEED_LEN: usize = 64;

/// An immutable BIP39 mnemonic with its seed
#[derive(Clone)]
pub struct Mnemonic {
    entropy: Zeroizing<Vec<u8>>,
    words: Zeroizing<String>,
    seed: Zeroizing<[u8; SEED_LEN]>,
}

impl Mnemonic {
    /// Create a mnemonic from fresh OS randomness
    pub fn generate(entropy_bits: usize, passphrase: &str) -> Result<Self, HdError> {
        if !SUPPORTED_ENTROPY_BITS.contains(&entropy_bits) {
            return Err(HdError::InvalidEntropySize(entropy_bits));
        }
        let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
        OsRng.fill_bytes(&mut entropy);
        Self::from_entropy(&entropy, passphrase)
    }

    /// Create a mnemonic from known entropy
    pub fn from_entropy(entropy: &[u8], passphrase: &str) -> Result<Self, HdError> {
        if !SUPPORTED_ENTROPY_BITS.contains(&(entropy.len() * 8)) {
            return Err(HdError::InvalidEntropySize(entropy.len() * 8));
        }
        let mnemonic = bip39::Mnemonic::from_entropy_in(Language::English, entropy)?;
        Ok(Self::from_bip39(&mnemonic, passphrase))
    }

    /// Parse a space-separated English phrase, validating its checksum
    pub fn from_words(words: &str, passphrase: &str) -> Result<Self, HdError> {
        let mnemonic = bip39::Mnemonic::parse_in(Language::English, words)?;
        Ok(Self::from_bip39(&mnemonic, passphrase))
    }

    fn from_bip39(mnemonic: &bip39::Mnemonic, passphrase: &str) -> Self {
        Self {
            entropy: Zeroizing::new(mnemonic.to_entropy()),
            words: Zeroizing::new(mnemonic.to_string()),
            seed: Zeroizing::new(mnemonic.to_seed(passphrase)),
        }
    }

    /// The entropy encoded by the words
    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// The phrase, words separated by single spaces
    pub fn words(&self) -> &str {
        &self.words
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.words.split(' ').count()
    }

    /// The 64-byte BIP39 seed
    pub fn seed(&self) -> &[u8; SEED_LEN] {
        &self.seed
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_trezor_vectors() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16], "TREZOR").unwrap();
        assert_eq!(mnemonic.words(), ABANDON_ABOUT);
        assert_eq!(
            hex::encode(mnemonic.seed()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );

        let mnemonic = Mnemonic::from_entropy(&[0x7f; 16], "TREZOR").unwrap();
        assert_eq!(
            mnemonic.words(),
            "legal winner thank year wave sausage worth useful legal winner thank yellow"
        );
        assert_eq!(
            hex::encode(mnemonic.seed()),
            "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6fa457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607"
        );
    }

    #[test]
    fn test_from_entropy_is_deterministic() {
        let entropy = [0x80u8; 32];
        let a = Mnemonic::from_entropy(&entropy, "pass").unwrap();
        let b = Mnemonic::from_entropy(&entropy, "pass").unwrap();
        assert_eq!(a.words(), b.words());
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.word_count(), 24);
    }

    #[test]
    fn test_passphrase_changes_seed_only() {
        let a = Mnemonic::from_entropy(&[0u8; 16], "").unwrap();
        let b = Mnemonic::from_entropy(&[0u8; 16], "other").unwrap();
        assert_eq!(a.words(), b.words());
        assert_ne!(a.seed(), b.seed());
    }

    #[test]
    fn test_from_words_round_trips_entropy() {
        let original = Mnemonic::from_entropy(&[0x7f; 16], "").unwrap();
        let parsed = Mnemonic::from_words(original.words(), "").unwrap();
        assert_eq!(parsed.entropy(), &[0x7f; 16][..]);
        assert_eq!(parsed.seed(), original.seed());
    }

    #[test]
    fn test_corrupted_word_fails_checksum() {
        // "about" -> "above" keeps every word valid but breaks the checksum
        let corrupted = ABANDON_ABOUT.replace("about", "above");
        assert!(matches!(
            Mnemonic::from_words(&corrupted, ""),
            Err(HdError::InvalidChecksum)
        ));
    }

    #[test]
    fn test_malformed_phrases() {
        assert!(matches!(
            Mnemonic::from_words("abandon abandon abandon", ""),
            Err(HdError::InvalidWordlist(_))
        ));
        let unknown = ABANDON_ABOUT.replace("about", "notaword");
        assert!(matches!(
            Mnemonic::from_words(&unknown, ""),
            Err(HdError::InvalidWordlist(_))
        ));
    }

    #[test]
    fn test_generate_validates_size() {
        assert!(matches!(
            Mnemonic::generate(100, ""),
            Err(HdError::InvalidEntropySize(100))
        ));
        for bits in SUPPORTED_ENTROPY_BITS {
            let mnemonic = Mnemonic::generate(bits, "").unwrap();
            assert_eq!(mnemonic.entropy().len() * 8, bits);
            assert_eq!(mnemonic.word_count(), bits * 3 / 32);
        }
    }

    #[test]
    fn test_from_entropy_rejects_bad_size() {
        assert!(matches!(
            Mnemonic::from_entropy(&[0u8; 15], ""),
            Err(HdError::InvalidEntropySize(120))
        ));
    }
}
