//! ECDSA signing and verification over secp256k1
//!
//! Nonces are deterministic (RFC 6979) and signatures are normalized to
//! low-S, so signing the same digest with the same key always produces the
//! same bytes.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, Secp256k1};

use super::hash::sha256;
use super::keys::{KeyError, PrivateKey, PublicKey};

/// Length of a compact `R || S` signature
pub const SIGNATURE_LEN: usize = 64;

/// Length of a recoverable `R || S || recid` signature
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Sign a 32-byte digest, returning the compact `R || S` form
pub fn sign_digest(private_key: &PrivateKey, digest: &[u8; 32]) -> [u8; SIGNATURE_LEN] {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest);
    secp.sign_ecdsa(&message, private_key.secret_key())
        .serialize_compact()
}

/// Verify a compact signature over a 32-byte digest
///
/// Returns `Ok(false)` for a well-formed signature that does not match, and
/// an error when the signature bytes cannot be parsed.
pub fn verify_digest(
    public_key: &PublicKey,
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<bool, KeyError> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);
    let sig = Signature::from_compact(signature).map_err(|_| KeyError::InvalidSignature)?;

    match secp.verify_ecdsa(&message, &sig, public_key.inner()) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Sign arbitrary bytes the way Tendermint secp256k1 keys do: SHA-256 the
/// message, then sign the digest
pub fn sign_message(private_key: &PrivateKey, message: &[u8]) -> [u8; SIGNATURE_LEN] {
    sign_digest(private_key, &sha256(message))
}

/// Verify a signature produced by [`sign_message`]
pub fn verify_message(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<bool, KeyError> {
    verify_digest(public_key, &sha256(message), signature)
}

/// Sign a digest and append the recovery id: `R || S || recid` with
/// `recid` in `0..=3`
pub fn sign_recoverable(private_key: &PrivateKey, digest: &[u8; 32]) -> [u8; RECOVERABLE_SIGNATURE_LEN] {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest);
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, private_key.secret_key())
        .serialize_compact();

    let mut signature = [0u8; RECOVERABLE_SIGNATURE_LEN];
    signature[..SIGNATURE_LEN].copy_from_slice(&compact);
    signature[SIGNATURE_LEN] = recovery_id.to_i32() as u8;
    signature
}

/// Recover the public key that produced a recoverable signature
pub fn recover_public_key(digest: &[u8; 32], signature: &[u8]) -> Result<PublicKey, KeyError> {
    if signature.len() != RECOVERABLE_SIGNATURE_LEN {
        return Err(KeyError::InvalidSignature);
    }
    let recovery_id = RecoveryId::from_i32(i32::from(signature[SIGNATURE_LEN]))
        .map_err(|_| KeyError::InvalidSignature)?;
    let sig = RecoverableSignature::from_compact(&signature[..SIGNATURE_LEN], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);
    let inner = secp.recover_ecdsa(&message, &sig)?;
    Ok(PublicKey::from_inner(inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> PrivateKey {
        PrivateKey::from_hex("1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727")
            .unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let key = test_key();
        let signature = sign_message(&key, b"Hello, DX!");
        assert!(verify_message(key.public_key(), b"Hello, DX!", &signature).unwrap());
        assert!(!verify_message(key.public_key(), b"Hello, DX?", &signature).unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = test_key();
        let digest = sha256(b"same input");
        assert_eq!(sign_digest(&key, &digest), sign_digest(&key, &digest));
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let key = test_key();
        let digest = sha256(b"data");
        assert!(matches!(
            verify_digest(key.public_key(), &digest, &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_recoverable_signature_recovers_signer() {
        let key = test_key();
        let digest = sha256(b"check body");
        let signature = sign_recoverable(&key, &digest);

        assert!(signature[64] <= 3);
        assert_eq!(&signature[..64], &sign_digest(&key, &digest)[..]);
        assert_eq!(&recover_public_key(&digest, &signature).unwrap(), key.public_key());

        let other = sha256(b"another body");
        assert_ne!(&recover_public_key(&other, &signature).unwrap(), key.public_key());
    }

    #[test]
    fn test_recover_rejects_bad_recovery_id() {
        let key = test_key();
        let digest = sha256(b"check body");
        let mut signature = sign_recoverable(&key, &digest);
        signature[64] = 9;
        assert!(recover_public_key(&digest, &signature).is_err());
    }
}
