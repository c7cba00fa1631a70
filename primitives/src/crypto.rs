//! Cryptographic operations for Warden smart accounts.
//!
//! - Keccak-256 for intent digests
//! - secp256k1 ECDSA public-key recovery for owner authentication
//! - the personal-message wrapping applied to every digest before recovery
//!
//! Recovery rejects malleable (high-s) signatures and unknown recovery ids by
//! returning `None`; callers turn that into a `Rejected` verdict.

use crate::types::{Address, Hash};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

pub use k256::ecdsa::SigningKey;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Compute the Keccak-256 hash of the input data.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Keccak256::digest(data));
    hash
}

/// Wrap a 32-byte digest in the personal-message form
/// `keccak256("\x19Ethereum Signed Message:\n32" || digest)`.
pub fn to_personal_message_digest(digest: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + 32);
    buf.extend_from_slice(PERSONAL_MESSAGE_PREFIX);
    buf.extend_from_slice(digest);
    keccak256(&buf)
}

/// Derive the 20-byte address of a secp256k1 public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Recover the signer of `digest` from a 65-byte `r || s || v` signature.
///
/// `v` may be given as `0/1` or `27/28`. Returns `None` for any signature
/// that is malformed, malleable, or does not recover to a public key.
pub fn recover_signer(digest: &Hash, signature: &[u8]) -> Option<Address> {
    if signature.len() != SIGNATURE_LEN {
        return None;
    }
    let sig = Signature::from_slice(&signature[..64]).ok()?;
    if sig.normalize_s().is_some() {
        return None;
    }
    let v = match signature[64] {
        27 | 28 => signature[64] - 27,
        0 | 1 => signature[64],
        _ => return None,
    };
    let recovery_id = RecoveryId::from_byte(v)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id).ok()?;
    Some(address_of(&key))
}

/// Sign a digest, producing a 65-byte `r || s || v` signature with `v` in `{27, 28}`.
///
/// Used by tests and reference drivers. Signing never happens inside an
/// account entry point.
#[cfg(feature = "std")]
pub fn sign_digest(
    digest: &Hash,
    signing_key: &SigningKey,
) -> Result<[u8; SIGNATURE_LEN], k256::ecdsa::Error> {
    let (sig, recovery_id) = signing_key.sign_prehash_recoverable(digest)?;
    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    Ok(out)
}

/// Sign a digest in its personal-message form, as wallets do for intents.
#[cfg(feature = "std")]
pub fn sign_personal_digest(
    digest: &Hash,
    signing_key: &SigningKey,
) -> Result<[u8; SIGNATURE_LEN], k256::ecdsa::Error> {
    sign_digest(&to_personal_message_digest(digest), signing_key)
}

/// Generate a secp256k1 keypair for testing.
///
/// Uses OS randomness, only available with `std` feature.
#[cfg(feature = "std")]
pub fn generate_keypair() -> (Address, SigningKey) {
    let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
    (address_of(signing_key.verifying_key()), signing_key)
}

/// Create a deterministic signing key from a single seed byte.
///
/// The secret scalar is `[seed; 32]`, giving reproducible keys across machines.
pub fn deterministic_keypair(seed: u8) -> (Address, SigningKey) {
    let secret = [seed.max(1); 32];
    let signing_key = match SigningKey::from_slice(&secret) {
        Ok(key) => key,
        // [0x01; 32] is always a valid scalar.
        Err(_) => return deterministic_keypair(1),
    };
    (address_of(signing_key.verifying_key()), signing_key)
}
