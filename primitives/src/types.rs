//! Core type aliases and reserved addresses for Warden smart accounts.
//!
//! These types are shared by the authorization core, both protocol adapters,
//! and the in-memory ledger.

/// 32-byte digest used for intent hashes and EIP-712 struct hashes.
pub type Hash = [u8; 32];

/// 20-byte account identifier, as recovered from a secp256k1 public key.
pub type Address = [u8; 20];

/// Native funds. Values are moved with 128-bit precision, matching the
/// sequencer model's cast of call value to `u128`.
pub type Amount = u128;

/// Remaining computational budget, supplied by the driver.
pub type Gas = u64;

/// A zero-valued hash (32 zero bytes).
pub const ZERO_HASH: Hash = [0u8; 32];

/// The zero address. Never a valid owner, and the "no fee sponsor" marker.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Privileged sequencer process (the bootloader).
pub const BOOTLOADER_ADDRESS: Address = system_address(0x8001);

/// System nonce registry used by the sequencer model.
pub const NONCE_HOLDER_ADDRESS: Address = system_address(0x8003);

/// Nonce key the sequencer model sequences every account on.
pub const SEQUENCER_NONCE_KEY: u64 = 0;

/// System deployer. Dispatch to this target goes through the system-call path.
pub const SYSTEM_DEPLOYER_ADDRESS: Address = system_address(0x8006);

/// One unit of native funds (18 decimals).
pub const ONE_UNIT: Amount = 1_000_000_000_000_000_000;

/// Build an address in the reserved system range `0x…XXXX`.
pub const fn system_address(low: u16) -> Address {
    let mut addr = [0u8; 20];
    addr[18] = (low >> 8) as u8;
    addr[19] = low as u8;
    addr
}

/// Convert an `Address` to a `0x`-prefixed hex string for display purposes.
pub fn address_to_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}

/// Convert a `Hash` to a `0x`-prefixed hex string for display purposes.
pub fn hash_to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-prefixed (or bare) 40-character hex string into an `Address`.
pub fn address_from_hex(s: &str) -> Option<Address> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).ok()?;
    bytes.try_into().ok()
}

/// Encode a u128 as a 32-byte big-endian word.
pub fn u128_to_word(v: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&v.to_be_bytes());
    word
}

/// Decode a u128 from a 32-byte big-endian word.
///
/// Returns `None` if the upper 16 bytes are non-zero.
pub fn u128_from_word(word: &[u8; 32]) -> Option<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&word[16..]);
    Some(u128::from_be_bytes(buf))
}

/// Decode an address from the low 20 bytes of a word.
///
/// Returns `None` if the upper 12 bytes are non-zero.
pub fn address_from_word(word: &[u8; 32]) -> Option<Address> {
    if word[..12].iter().any(|b| *b != 0) {
        return None;
    }
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&word[12..]);
    Some(addr)
}
