//! Authorization verdicts and their wire encodings.
//!
//! A verdict is a value, never an error: a driver receiving `Rejected` can
//! assign blame or skip the intent without unwinding the replay-counter
//! advance and settlement that authorization already committed.

use crate::types::{address_from_word, Address, ZERO_ADDRESS};

/// Returned by `validateTransaction` when the owner signed the transaction.
pub const ACCOUNT_VALIDATION_SUCCESS_MAGIC: [u8; 4] = [0x20, 0x2b, 0xcc, 0xe7];

/// Returned by `is_valid_signature` for an owner signature (EIP-1271).
pub const EIP1271_SUCCESS_MAGIC: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Returned by `is_valid_signature` for any other signature.
pub const EIP1271_FAILURE: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// Relayer-model code for a valid signature.
pub const SIG_VALIDATION_SUCCESS: u8 = 0;

/// Relayer-model code for an invalid signature.
pub const SIG_VALIDATION_FAILED: u8 = 1;

/// Binary outcome of signature-based authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Authorized,
    Rejected,
}

impl Verdict {
    /// `Authorized` if `signer` is the owner, `Rejected` otherwise
    /// (including when no signer could be recovered).
    pub fn from_signer(signer: Option<Address>, owner: &Address) -> Self {
        match signer {
            Some(addr) if addr == *owner && addr != ZERO_ADDRESS => Self::Authorized,
            _ => Self::Rejected,
        }
    }

    pub fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Sequencer-model encoding: the success magic, or four zero bytes.
    pub fn magic(self) -> [u8; 4] {
        match self {
            Self::Authorized => ACCOUNT_VALIDATION_SUCCESS_MAGIC,
            Self::Rejected => [0u8; 4],
        }
    }

    /// Decode a sequencer-model magic value.
    pub fn from_magic(magic: [u8; 4]) -> Self {
        if magic == ACCOUNT_VALIDATION_SUCCESS_MAGIC {
            Self::Authorized
        } else {
            Self::Rejected
        }
    }

    /// EIP-1271 encoding.
    pub fn eip1271(self) -> [u8; 4] {
        match self {
            Self::Authorized => EIP1271_SUCCESS_MAGIC,
            Self::Rejected => EIP1271_FAILURE,
        }
    }
}

impl core::fmt::Display for Verdict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Authorized => write!(f, "AUTHORIZED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Relayer-model packed validation result.
///
/// Layout of the 32-byte big-endian word:
/// - bits `0..160`: authorizer (`0` = success, `1` = signature failure)
/// - bits `160..208`: `valid_until` (48 bits, `0` = no expiry)
/// - bits `208..256`: `valid_after` (48 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationData {
    pub sig_failed: bool,
    pub valid_until: u64,
    pub valid_after: u64,
}

const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

impl ValidationData {
    /// Validation data for a verdict with no time range.
    pub fn from_verdict(verdict: Verdict) -> Self {
        Self {
            sig_failed: !verdict.is_authorized(),
            valid_until: 0,
            valid_after: 0,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.sig_failed {
            Verdict::Rejected
        } else {
            Verdict::Authorized
        }
    }

    /// Pack into the 32-byte word returned to the entry point.
    ///
    /// Timestamps wider than 48 bits saturate.
    pub fn pack(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        let after = self.valid_after.min(MAX_TIMESTAMP).to_be_bytes();
        let until = self.valid_until.min(MAX_TIMESTAMP).to_be_bytes();
        word[0..6].copy_from_slice(&after[2..]);
        word[6..12].copy_from_slice(&until[2..]);
        word[31] = if self.sig_failed { SIG_VALIDATION_FAILED } else { SIG_VALIDATION_SUCCESS };
        word
    }

    /// Unpack a word produced by an account.
    ///
    /// Any authorizer other than `0` or `1` (an aggregator) is `None`.
    pub fn unpack(word: &[u8; 32]) -> Option<Self> {
        let mut authorizer_word = [0u8; 32];
        authorizer_word[12..].copy_from_slice(&word[12..]);
        let authorizer = address_from_word(&authorizer_word)?;
        let sig_failed = match authorizer {
            a if a == ZERO_ADDRESS => false,
            a if a[..19].iter().all(|b| *b == 0) && a[19] == SIG_VALIDATION_FAILED => true,
            _ => return None,
        };
        let mut after = [0u8; 8];
        after[2..].copy_from_slice(&word[0..6]);
        let mut until = [0u8; 8];
        until[2..].copy_from_slice(&word[6..12]);
        Some(Self {
            sig_failed,
            valid_until: u64::from_be_bytes(until),
            valid_after: u64::from_be_bytes(after),
        })
    }

    /// Whether the result is usable at `now` (signature ok and inside the window).
    pub fn is_valid_at(&self, now: u64) -> bool {
        if self.sig_failed || now < self.valid_after {
            return false;
        }
        self.valid_until == 0 || now <= self.valid_until
    }
}
