//! Gas accounting for account entry points.
//!
//! Gas is an externally supplied budget: the driver hands each entry point a
//! limit, the account charges its own work against it, and every outbound
//! call is forwarded whatever remains.

use crate::error::{AccountError, AccountResult};

// ── Gas cost constants ──

/// Base cost for reading a storage slot.
pub const G_STORAGE_GET: u64 = 2_100;

/// Base cost for writing a storage slot.
pub const G_STORAGE_SET: u64 = 20_000;

/// Per-byte cost added to storage and hashing operations.
pub const G_PER_BYTE: u64 = 3;

/// Base cost for a keccak-256 hash.
pub const G_KECCAK: u64 = 30;

/// Cost of recovering a signer from a secp256k1 signature.
pub const G_ECRECOVER: u64 = 3_000;

/// Base cost of an outbound call.
pub const G_CALL: u64 = 700;

/// Surcharge for an outbound call that moves native funds.
pub const G_CALL_VALUE: u64 = 9_000;

/// Base cost for recording an event.
pub const G_EMIT_EVENT: u64 = 375;

/// Cost of a nonce registry compare-and-increment.
pub const G_NONCE_UPDATE: u64 = 5_000;

/// Compute the gas cost for reading a storage slot.
pub fn gas_cost_storage_get(slot_len: usize) -> u64 {
    G_STORAGE_GET.saturating_add((slot_len as u64).saturating_mul(G_PER_BYTE))
}

/// Compute the gas cost for writing a storage slot.
pub fn gas_cost_storage_set(slot_len: usize, val_len: usize) -> u64 {
    let byte_cost = ((slot_len + val_len) as u64).saturating_mul(G_PER_BYTE);
    G_STORAGE_SET.saturating_add(byte_cost)
}

/// Compute the gas cost for hashing `input_len` bytes.
pub fn gas_cost_keccak(input_len: usize) -> u64 {
    G_KECCAK.saturating_add((input_len as u64).saturating_mul(G_PER_BYTE))
}

/// Compute the base gas cost for an outbound call.
pub fn gas_cost_call(moves_value: bool) -> u64 {
    if moves_value {
        G_CALL.saturating_add(G_CALL_VALUE)
    } else {
        G_CALL
    }
}

/// Tracks gas consumption within a single entry point invocation.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Create a new gas meter with the given limit.
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Create an unlimited gas meter (for testing only).
    pub fn unlimited() -> Self {
        Self {
            limit: u64::MAX,
            consumed: 0,
        }
    }

    /// Consume gas. Returns `OutOfGas` error if the limit would be exceeded.
    ///
    /// On error the consumed count remains unchanged.
    pub fn consume(&mut self, amount: u64) -> AccountResult<()> {
        let new_consumed = match self.consumed.checked_add(amount) {
            Some(v) if v <= self.limit => v,
            _ => {
                return Err(AccountError::OutOfGas {
                    limit: self.limit,
                    used: self.consumed.saturating_add(amount),
                });
            }
        };
        self.consumed = new_consumed;
        Ok(())
    }

    /// Record gas spent by a forwarded call.
    ///
    /// A callee can never report more than it was forwarded, so this clamps
    /// to the remaining budget instead of failing.
    pub fn absorb(&mut self, used: u64) {
        self.consumed = self.consumed.saturating_add(used.min(self.remaining()));
    }

    /// Returns the total gas consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Returns the remaining gas before the limit is reached.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    /// Returns the gas limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}
