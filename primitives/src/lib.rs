//! `warden-primitives`: foundational types for Warden smart accounts.
//!
//! This crate provides the address and amount types, error codes, gas
//! accounting, cryptography, Solidity ABI interfaces, intent structures with their
//! canonical digests, verdict encodings, and the transactional state overlay
//! shared by the authorization engine and its drivers.

pub mod types;
pub mod error;
pub mod gas;
pub mod crypto;
pub mod abi;
pub mod intent;
pub mod verdict;
pub mod execution;
pub mod state;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, Amount, Gas, Hash, ZERO_ADDRESS, ZERO_HASH};
pub use error::{AccountError, AccountResult, ErrorCode};
pub use gas::GasMeter;
pub use intent::{Transaction, UserOperation};
pub use verdict::{ValidationData, Verdict};
pub use execution::{CallContext, CallFrame, CallOutcome, Event, EventAttribute, LogLine, Receipt};
pub use state::StateOverlay;
pub use alloy_primitives::U256;
