//! Error types for Warden smart accounts.
//!
//! Every fatal outcome of an account entry point is an [`AccountError`].
//! A signature mismatch is deliberately absent: it is reported as a
//! `Rejected` verdict value, never as an error.

use crate::types::{address_to_hex, Address, Amount};
use core::fmt;
use thiserror::Error;

/// Numeric result codes reported in driver receipts.
///
/// These repr values are stable; drivers persist them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    Ok = 0,
    CallerNotAuthorized = 1,
    ReplayRejected = 2,
    InsufficientFunds = 3,
    DispatchFailed = 4,
    SettlementFailed = 5,
    FailedToPay = 6,
    InvalidSignature = 7,
    OutOfGas = 8,
    InvalidEncoding = 9,
    InvalidPaymasterInput = 10,
    UnsupportedPaymasterFlow = 11,
    InvalidOwner = 12,
    StageViolation = 13,
}

impl ErrorCode {
    /// Convert from a u32 result code.
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::CallerNotAuthorized),
            2 => Some(Self::ReplayRejected),
            3 => Some(Self::InsufficientFunds),
            4 => Some(Self::DispatchFailed),
            5 => Some(Self::SettlementFailed),
            6 => Some(Self::FailedToPay),
            7 => Some(Self::InvalidSignature),
            8 => Some(Self::OutOfGas),
            9 => Some(Self::InvalidEncoding),
            10 => Some(Self::InvalidPaymasterInput),
            11 => Some(Self::UnsupportedPaymasterFlow),
            12 => Some(Self::InvalidOwner),
            13 => Some(Self::StageViolation),
            _ => None,
        }
    }

    /// Return the u32 representation of this code.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Returns true if this is the `Ok` variant.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::CallerNotAuthorized => "ERR_CALLER_NOT_AUTHORIZED",
            Self::ReplayRejected => "ERR_REPLAY_REJECTED",
            Self::InsufficientFunds => "ERR_INSUFFICIENT_FUNDS",
            Self::DispatchFailed => "ERR_DISPATCH_FAILED",
            Self::SettlementFailed => "ERR_SETTLEMENT_FAILED",
            Self::FailedToPay => "ERR_FAILED_TO_PAY",
            Self::InvalidSignature => "ERR_INVALID_SIGNATURE",
            Self::OutOfGas => "ERR_OUT_OF_GAS",
            Self::InvalidEncoding => "ERR_INVALID_ENCODING",
            Self::InvalidPaymasterInput => "ERR_INVALID_PAYMASTER_INPUT",
            Self::UnsupportedPaymasterFlow => "ERR_UNSUPPORTED_PAYMASTER_FLOW",
            Self::InvalidOwner => "ERR_INVALID_OWNER",
            Self::StageViolation => "ERR_STAGE_VIOLATION",
        };
        f.write_str(name)
    }
}

/// Account entry point error.
///
/// Any `Err` aborts the entry point with no partial effect: the host
/// discards every write made since the entry point's checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The caller is not one of the identities allowed for this entry point.
    #[error("caller {} is not authorized (requires {required})", address_to_hex(.caller))]
    CallerNotAuthorized {
        caller: Address,
        required: &'static str,
    },

    /// The intent's replay counter does not match the expected value.
    #[error("replay rejected: expected nonce {expected}, got {got}")]
    ReplayRejected { expected: u64, got: u64 },

    /// The account cannot cover what the intent requires.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// The destination call failed. Carries the raw return data.
    #[error("dispatch failed (return data 0x{})", hex::encode(.return_data))]
    DispatchFailed { return_data: Vec<u8> },

    /// The driver refused the settlement transfer.
    #[error("settlement of {amount} to the driver failed")]
    SettlementFailed { amount: Amount },

    /// The fee payment to the bootloader failed.
    #[error("failed to pay {amount} to the bootloader")]
    FailedToPay { amount: Amount },

    /// The outside entry point was invoked with an intent the owner did not sign.
    #[error("invalid signature")]
    InvalidSignature,

    /// The remaining computational budget was exhausted.
    #[error("out of gas: limit={limit}, used={used}")]
    OutOfGas { limit: u64, used: u64 },

    /// Calldata, a signature envelope, or stored state could not be decoded.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Fee sponsor input is shorter than a selector.
    #[error("paymaster input must start with a 4-byte flow selector")]
    InvalidPaymasterInput,

    /// Fee sponsor input names a flow the account does not support.
    #[error("unsupported paymaster flow 0x{}", hex::encode(.0))]
    UnsupportedPaymasterFlow([u8; 4]),

    /// The zero address cannot own an account.
    #[error("invalid owner")]
    InvalidOwner,

    /// A driver attempted an out-of-order lifecycle transition.
    #[error("lifecycle stage violation: {from} -> {to}")]
    StageViolation {
        from: &'static str,
        to: &'static str,
    },
}

impl AccountError {
    /// Map this error to its receipt result code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::CallerNotAuthorized { .. } => ErrorCode::CallerNotAuthorized,
            Self::ReplayRejected { .. } => ErrorCode::ReplayRejected,
            Self::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            Self::DispatchFailed { .. } => ErrorCode::DispatchFailed,
            Self::SettlementFailed { .. } => ErrorCode::SettlementFailed,
            Self::FailedToPay { .. } => ErrorCode::FailedToPay,
            Self::InvalidSignature => ErrorCode::InvalidSignature,
            Self::OutOfGas { .. } => ErrorCode::OutOfGas,
            Self::InvalidEncoding(_) => ErrorCode::InvalidEncoding,
            Self::InvalidPaymasterInput => ErrorCode::InvalidPaymasterInput,
            Self::UnsupportedPaymasterFlow(_) => ErrorCode::UnsupportedPaymasterFlow,
            Self::InvalidOwner => ErrorCode::InvalidOwner,
            Self::StageViolation { .. } => ErrorCode::StageViolation,
        }
    }

    /// Raw return data carried by a failed dispatch, empty otherwise.
    pub fn return_data(&self) -> &[u8] {
        match self {
            Self::DispatchFailed { return_data } => return_data,
            _ => &[],
        }
    }
}

impl From<alloy_sol_types::Error> for AccountError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::InvalidEncoding(err.to_string())
    }
}

/// Convenience result type for account entry points.
pub type AccountResult<T> = core::result::Result<T, AccountError>;
