//! Caller gating for privileged entry points.
//!
//! Every privileged entry point calls [`require_caller`] before touching
//! state. A caller outside the permitted set gets `CallerNotAuthorized` and
//! the guarded body never runs.

use warden_primitives::{types::address_to_hex, AccountError, AccountResult, Address};

/// The role a permitted caller was admitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    /// The relayer-model entry point.
    EntryPoint,
    /// The sequencer-model bootloader.
    Bootloader,
    /// The account's owner.
    Owner,
}

impl CallerRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::EntryPoint => "entry point",
            Self::Bootloader => "bootloader",
            Self::Owner => "owner",
        }
    }
}

/// Admit `caller` if it matches one of `permitted`, first match wins.
///
/// `required` names the permitted set in the error.
pub fn require_caller(
    caller: &Address,
    permitted: &[(CallerRole, Address)],
    required: &'static str,
) -> AccountResult<CallerRole> {
    permitted
        .iter()
        .find(|(_, addr)| addr == caller)
        .map(|(role, _)| *role)
        .ok_or_else(|| {
            tracing::debug!(caller = %address_to_hex(caller), required, "caller rejected");
            AccountError::CallerNotAuthorized {
                caller: *caller,
                required,
            }
        })
}
