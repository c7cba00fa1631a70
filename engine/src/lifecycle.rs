//! Intent lifecycle state machines, enforced by drivers.
//!
//! ```text
//! relayer:    Unvalidated -> Validated -> Dispatched
//! sequencer:  Received -> Validated -> { Paid | SponsorPrepared } -> Executed
//! ```
//!
//! `Validated` is reached on either verdict. No transition skips a state.

use warden_primitives::{AccountError, AccountResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayerStage {
    Unvalidated,
    Validated,
    Dispatched,
}

impl RelayerStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unvalidated => "unvalidated",
            Self::Validated => "validated",
            Self::Dispatched => "dispatched",
        }
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unvalidated, Self::Validated) | (Self::Validated, Self::Dispatched)
        )
    }

    /// Move to `next`, or fail with `StageViolation`.
    pub fn advance(self, next: Self) -> AccountResult<Self> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(AccountError::StageViolation {
                from: self.name(),
                to: next.name(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerStage {
    Received,
    Validated,
    Paid,
    SponsorPrepared,
    Executed,
}

impl SequencerStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Paid => "paid",
            Self::SponsorPrepared => "sponsor-prepared",
            Self::Executed => "executed",
        }
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Validated)
                | (Self::Validated, Self::Paid)
                | (Self::Validated, Self::SponsorPrepared)
                | (Self::Paid, Self::Executed)
                | (Self::SponsorPrepared, Self::Executed)
        )
    }

    pub fn advance(self, next: Self) -> AccountResult<Self> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(AccountError::StageViolation {
                from: self.name(),
                to: next.name(),
            })
        }
    }
}
