//! `warden-engine`: smart-account authorization and dispatch.
//!
//! One owner-keyed account, two deployment protocols. Both adapters share
//! the same authorization core: replay check, funds check, signature check,
//! settlement, then a single outbound dispatch.
//!
//! ## Architecture
//!
//! - [`host::HostInterface`]: trait abstracting the ledger (balances, storage, nonces, calls)
//! - [`host::Ledger`]: in-memory implementation for tests and drivers
//! - [`core::AuthorizationCore`]: protocol-independent authorization and dispatch
//! - [`relayer::RelayerAccount`]: entry-point-driven adapter
//! - [`sequencer::SequencerAccount`]: bootloader-driven adapter
//! - [`guard`]: caller gating for privileged entry points
//! - [`lifecycle`]: per-intent state machines enforced by drivers
//! - [`driver`]: reference entry point and bootloader
//! - [`config`]: per-network configuration registry
//! - [`destinations`]: mock dispatch targets

pub mod host;
pub mod destinations;
pub mod guard;
pub mod core;
pub mod relayer;
pub mod sequencer;
pub mod lifecycle;
pub mod driver;
pub mod config;

// Re-export key types for convenience
pub use crate::config::{ConfigError, NetworkConfig, NetworkRegistry, ProtocolModel};
pub use crate::core::{AuthorizationCore, DispatchRoute};
pub use driver::{BootloaderDriver, EntryPointDriver};
pub use guard::CallerRole;
pub use host::{Destination, HostInterface, Ledger};
pub use relayer::RelayerAccount;
pub use sequencer::SequencerAccount;
