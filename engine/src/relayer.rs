//! Relayer-model account (entry point driven).
//!
//! The entry point calls [`RelayerAccount::validate_user_op`] first, then
//! [`RelayerAccount::execute`]. Validation advances the replay counter and
//! reimburses the entry point whatever the verdict; a `Rejected` verdict is
//! reported in the returned [`ValidationData`], never as an error.

use tracing::{debug, info};
use warden_primitives::{
    types::address_to_hex, AccountResult, Address, Amount, CallContext, Hash, UserOperation,
    ValidationData,
};

use crate::config::NetworkConfig;
use crate::core::{AuthorizationCore, DispatchRoute};
use crate::guard::{require_caller, CallerRole};
use crate::host::{atomically, HostInterface};

/// An account deployed for the relayer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayerAccount {
    core: AuthorizationCore,
    entry_point: Address,
}

impl RelayerAccount {
    /// Deploy at `address`: write the configured owner and bind the
    /// configured entry point.
    pub fn deploy(
        host: &mut dyn HostInterface,
        address: Address,
        config: &NetworkConfig,
    ) -> AccountResult<Self> {
        let account = Self::at(address, config.driver);
        atomically(host, |h| account.core.initialize(h, config.owner))?;
        info!(
            network = %config.name,
            account = %address_to_hex(&address),
            entry_point = %address_to_hex(&config.driver),
            "relayer account deployed"
        );
        Ok(account)
    }

    /// Handle to an account already deployed at `address`.
    pub fn at(address: Address, entry_point: Address) -> Self {
        Self {
            core: AuthorizationCore::new(address),
            entry_point,
        }
    }

    pub fn address(&self) -> Address {
        self.core.account()
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn owner(&self, host: &dyn HostInterface) -> AccountResult<Address> {
        self.core.owner(host)
    }

    /// Authorize `op` and reimburse the caller.
    ///
    /// Caller must be the entry point. Runs the replay check on `op.nonce`,
    /// the signature check over `op_hash`, then settles `missing_funds` to
    /// the caller, as one atomic unit.
    pub fn validate_user_op(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        op: &UserOperation,
        op_hash: &Hash,
        missing_funds: Amount,
    ) -> AccountResult<ValidationData> {
        require_caller(
            &ctx.caller,
            &[(CallerRole::EntryPoint, self.entry_point)],
            "entry point",
        )?;
        let caller = ctx.caller;
        let meter = &mut ctx.meter;

        let data = atomically(host, |h| {
            self.core
                .check_replay(h, op.nonce_key(), op.nonce_sequence(), meter)?;
            let verdict = self.core.authorize(h, op_hash, &op.signature, meter)?;
            self.core.settle(h, &caller, missing_funds, meter)?;
            Ok(ValidationData::from_verdict(verdict))
        })?;

        debug!(
            account = %address_to_hex(&self.address()),
            nonce = op.nonce_sequence(),
            key = op.nonce_key(),
            sig_failed = data.sig_failed,
            missing_funds,
            "user operation validated"
        );
        Ok(data)
    }

    /// Call `destination` with `value` and `payload`.
    ///
    /// Caller must be the entry point or the owner.
    pub fn execute(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        destination: &Address,
        value: Amount,
        payload: &[u8],
    ) -> AccountResult<Vec<u8>> {
        let owner = self.core.owner(host)?;
        let role = require_caller(
            &ctx.caller,
            &[
                (CallerRole::EntryPoint, self.entry_point),
                (CallerRole::Owner, owner),
            ],
            "entry point or owner",
        )?;
        debug!(role = role.label(), destination = %address_to_hex(destination), value, "execute");

        let meter = &mut ctx.meter;
        atomically(host, |h| {
            self.core
                .dispatch(h, destination, value, payload, DispatchRoute::Plain, meter)
        })
    }

    /// Owner-only hand-over of the account.
    pub fn transfer_ownership(
        &self,
        host: &mut dyn HostInterface,
        ctx: &CallContext,
        new_owner: Address,
    ) -> AccountResult<()> {
        atomically(host, |h| self.core.transfer_ownership(h, &ctx.caller, new_owner))
    }

    /// EIP-1271 signature check against the current owner.
    pub fn is_valid_signature(
        &self,
        host: &dyn HostInterface,
        hash: &Hash,
        signature: &[u8],
    ) -> AccountResult<[u8; 4]> {
        self.core.is_valid_signature(host, hash, signature)
    }
}
