//! Sequencer-model account (bootloader driven).
//!
//! The bootloader calls `validate_transaction`, then either
//! `pay_for_transaction` or `prepare_for_paymaster`, then
//! `execute_transaction`. Each call is its own atomic unit. Anyone may submit
//! an owner-signed transaction through `execute_transaction_from_outside`,
//! which runs validation and dispatch in a single unit.

use alloy_sol_types::SolCall;
use tracing::{debug, info, warn};
use warden_primitives::{
    abi::{from_sol_address, selector_of, sol_address, IPaymasterFlow, IToken},
    types::{address_to_hex, SYSTEM_DEPLOYER_ADDRESS},
    AccountError, AccountResult, Address, CallContext, GasMeter, Hash, Transaction, Verdict,
};

use crate::config::NetworkConfig;
use crate::core::{AuthorizationCore, DispatchRoute};
use crate::guard::{require_caller, CallerRole};
use crate::host::{atomically, HostInterface};

/// An account deployed for the sequencer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerAccount {
    core: AuthorizationCore,
    bootloader: Address,
}

impl SequencerAccount {
    /// Deploy at `address`; the configured driver is the bootloader.
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
            bootloader = %address_to_hex(&config.driver),
            "sequencer account deployed"
        );
        Ok(account)
    }

    pub fn at(address: Address, bootloader: Address) -> Self {
        Self {
            core: AuthorizationCore::new(address),
            bootloader,
        }
    }

    pub fn address(&self) -> Address {
        self.core.account()
    }

    pub fn bootloader(&self) -> Address {
        self.bootloader
    }

    pub fn owner(&self, host: &dyn HostInterface) -> AccountResult<Address> {
        self.core.owner(host)
    }

    fn require_bootloader(&self, ctx: &CallContext) -> AccountResult<CallerRole> {
        require_caller(
            &ctx.caller,
            &[(CallerRole::Bootloader, self.bootloader)],
            "bootloader",
        )
    }

    /// Nonce, funds, and signature checks, in that order.
    ///
    /// The nonce is consumed through the system nonce registry.
    fn validate(
        &self,
        host: &mut dyn HostInterface,
        tx: &Transaction,
        meter: &mut GasMeter,
    ) -> AccountResult<Verdict> {
        self.core.check_replay_system(host, tx.nonce, meter)?;
        self.core.require_funds(host, tx.total_required_balance())?;
        let digest = tx.encode_hash(host.chain_id());
        self.core.authorize(host, &digest, &tx.signature, meter)
    }

    fn dispatch(
        &self,
        host: &mut dyn HostInterface,
        tx: &Transaction,
        meter: &mut GasMeter,
    ) -> AccountResult<Vec<u8>> {
        let route = if tx.to == SYSTEM_DEPLOYER_ADDRESS {
            DispatchRoute::System
        } else {
            DispatchRoute::Plain
        };
        self.core.dispatch(host, &tx.to, tx.value, &tx.data, route, meter)
    }

    /// Authorize `tx`. Caller must be the bootloader.
    ///
    /// The driver-supplied hashes are accepted but not trusted; the digest
    /// is recomputed from `tx` on the host's chain.
    pub fn validate_transaction(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        _tx_hash: &Hash,
        _suggested_signed_hash: &Hash,
        tx: &Transaction,
    ) -> AccountResult<Verdict> {
        self.require_bootloader(ctx)?;
        let meter = &mut ctx.meter;
        let verdict = atomically(host, |h| self.validate(h, tx, meter))?;
        debug!(
            account = %address_to_hex(&self.address()),
            nonce = tx.nonce,
            %verdict,
            "transaction validated"
        );
        Ok(verdict)
    }

    /// Pay the worst-case fee to the bootloader. Caller must be the bootloader.
    pub fn pay_for_transaction(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        tx: &Transaction,
    ) -> AccountResult<()> {
        self.require_bootloader(ctx)?;
        let Some(amount) = tx.max_fee() else {
            return Err(AccountError::FailedToPay { amount: u128::MAX });
        };
        let bootloader = self.bootloader;
        let meter = &mut ctx.meter;
        atomically(host, |h| {
            self.core
                .settle(h, &bootloader, amount, meter)
                .map_err(|e| match e {
                    AccountError::InsufficientFunds { .. }
                    | AccountError::SettlementFailed { .. } => AccountError::FailedToPay { amount },
                    other => other,
                })
        })
        .inspect_err(|e| warn!(error = %e, "fee payment failed"))
    }

    /// Prepare the fee sponsor named in `tx`. Caller must be the bootloader.
    ///
    /// The approval-based flow grants the sponsor `min_allowance` of `token`;
    /// the general flow needs nothing from the account.
    pub fn prepare_for_paymaster(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        tx: &Transaction,
    ) -> AccountResult<()> {
        self.require_bootloader(ctx)?;
        let flow = selector_of(&tx.paymaster_input).ok_or(AccountError::InvalidPaymasterInput)?;

        if flow == IPaymasterFlow::generalCall::SELECTOR {
            return Ok(());
        }
        if flow != IPaymasterFlow::approvalBasedCall::SELECTOR {
            return Err(AccountError::UnsupportedPaymasterFlow(flow));
        }

        let call = IPaymasterFlow::approvalBasedCall::abi_decode(&tx.paymaster_input, true)?;
        let token = from_sol_address(call.token);
        let approve = IToken::approveCall {
            spender: sol_address(&tx.paymaster),
            amount: call.minAllowance,
        }
        .abi_encode();
        debug!(
            token = %address_to_hex(&token),
            paymaster = %address_to_hex(&tx.paymaster),
            min_allowance = %call.minAllowance,
            "approving paymaster"
        );
        let meter = &mut ctx.meter;
        atomically(host, |h| {
            self.core
                .dispatch(h, &token, 0, &approve, DispatchRoute::Plain, meter)
                .map(|_| ())
        })
    }

    /// Dispatch `tx`. Caller must be the bootloader.
    ///
    /// Transactions addressed to the system deployer go through the system
    /// call path.
    pub fn execute_transaction(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        tx: &Transaction,
    ) -> AccountResult<Vec<u8>> {
        self.require_bootloader(ctx)?;
        let meter = &mut ctx.meter;
        atomically(host, |h| self.dispatch(h, tx, meter))
    }

    /// Validate and dispatch an owner-signed `tx` submitted by anyone.
    ///
    /// A `Rejected` verdict fails with `InvalidSignature` and undoes the
    /// nonce advance.
    pub fn execute_transaction_from_outside(
        &self,
        host: &mut dyn HostInterface,
        ctx: &mut CallContext,
        tx: &Transaction,
    ) -> AccountResult<Vec<u8>> {
        let meter = &mut ctx.meter;
        atomically(host, |h| {
            if !self.validate(h, tx, meter)?.is_authorized() {
                return Err(AccountError::InvalidSignature);
            }
            self.dispatch(h, tx, meter)
        })
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
