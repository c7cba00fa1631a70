//! Reference drivers: walk one intent through its lifecycle.
//!
//! These play the part of the entry point and the bootloader in tests and
//! demos. They check what a real driver would check up front, call the
//! account's phases in order under the lifecycle state machines, and fold
//! the result into a [`Receipt`].

use tracing::{info, warn};
use warden_primitives::{
    types::{address_to_hex, BOOTLOADER_ADDRESS},
    AccountError, AccountResult, Address, Amount, CallContext, Gas, Receipt, Transaction,
    UserOperation,
};

use crate::host::HostInterface;
use crate::lifecycle::{RelayerStage, SequencerStage};
use crate::relayer::RelayerAccount;
use crate::sequencer::SequencerAccount;

fn receipt(result: AccountResult<Vec<u8>>, gas_used: Gas) -> Receipt {
    match result {
        Ok(return_data) => Receipt {
            success: true,
            gas_used,
            result_code: 0,
            return_data,
        },
        Err(e) => {
            warn!(error = %e, gas_used, "intent failed");
            Receipt {
                success: false,
                gas_used,
                result_code: e.code().as_u32(),
                return_data: e.return_data().to_vec(),
            }
        }
    }
}

fn split_limits(word: &[u8; 32]) -> (Gas, Gas) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&word[..16]);
    low.copy_from_slice(&word[16..]);
    let clamp = |v: u128| Gas::try_from(v).unwrap_or(Gas::MAX);
    (clamp(u128::from_be_bytes(high)), clamp(u128::from_be_bytes(low)))
}

/// Relayer-model driver.
#[derive(Debug, Clone, Copy)]
pub struct EntryPointDriver {
    entry_point: Address,
}

impl EntryPointDriver {
    pub fn new(entry_point: Address) -> Self {
        Self { entry_point }
    }

    /// Driver bound to the entry point `account` trusts.
    pub fn for_account(account: &RelayerAccount) -> Self {
        Self::new(account.entry_point())
    }

    /// Worst-case fee the account must prefund:
    /// `(verification + call + pre-verification gas) * max fee`.
    ///
    /// Zero when a sponsor is named. `None` on overflow.
    pub fn required_prefund(op: &UserOperation) -> Option<Amount> {
        if !op.paymaster_and_data.is_empty() {
            return Some(0);
        }
        let (verification, call) = split_limits(&op.account_gas_limits);
        let (_, max_fee) = split_limits(&op.gas_fees);
        let gas = (verification as u128)
            .checked_add(call as u128)?
            .checked_add(op.pre_verification_gas as u128)?;
        gas.checked_mul(max_fee as u128)
    }

    /// Validate and execute `op` against `account`.
    pub fn handle_op(
        &self,
        host: &mut dyn HostInterface,
        account: &RelayerAccount,
        op: &UserOperation,
    ) -> Receipt {
        let mut gas_used = 0;
        let result = self.run(host, account, op, &mut gas_used);
        info!(
            account = %address_to_hex(&account.address()),
            nonce = op.nonce_sequence(),
            success = result.is_ok(),
            "user operation handled"
        );
        receipt(result, gas_used)
    }

    fn run(
        &self,
        host: &mut dyn HostInterface,
        account: &RelayerAccount,
        op: &UserOperation,
        gas_used: &mut Gas,
    ) -> AccountResult<Vec<u8>> {
        let mut stage = RelayerStage::Unvalidated;

        let expected = host.nonce_of(&account.address(), op.nonce_key());
        if expected != op.nonce_sequence() {
            return Err(AccountError::ReplayRejected {
                expected,
                got: op.nonce_sequence(),
            });
        }

        let op_hash = op.hash(&self.entry_point, host.chain_id());
        let missing_funds = Self::required_prefund(op).ok_or(AccountError::InsufficientFunds {
            required: Amount::MAX,
            available: host.balance_of(&account.address()),
        })?;
        let (verification_gas, call_gas) = split_limits(&op.account_gas_limits);

        let mut ctx = CallContext::new(self.entry_point, verification_gas);
        let validation = account.validate_user_op(host, &mut ctx, op, &op_hash, missing_funds);
        *gas_used += ctx.meter.consumed();
        let validation = validation?;
        stage = stage.advance(RelayerStage::Validated)?;
        if validation.sig_failed {
            return Err(AccountError::InvalidSignature);
        }

        let mut ctx = CallContext::new(self.entry_point, call_gas);
        let result = account.execute(host, &mut ctx, &op.destination, op.value, &op.payload);
        *gas_used += ctx.meter.consumed();
        stage.advance(RelayerStage::Dispatched)?;
        result
    }
}

/// Sequencer-model driver.
#[derive(Debug, Clone, Copy)]
pub struct BootloaderDriver {
    bootloader: Address,
}

impl Default for BootloaderDriver {
    fn default() -> Self {
        Self::new(BOOTLOADER_ADDRESS)
    }
}

impl BootloaderDriver {
    pub fn new(bootloader: Address) -> Self {
        Self { bootloader }
    }

    /// Validate, pay (or prepare the sponsor), and execute `tx`.
    ///
    /// All phases share the transaction's gas limit.
    pub fn process(
        &self,
        host: &mut dyn HostInterface,
        account: &SequencerAccount,
        tx: &Transaction,
    ) -> Receipt {
        let mut ctx = CallContext::new(self.bootloader, tx.gas_limit);
        let result = self.run(host, account, tx, &mut ctx);
        info!(
            account = %address_to_hex(&account.address()),
            nonce = tx.nonce,
            success = result.is_ok(),
            "transaction processed"
        );
        receipt(result, ctx.meter.consumed())
    }

    fn run(
        &self,
        host: &mut dyn HostInterface,
        account: &SequencerAccount,
        tx: &Transaction,
        ctx: &mut CallContext,
    ) -> AccountResult<Vec<u8>> {
        let mut stage = SequencerStage::Received;

        let tx_hash = tx.encode_hash(host.chain_id());
        let verdict = account.validate_transaction(host, ctx, &tx_hash, &tx_hash, tx)?;
        stage = stage.advance(SequencerStage::Validated)?;
        if !verdict.is_authorized() {
            return Err(AccountError::InvalidSignature);
        }

        if tx.has_paymaster() {
            account.prepare_for_paymaster(host, ctx, tx)?;
            stage = stage.advance(SequencerStage::SponsorPrepared)?;
        } else {
            account.pay_for_transaction(host, ctx, tx)?;
            stage = stage.advance(SequencerStage::Paid)?;
        }

        let result = account.execute_transaction(host, ctx, tx);
        stage.advance(SequencerStage::Executed)?;
        result
    }
}
