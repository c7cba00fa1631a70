//! Mock destinations for tests and drivers.
//!
//! Each destination keeps its state in host storage under its own address,
//! so a reverted call leaves nothing behind.

use alloy_primitives::{Address as SolAddress, U256};
use alloy_sol_types::{SolCall, SolError, SolInterface, SolValue};
use warden_primitives::{
    abi::{from_sol_address, sol_address, sol_hash, IContractDeployer, INonceHolder, IToken, NonceMismatch},
    crypto::keccak256,
    gas::{gas_cost_keccak, gas_cost_storage_get, gas_cost_storage_set, G_EMIT_EVENT, G_NONCE_UPDATE},
    types::SEQUENCER_NONCE_KEY,
    AccountError, AccountResult, Address, CallFrame, CallOutcome, Event, GasMeter, Hash, ZERO_HASH,
};

use crate::host::{Destination, HostInterface};

/// Charge `meter`, or bail out of `invoke` with an out-of-gas revert.
macro_rules! charge {
    ($meter:expr, $cost:expr) => {
        if $meter.consume($cost).is_err() {
            return CallOutcome::revert("out of gas", $meter.limit());
        }
    };
}

/// Minimal fungible token: `mint`, `transfer`, `approve`, `balanceOf`,
/// `allowance`. Minting is open to anyone. Amounts are full 256-bit words.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockToken;

fn balance_slot(holder: &Address) -> Vec<u8> {
    let mut slot = b"balance/".to_vec();
    slot.extend_from_slice(holder);
    slot
}

fn allowance_slot(owner: &Address, spender: &Address) -> Vec<u8> {
    let mut slot = b"allowance/".to_vec();
    slot.extend_from_slice(owner);
    slot.extend_from_slice(spender);
    slot
}

fn read_amount(host: &dyn HostInterface, token: &Address, slot: &[u8]) -> U256 {
    host.storage_get(token, slot)
        .and_then(|bytes| U256::try_from_be_slice(&bytes))
        .unwrap_or(U256::ZERO)
}

fn write_amount(host: &mut dyn HostInterface, token: &Address, slot: &[u8], amount: U256) {
    host.storage_set(token, slot, &amount.to_be_bytes::<32>());
}

impl MockToken {
    pub fn mint_call(to: &Address, amount: U256) -> Vec<u8> {
        IToken::mintCall { to: sol_address(to), amount }.abi_encode()
    }

    pub fn transfer_call(to: &Address, amount: U256) -> Vec<u8> {
        IToken::transferCall { to: sol_address(to), amount }.abi_encode()
    }

    pub fn approve_call(spender: &Address, amount: U256) -> Vec<u8> {
        IToken::approveCall { spender: sol_address(spender), amount }.abi_encode()
    }

    /// Token balance of `holder` at the token deployed at `token`.
    pub fn balance_of(host: &dyn HostInterface, token: &Address, holder: &Address) -> U256 {
        read_amount(host, token, &balance_slot(holder))
    }

    pub fn allowance(
        host: &dyn HostInterface,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> U256 {
        read_amount(host, token, &allowance_slot(owner, spender))
    }

    fn dispatch(
        host: &mut dyn HostInterface,
        frame: &CallFrame,
        meter: &mut GasMeter,
    ) -> AccountResult<Result<Vec<u8>, &'static str>> {
        let Ok(call) = IToken::ITokenCalls::abi_decode(&frame.data, true) else {
            return Ok(Err("unknown selector"));
        };
        let token = frame.target;

        match call {
            IToken::ITokenCalls::mint(IToken::mintCall { to, amount }) => {
                let slot = balance_slot(&from_sol_address(to));
                meter.consume(gas_cost_storage_get(slot.len()))?;
                let Some(balance) = read_amount(host, &token, &slot).checked_add(amount) else {
                    return Ok(Err("balance overflow"));
                };
                meter.consume(gas_cost_storage_set(slot.len(), 32))?;
                write_amount(host, &token, &slot, balance);
                Ok(Ok(true.abi_encode()))
            }
            IToken::ITokenCalls::transfer(IToken::transferCall { to, amount }) => {
                let from_slot = balance_slot(&frame.caller);
                meter.consume(gas_cost_storage_get(from_slot.len()))?;
                let from_balance = read_amount(host, &token, &from_slot);
                if from_balance < amount {
                    return Ok(Err("transfer amount exceeds balance"));
                }
                meter.consume(2 * gas_cost_storage_set(from_slot.len(), 32))?;
                write_amount(host, &token, &from_slot, from_balance - amount);
                let to_slot = balance_slot(&from_sol_address(to));
                let to_balance = read_amount(host, &token, &to_slot).saturating_add(amount);
                write_amount(host, &token, &to_slot, to_balance);
                Ok(Ok(true.abi_encode()))
            }
            IToken::ITokenCalls::approve(IToken::approveCall { spender, amount }) => {
                let spender = from_sol_address(spender);
                let slot = allowance_slot(&frame.caller, &spender);
                meter.consume(gas_cost_storage_set(slot.len(), 32))?;
                write_amount(host, &token, &slot, amount);
                meter.consume(G_EMIT_EVENT)?;
                host.emit_event(
                    Event::new(token, "approval")
                        .with("owner", frame.caller.to_vec())
                        .with("spender", spender.to_vec())
                        .with("amount", amount.to_be_bytes::<32>().to_vec()),
                );
                Ok(Ok(true.abi_encode()))
            }
            IToken::ITokenCalls::balanceOf(IToken::balanceOfCall { holder }) => {
                let slot = balance_slot(&from_sol_address(holder));
                meter.consume(gas_cost_storage_get(slot.len()))?;
                Ok(Ok(read_amount(host, &token, &slot).abi_encode()))
            }
            IToken::ITokenCalls::allowance(IToken::allowanceCall { owner, spender }) => {
                let slot = allowance_slot(&from_sol_address(owner), &from_sol_address(spender));
                meter.consume(gas_cost_storage_get(slot.len()))?;
                Ok(Ok(read_amount(host, &token, &slot).abi_encode()))
            }
        }
    }
}

impl Destination for MockToken {
    fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome {
        if frame.value > 0 {
            return CallOutcome::revert("token is not payable", 0);
        }
        let mut meter = GasMeter::new(frame.gas);
        match Self::dispatch(host, frame, &mut meter) {
            Ok(Ok(data)) => CallOutcome::success(data, meter.consumed()),
            Ok(Err(reason)) => CallOutcome::revert(reason, meter.consumed()),
            Err(e) => CallOutcome::revert(&e.to_string(), meter.consumed()),
        }
    }
}

/// System contract deployer.
///
/// Only reachable through the privileged system-call path. `create2` derives
/// the new address from the caller, salt, and bytecode hash, and refuses to
/// deploy twice to the same address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDeployer;

impl SystemDeployer {
    pub fn create2_call(salt: Hash, bytecode_hash: Hash, input: &[u8]) -> Vec<u8> {
        IContractDeployer::create2Call {
            salt: sol_hash(&salt),
            bytecodeHash: sol_hash(&bytecode_hash),
            input: input.to_vec().into(),
        }
        .abi_encode()
    }

    /// Address `create2` yields for `deployer_caller`.
    pub fn derive_address(deployer_caller: &Address, salt: &Hash, bytecode_hash: &Hash) -> Address {
        let preimage = (sol_address(deployer_caller), sol_hash(salt), sol_hash(bytecode_hash)).abi_encode();
        let digest = keccak256(&preimage);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest[12..]);
        addr
    }

    pub fn is_deployed(host: &dyn HostInterface, deployer: &Address, addr: &Address) -> bool {
        host.storage_get(deployer, &deployed_slot(addr)).is_some()
    }
}

fn deployed_slot(addr: &Address) -> Vec<u8> {
    let mut slot = b"deployed/".to_vec();
    slot.extend_from_slice(addr);
    slot
}

impl Destination for SystemDeployer {
    fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome {
        if !frame.is_system {
            return CallOutcome::revert("deployer requires a system call", 0);
        }
        let mut meter = GasMeter::new(frame.gas);
        let Ok(call) = IContractDeployer::create2Call::abi_decode(&frame.data, true) else {
            return CallOutcome::revert("malformed create2 call", 0);
        };
        let (salt, bytecode_hash) = (call.salt.0, call.bytecodeHash.0);
        if bytecode_hash == ZERO_HASH {
            return CallOutcome::revert("bytecode hash is not known", 0);
        }

        charge!(meter, gas_cost_keccak(96));
        let deployed = Self::derive_address(&frame.caller, &salt, &bytecode_hash);
        let slot = deployed_slot(&deployed);
        charge!(meter, gas_cost_storage_get(slot.len()));
        if host.storage_get(&frame.target, &slot).is_some() {
            return CallOutcome::revert("code already deployed at address", meter.consumed());
        }
        charge!(meter, gas_cost_storage_set(slot.len(), 32));
        host.storage_set(&frame.target, &slot, &bytecode_hash);
        charge!(meter, G_EMIT_EVENT);
        host.emit_event(
            Event::new(frame.target, "contract_deployed")
                .with("deployer", frame.caller.to_vec())
                .with("address", deployed.to_vec())
                .with("bytecode_hash", bytecode_hash.to_vec()),
        );
        CallOutcome::success(sol_address(&deployed).abi_encode(), meter.consumed())
    }
}

/// System nonce registry.
///
/// Accounts system-call `incrementMinNonceIfEquals` to consume their next
/// sequencer nonce. The counter is the host's nonce under
/// [`SEQUENCER_NONCE_KEY`]. A mismatch reverts with a `NonceMismatch` payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonceHolder;

impl NonceHolder {
    pub fn increment_call(expected: u64) -> Vec<u8> {
        INonceHolder::incrementMinNonceIfEqualsCall { expectedNonce: U256::from(expected) }.abi_encode()
    }
}

impl Destination for NonceHolder {
    fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome {
        if !frame.is_system {
            return CallOutcome::revert("nonce holder requires a system call", 0);
        }
        let mut meter = GasMeter::new(frame.gas);
        let Ok(call) = INonceHolder::incrementMinNonceIfEqualsCall::abi_decode(&frame.data, true) else {
            return CallOutcome::revert("malformed nonce call", 0);
        };
        charge!(meter, G_NONCE_UPDATE);
        let Ok(expected) = u64::try_from(call.expectedNonce) else {
            let current = host.nonce_of(&frame.caller, SEQUENCER_NONCE_KEY);
            let payload = NonceMismatch { expected: U256::from(current), got: call.expectedNonce };
            return CallOutcome::failure(payload.abi_encode(), meter.consumed());
        };
        match host.increment_nonce_if_equals(&frame.caller, SEQUENCER_NONCE_KEY, expected) {
            Ok(()) => {}
            Err(AccountError::ReplayRejected { expected: current, got }) => {
                let payload = NonceMismatch { expected: U256::from(current), got: U256::from(got) };
                return CallOutcome::failure(payload.abi_encode(), meter.consumed());
            }
            Err(e) => return CallOutcome::revert(&e.to_string(), meter.consumed()),
        }
        let next = host.nonce_of(&frame.caller, SEQUENCER_NONCE_KEY);
        charge!(meter, G_EMIT_EVENT);
        host.emit_event(
            Event::new(frame.target, "nonce_incremented")
                .with("account", frame.caller.to_vec())
                .with("nonce", next.to_be_bytes().to_vec()),
        );
        CallOutcome::success(U256::from(next).abi_encode(), meter.consumed())
    }
}

/// Reverts every call with a fixed reason.
#[derive(Debug, Clone)]
pub struct RejectingReceiver {
    reason: String,
}

impl RejectingReceiver {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl Destination for RejectingReceiver {
    fn invoke(&mut self, _host: &mut dyn HostInterface, _frame: &CallFrame) -> CallOutcome {
        CallOutcome::revert(&self.reason, 0)
    }
}

/// Decode an address returned as a single word.
pub fn returned_address(data: &[u8]) -> Option<Address> {
    SolAddress::abi_decode(data, true).ok().map(from_sol_address)
}
