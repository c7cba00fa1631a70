//! Host interface trait: abstraction over the ledger an account runs on.
//!
//! The `HostInterface` trait decouples the account logic from the chain it
//! is deployed on. Accounts see balances, account-local storage, the nonce
//! registry, outbound calls, and an event/log sink; nothing else.
//!
//! - In tests and drivers: implemented by [`Ledger`] (in-memory store)
//! - Destinations with code are plugged in as [`Destination`] trait objects

use std::collections::BTreeMap;

use tracing::{debug, trace};
use warden_primitives::{
    gas::gas_cost_call,
    types::{address_to_hex, u128_from_word, u128_to_word},
    AccountError, AccountResult, Address, Amount, CallFrame, CallOutcome, Event, Gas, LogLine,
    StateOverlay,
};

/// Abstraction over the host environment.
///
/// Every write goes into the innermost open frame. `checkpoint` opens a
/// frame, `commit` folds it into its parent, `revert` drops it together with
/// the events emitted inside it.
pub trait HostInterface {
    /// Chain identifier intents are bound to.
    fn chain_id(&self) -> u64;

    /// Native balance of an address.
    fn balance_of(&self, addr: &Address) -> Amount;

    /// Read an account-local storage slot.
    fn storage_get(&self, owner: &Address, slot: &[u8]) -> Option<Vec<u8>>;

    /// Write an account-local storage slot.
    fn storage_set(&mut self, owner: &Address, slot: &[u8], value: &[u8]);

    /// Current replay counter of `account` under nonce `key`.
    fn nonce_of(&self, account: &Address, key: u64) -> u64;

    /// Advance the counter by one if it currently equals `nonce`.
    ///
    /// A mismatch is `ReplayRejected` and writes nothing.
    fn increment_nonce_if_equals(&mut self, account: &Address, key: u64, nonce: u64)
        -> AccountResult<()>;

    /// Invoke `frame.target`, reporting the outcome instead of failing.
    fn call(&mut self, frame: CallFrame) -> CallOutcome;

    /// Invoke `frame.target` on the privileged path. A revert propagates.
    fn system_call(&mut self, frame: CallFrame) -> Result<CallOutcome, Revert>;

    /// Open a nested atomic frame.
    fn checkpoint(&mut self);

    /// Fold the innermost frame into its parent.
    fn commit(&mut self);

    /// Drop the innermost frame and everything it recorded.
    fn revert(&mut self);

    /// Emit an event.
    fn emit_event(&mut self, event: Event);

    /// Write a debug log line.
    ///
    /// Logs are diagnostics only. Accounts never branch on them.
    fn log(&mut self, level: u32, message: &str);

    /// Events that survived so far.
    fn events(&self) -> &[Event];

    /// Collected log lines.
    fn logs(&self) -> &[LogLine];
}

/// A reverted system call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub return_data: Vec<u8>,
    pub gas_used: Gas,
}

/// Run `body` as one atomic unit: commit on `Ok`, revert on `Err`.
pub fn atomically<T>(
    host: &mut dyn HostInterface,
    body: impl FnOnce(&mut dyn HostInterface) -> AccountResult<T>,
) -> AccountResult<T> {
    host.checkpoint();
    let result = body(&mut *host);
    if result.is_ok() {
        host.commit();
    } else {
        host.revert();
    }
    result
}

/// Code living at an address.
///
/// The host opens a frame around every invocation and reverts it when the
/// outcome is a failure, so a destination may write freely before deciding.
pub trait Destination {
    fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome;
}

// ── Ledger: in-memory host ──

fn balance_key(addr: &Address) -> Vec<u8> {
    let mut key = b"bal/".to_vec();
    key.extend_from_slice(addr);
    key
}

fn nonce_key(account: &Address, key: u64) -> Vec<u8> {
    let mut out = b"nonce/".to_vec();
    out.extend_from_slice(account);
    out.push(b'/');
    out.extend_from_slice(&key.to_be_bytes());
    out
}

fn storage_key(owner: &Address, slot: &[u8]) -> Vec<u8> {
    let mut key = b"store/".to_vec();
    key.extend_from_slice(owner);
    key.push(b'/');
    key.extend_from_slice(slot);
    key
}

/// In-memory host implementation for deterministic testing.
///
/// Uses a `BTreeMap` as the committed state store and a stack of
/// `StateOverlay` frames for nested atomic calls.
pub struct Ledger {
    chain_id: u64,
    /// Committed state.
    committed: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Open frames, innermost last.
    frames: Vec<StateOverlay>,
    /// Event count at each open frame, for truncation on revert.
    event_marks: Vec<usize>,
    /// Registered code by address.
    code: BTreeMap<Address, Box<dyn Destination>>,
    events: Vec<Event>,
    logs: Vec<LogLine>,
}

impl Ledger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            committed: BTreeMap::new(),
            frames: Vec::new(),
            event_marks: Vec::new(),
            code: BTreeMap::new(),
            events: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Credit `amount` to `addr` outside any call.
    pub fn fund(mut self, addr: Address, amount: Amount) -> Self {
        self.deposit(&addr, amount);
        self
    }

    /// Install code at `addr`.
    pub fn register(mut self, addr: Address, destination: impl Destination + 'static) -> Self {
        self.install(addr, Box::new(destination));
        self
    }

    pub fn install(&mut self, addr: Address, destination: Box<dyn Destination>) {
        self.code.insert(addr, destination);
    }

    pub fn has_code(&self, addr: &Address) -> bool {
        self.code.contains_key(addr)
    }

    /// Credit `amount` to `addr` without a counterparty.
    pub fn deposit(&mut self, addr: &Address, amount: Amount) {
        let balance = self.balance_of(addr).saturating_add(amount);
        self.write(balance_key(addr), u128_to_word(balance).to_vec());
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Access committed state for assertions.
    pub fn committed_state(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.committed
    }

    fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(key))
            .or_else(|| self.committed.get(key))
            .cloned()
    }

    fn write(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.frames.last_mut() {
            Some(frame) => frame.set(key, value),
            None => {
                self.committed.insert(key, value);
            }
        }
    }

    fn read_u128(&self, key: &[u8]) -> u128 {
        self.read(key)
            .and_then(|bytes| <[u8; 32]>::try_from(bytes.as_slice()).ok())
            .and_then(|word| u128_from_word(&word))
            .unwrap_or(0)
    }

    /// Move native funds. Fails without writing when `from` cannot cover it.
    fn move_value(&mut self, from: &Address, to: &Address, amount: Amount) -> bool {
        if amount == 0 {
            return true;
        }
        let available = self.balance_of(from);
        if available < amount {
            return false;
        }
        self.write(balance_key(from), u128_to_word(available - amount).to_vec());
        let credited = self.balance_of(to).saturating_add(amount);
        self.write(balance_key(to), u128_to_word(credited).to_vec());
        self.emit_event(
            Event::new(*from, "transfer")
                .with("from", from.to_vec())
                .with("to", to.to_vec())
                .with("amount", amount.to_be_bytes().to_vec()),
        );
        true
    }
}

impl HostInterface for Ledger {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn balance_of(&self, addr: &Address) -> Amount {
        self.read_u128(&balance_key(addr))
    }

    fn storage_get(&self, owner: &Address, slot: &[u8]) -> Option<Vec<u8>> {
        self.read(&storage_key(owner, slot))
    }

    fn storage_set(&mut self, owner: &Address, slot: &[u8], value: &[u8]) {
        self.write(storage_key(owner, slot), value.to_vec());
    }

    fn nonce_of(&self, account: &Address, key: u64) -> u64 {
        self.read_u128(&nonce_key(account, key)) as u64
    }

    fn increment_nonce_if_equals(
        &mut self,
        account: &Address,
        key: u64,
        nonce: u64,
    ) -> AccountResult<()> {
        let current = self.nonce_of(account, key);
        if current != nonce {
            return Err(AccountError::ReplayRejected {
                expected: current,
                got: nonce,
            });
        }
        let next = current.checked_add(1).ok_or(AccountError::ReplayRejected {
            expected: current,
            got: nonce,
        })?;
        self.write(nonce_key(account, key), u128_to_word(next as u128).to_vec());
        Ok(())
    }

    fn call(&mut self, frame: CallFrame) -> CallOutcome {
        let base = gas_cost_call(frame.value > 0);
        if frame.gas < base {
            return CallOutcome::revert("out of gas", frame.gas);
        }

        trace!(
            caller = %address_to_hex(&frame.caller),
            target = %address_to_hex(&frame.target),
            value = frame.value,
            system = frame.is_system,
            "call"
        );

        self.checkpoint();
        if !self.move_value(&frame.caller, &frame.target, frame.value) {
            self.revert();
            return CallOutcome::revert("insufficient balance for transfer", base);
        }

        let forwarded = frame.gas - base;
        let mut outcome = match self.code.remove(&frame.target) {
            Some(mut destination) => {
                let inner = CallFrame {
                    gas: forwarded,
                    ..frame.clone()
                };
                let outcome = destination.invoke(self, &inner);
                self.code.entry(frame.target).or_insert(destination);
                outcome
            }
            None => CallOutcome::success(Vec::new(), 0),
        };
        outcome.gas_used = base + outcome.gas_used.min(forwarded);

        if outcome.success {
            self.commit();
        } else {
            debug!(target = %address_to_hex(&frame.target), "call reverted");
            self.revert();
        }
        outcome
    }

    fn system_call(&mut self, frame: CallFrame) -> Result<CallOutcome, Revert> {
        let outcome = self.call(frame.system());
        if outcome.success {
            Ok(outcome)
        } else {
            Err(Revert {
                return_data: outcome.return_data,
                gas_used: outcome.gas_used,
            })
        }
    }

    fn checkpoint(&mut self) {
        self.frames.push(StateOverlay::new());
        self.event_marks.push(self.events.len());
    }

    fn commit(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.event_marks.pop();
        match self.frames.last_mut() {
            Some(parent) => parent.merge(frame),
            None => self.committed.extend(frame.drain()),
        }
    }

    fn revert(&mut self) {
        if self.frames.pop().is_some() {
            if let Some(mark) = self.event_marks.pop() {
                self.events.truncate(mark);
            }
        }
    }

    fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    fn log(&mut self, level: u32, message: &str) {
        self.logs.push(LogLine {
            level,
            message: message.to_string(),
        });
    }

    fn events(&self) -> &[Event] {
        &self.events
    }

    fn logs(&self) -> &[LogLine] {
        &self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_primitives::gas::{G_CALL, G_CALL_VALUE};

    const A: Address = [0xaa; 20];
    const B: Address = [0xbb; 20];

    struct Echo;

    impl Destination for Echo {
        fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome {
            host.storage_set(&frame.target, b"last", &frame.data);
            CallOutcome::success(frame.data.clone(), 100)
        }
    }

    struct Fails;

    impl Destination for Fails {
        fn invoke(&mut self, host: &mut dyn HostInterface, frame: &CallFrame) -> CallOutcome {
            host.storage_set(&frame.target, b"touched", b"1");
            host.emit_event(Event::new(frame.target, "attempt"));
            CallOutcome::revert("no", 50)
        }
    }

    #[test]
    fn test_ledger_storage_roundtrip() {
        let mut host = Ledger::new(1);
        assert_eq!(host.storage_get(&A, b"slot"), None);

        host.storage_set(&A, b"slot", b"value");
        assert_eq!(host.storage_get(&A, b"slot"), Some(b"value".to_vec()));
        // Slots are namespaced per account.
        assert_eq!(host.storage_get(&B, b"slot"), None);
    }

    #[test]
    fn test_checkpoint_revert_discards_writes_and_events() {
        let mut host = Ledger::new(1).fund(A, 100);
        host.checkpoint();
        host.storage_set(&A, b"k", b"v");
        host.emit_event(Event::new(A, "scratch"));
        host.revert();

        assert_eq!(host.storage_get(&A, b"k"), None);
        assert!(host.events().is_empty());
        assert_eq!(host.depth(), 0);
    }

    #[test]
    fn test_nested_commit_reaches_committed_state() {
        let mut host = Ledger::new(1);
        host.checkpoint();
        host.checkpoint();
        host.storage_set(&A, b"k", b"v");
        host.commit();
        assert!(host.committed_state().is_empty());
        host.commit();
        assert_eq!(host.storage_get(&A, b"k"), Some(b"v".to_vec()));
        assert!(!host.committed_state().is_empty());
    }

    #[test]
    fn test_nonce_compare_and_advance() {
        let mut host = Ledger::new(1);
        assert_eq!(host.nonce_of(&A, 0), 0);
        host.increment_nonce_if_equals(&A, 0, 0).unwrap();
        assert_eq!(host.nonce_of(&A, 0), 1);

        let err = host.increment_nonce_if_equals(&A, 0, 0).unwrap_err();
        assert!(matches!(err, AccountError::ReplayRejected { expected: 1, got: 0 }));
        assert_eq!(host.nonce_of(&A, 0), 1);

        // Independent keys have independent counters.
        assert_eq!(host.nonce_of(&A, 7), 0);
    }

    #[test]
    fn test_plain_transfer_to_address_without_code() {
        let mut host = Ledger::new(1).fund(A, 1_000);
        let outcome = host.call(CallFrame::transfer(A, B, 400, 100_000));

        assert!(outcome.success);
        assert_eq!(outcome.gas_used, G_CALL + G_CALL_VALUE);
        assert_eq!(host.balance_of(&A), 600);
        assert_eq!(host.balance_of(&B), 400);
        assert_eq!(host.events().len(), 1);
        assert_eq!(host.events()[0].event_type, "transfer");
    }

    #[test]
    fn test_zero_value_call_is_noop_success() {
        let mut host = Ledger::new(1);
        let outcome = host.call(CallFrame::transfer(A, B, 0, 100_000));
        assert!(outcome.success);
        assert!(outcome.return_data.is_empty());
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_unfunded_transfer_fails_without_writes() {
        let mut host = Ledger::new(1).fund(A, 10);
        let outcome = host.call(CallFrame::transfer(A, B, 11, 100_000));
        assert!(!outcome.success);
        assert_eq!(host.balance_of(&A), 10);
        assert_eq!(host.balance_of(&B), 0);
    }

    #[test]
    fn test_call_into_code() {
        let mut host = Ledger::new(1).register(B, Echo);
        let outcome = host.call(CallFrame::call(A, B, 0, b"ping".to_vec(), 100_000));

        assert!(outcome.success);
        assert_eq!(outcome.return_data, b"ping");
        assert_eq!(outcome.gas_used, G_CALL + 100);
        assert_eq!(host.storage_get(&B, b"last"), Some(b"ping".to_vec()));
        assert!(host.has_code(&B));
    }

    #[test]
    fn test_failed_call_rolls_back_value_and_writes() {
        let mut host = Ledger::new(1).fund(A, 500).register(B, Fails);
        let outcome = host.call(CallFrame::call(A, B, 200, vec![], 100_000));

        assert!(!outcome.success);
        assert_eq!(outcome.return_data, b"no");
        assert_eq!(host.balance_of(&A), 500);
        assert_eq!(host.storage_get(&B, b"touched"), None);
        assert!(host.events().is_empty());
    }

    #[test]
    fn test_system_call_propagates_revert() {
        let mut host = Ledger::new(1).register(B, Fails);
        let revert = host
            .system_call(CallFrame::call(A, B, 0, vec![], 100_000))
            .unwrap_err();
        assert_eq!(revert.return_data, b"no");
    }

    #[test]
    fn test_call_without_base_gas() {
        let mut host = Ledger::new(1).register(B, Echo);
        let outcome = host.call(CallFrame::call(A, B, 0, vec![], G_CALL - 1));
        assert!(!outcome.success);
        assert_eq!(outcome.gas_used, G_CALL - 1);
        assert_eq!(host.storage_get(&B, b"last"), None);
    }

    #[test]
    fn test_atomically_commits_or_reverts() {
        let mut host = Ledger::new(1);
        let ok: AccountResult<()> = atomically(&mut host, |h| {
            h.storage_set(&A, b"a", b"1");
            Ok(())
        });
        assert!(ok.is_ok());

        let err: AccountResult<()> = atomically(&mut host, |h| {
            h.storage_set(&A, b"b", b"2");
            Err(AccountError::InvalidOwner)
        });
        assert!(err.is_err());

        assert_eq!(host.storage_get(&A, b"a"), Some(b"1".to_vec()));
        assert_eq!(host.storage_get(&A, b"b"), None);
        assert_eq!(host.depth(), 0);
    }

    #[test]
    fn test_log_lines_recorded() {
        let mut host = Ledger::new(1);
        host.log(2, "hello");
        assert_eq!(host.logs().len(), 1);
        assert_eq!(host.logs()[0].message, "hello");
    }
}
