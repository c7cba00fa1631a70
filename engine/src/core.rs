//! Account authorization core, shared by both protocol adapters.
//!
//! The core knows nothing about entry points or bootloaders. It owns the
//! account's owner slot and implements the four authorization steps (replay
//! check, funds check, signature check, settlement) plus the single outbound
//! dispatch. Adapters decide which steps run, in what order, and who may ask.
//!
//! Nothing in here opens an atomic frame; the adapter entry point wraps each
//! call sequence in [`atomically`](crate::host::atomically).

use alloy_primitives::U256;
use alloy_sol_types::{SolError, SolValue};
use tracing::debug;
use warden_primitives::{
    abi::NonceMismatch,
    crypto::{recover_signer, to_personal_message_digest},
    execution::LOG_DEBUG,
    gas::{gas_cost_keccak, gas_cost_storage_get, G_ECRECOVER, G_NONCE_UPDATE},
    types::{address_to_hex, NONCE_HOLDER_ADDRESS, SEQUENCER_NONCE_KEY},
    AccountError, AccountResult, Address, Amount, CallFrame, Event, GasMeter, Hash, Verdict,
    ZERO_ADDRESS,
};

use crate::destinations::NonceHolder;
use crate::guard::{require_caller, CallerRole};
use crate::host::HostInterface;

/// Account-local storage slot holding the owner address.
pub const OWNER_SLOT: &[u8] = b"owner";

/// How [`AuthorizationCore::dispatch`] reaches the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRoute {
    /// Ordinary call; failure comes back as a flag.
    Plain,
    /// Privileged system call; failure comes back as a propagated revert.
    System,
}

/// Authorization and dispatch logic bound to one account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationCore {
    account: Address,
}

impl AuthorizationCore {
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Set the first owner. Called once, at deployment.
    pub fn initialize(&self, host: &mut dyn HostInterface, owner: Address) -> AccountResult<()> {
        if owner == ZERO_ADDRESS {
            return Err(AccountError::InvalidOwner);
        }
        self.write_owner(host, ZERO_ADDRESS, owner);
        Ok(())
    }

    /// Current owner, or the zero address before initialization.
    pub fn owner(&self, host: &dyn HostInterface) -> AccountResult<Address> {
        match host.storage_get(&self.account, OWNER_SLOT) {
            None => Ok(ZERO_ADDRESS),
            Some(bytes) => Address::try_from(bytes.as_slice())
                .map_err(|_| AccountError::InvalidEncoding("owner slot is not an address".into())),
        }
    }

    /// Hand the account to `new_owner`. Only the current owner may call this.
    pub fn transfer_ownership(
        &self,
        host: &mut dyn HostInterface,
        caller: &Address,
        new_owner: Address,
    ) -> AccountResult<()> {
        let previous = self.owner(host)?;
        require_caller(caller, &[(CallerRole::Owner, previous)], "owner")?;
        if new_owner == ZERO_ADDRESS {
            return Err(AccountError::InvalidOwner);
        }
        self.write_owner(host, previous, new_owner);
        Ok(())
    }

    fn write_owner(&self, host: &mut dyn HostInterface, previous: Address, owner: Address) {
        host.storage_set(&self.account, OWNER_SLOT, &owner);
        host.emit_event(
            Event::new(self.account, "ownership_transferred")
                .with("previous_owner", previous.to_vec())
                .with("new_owner", owner.to_vec()),
        );
    }

    /// Accept `nonce` under `key` and advance the counter, or fail with
    /// `ReplayRejected` without writing anything.
    pub fn check_replay(
        &self,
        host: &mut dyn HostInterface,
        key: u64,
        nonce: u64,
        meter: &mut GasMeter,
    ) -> AccountResult<()> {
        meter.consume(G_NONCE_UPDATE)?;
        host.increment_nonce_if_equals(&self.account, key, nonce)
    }

    /// Consume `nonce` through the system nonce registry.
    ///
    /// The registry's revert, or a reply that is not the advanced nonce, is
    /// `ReplayRejected`. Its writes are rolled back by the host on revert.
    pub fn check_replay_system(
        &self,
        host: &mut dyn HostInterface,
        nonce: u64,
        meter: &mut GasMeter,
    ) -> AccountResult<()> {
        let frame = CallFrame::call(
            self.account,
            NONCE_HOLDER_ADDRESS,
            0,
            NonceHolder::increment_call(nonce),
            meter.remaining(),
        );
        let rejected = |host: &dyn HostInterface| AccountError::ReplayRejected {
            expected: host.nonce_of(&self.account, SEQUENCER_NONCE_KEY),
            got: nonce,
        };
        match host.system_call(frame) {
            Ok(outcome) => {
                meter.absorb(outcome.gas_used);
                let advanced = U256::abi_decode(&outcome.return_data, true).ok();
                if advanced != Some(U256::from(nonce) + U256::from(1u64)) {
                    debug!(account = %address_to_hex(&self.account), nonce, "nonce registry did not advance");
                    return Err(rejected(&*host));
                }
                Ok(())
            }
            Err(revert) => {
                meter.absorb(revert.gas_used);
                debug!(account = %address_to_hex(&self.account), nonce, "nonce registry reverted");
                match NonceMismatch::abi_decode(&revert.return_data, true) {
                    Ok(mismatch) => Err(AccountError::ReplayRejected {
                        expected: u64::try_from(mismatch.expected).unwrap_or(u64::MAX),
                        got: nonce,
                    }),
                    Err(_) => Err(rejected(&*host)),
                }
            }
        }
    }

    /// Fail with `InsufficientFunds` unless the balance covers `required`.
    ///
    /// `None` stands for a requirement that overflowed while being computed.
    pub fn require_funds(&self, host: &dyn HostInterface, required: Option<Amount>) -> AccountResult<()> {
        let available = host.balance_of(&self.account);
        match required {
            Some(required) if required <= available => Ok(()),
            required => Err(AccountError::InsufficientFunds {
                required: required.unwrap_or(Amount::MAX),
                available,
            }),
        }
    }

    /// Check an owner signature over `digest`.
    ///
    /// The digest is wrapped in the personal-message form before recovery.
    /// A wrong, malformed, or unrecoverable signature is `Rejected`; only
    /// running out of gas is an error.
    pub fn authorize(
        &self,
        host: &mut dyn HostInterface,
        digest: &Hash,
        signature: &[u8],
        meter: &mut GasMeter,
    ) -> AccountResult<Verdict> {
        meter.consume(gas_cost_storage_get(OWNER_SLOT.len()))?;
        let owner = self.owner(host)?;
        meter.consume(gas_cost_keccak(60))?;
        meter.consume(G_ECRECOVER)?;
        let signer = recover_signer(&to_personal_message_digest(digest), signature);
        let verdict = Verdict::from_signer(signer, &owner);

        debug!(
            account = %address_to_hex(&self.account),
            signer = ?signer.map(|s| address_to_hex(&s)),
            %verdict,
            "signature checked"
        );
        host.log(LOG_DEBUG, &format!("verdict {verdict}"));
        Ok(verdict)
    }

    /// Pay `amount` to `recipient` with all remaining gas.
    ///
    /// Zero is a no-op: no call, no event. A balance shortfall is
    /// `InsufficientFunds`; a refused transfer is `SettlementFailed`.
    pub fn settle(
        &self,
        host: &mut dyn HostInterface,
        recipient: &Address,
        amount: Amount,
        meter: &mut GasMeter,
    ) -> AccountResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.require_funds(host, Some(amount))?;
        let outcome = host.call(CallFrame::transfer(
            self.account,
            *recipient,
            amount,
            meter.remaining(),
        ));
        meter.absorb(outcome.gas_used);
        if !outcome.success {
            return Err(AccountError::SettlementFailed { amount });
        }
        debug!(to = %address_to_hex(recipient), amount, "settled");
        Ok(())
    }

    /// Invoke `destination` exactly once, forwarding all remaining gas.
    ///
    /// Both routes report failure the same way: `DispatchFailed` carrying the
    /// destination's raw return data.
    pub fn dispatch(
        &self,
        host: &mut dyn HostInterface,
        destination: &Address,
        value: Amount,
        payload: &[u8],
        route: DispatchRoute,
        meter: &mut GasMeter,
    ) -> AccountResult<Vec<u8>> {
        let frame = CallFrame::call(
            self.account,
            *destination,
            value,
            payload.to_vec(),
            meter.remaining(),
        );
        let result = match route {
            DispatchRoute::Plain => {
                let outcome = host.call(frame);
                meter.absorb(outcome.gas_used);
                if outcome.success {
                    Ok(outcome.return_data)
                } else {
                    Err(outcome.return_data)
                }
            }
            DispatchRoute::System => match host.system_call(frame) {
                Ok(outcome) => {
                    meter.absorb(outcome.gas_used);
                    Ok(outcome.return_data)
                }
                Err(revert) => {
                    meter.absorb(revert.gas_used);
                    Err(revert.return_data)
                }
            },
        };
        result.map_err(|return_data| {
            debug!(
                destination = %address_to_hex(destination),
                ?route,
                "dispatch failed"
            );
            AccountError::DispatchFailed { return_data }
        })
    }

    /// EIP-1271 check of an owner signature over `hash`.
    pub fn is_valid_signature(
        &self,
        host: &dyn HostInterface,
        hash: &Hash,
        signature: &[u8],
    ) -> AccountResult<[u8; 4]> {
        let owner = self.owner(host)?;
        let signer = recover_signer(&to_personal_message_digest(hash), signature);
        Ok(Verdict::from_signer(signer, &owner).eip1271())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::RejectingReceiver;
    use crate::host::Ledger;
    use warden_primitives::{
        crypto::{deterministic_keypair, keccak256, sign_digest, sign_personal_digest},
        verdict::{EIP1271_FAILURE, EIP1271_SUCCESS_MAGIC},
    };

    const ACCOUNT: Address = [0xac; 20];
    const DRIVER: Address = [0xd0; 20];

    fn setup() -> (Ledger, AuthorizationCore, Address, warden_primitives::crypto::SigningKey) {
        let (owner, key) = deterministic_keypair(1);
        let mut host = Ledger::new(1).fund(ACCOUNT, 1_000);
        let core = AuthorizationCore::new(ACCOUNT);
        core.initialize(&mut host, owner).unwrap();
        (host, core, owner, key)
    }

    #[test]
    fn test_initialize_writes_owner_and_event() {
        let (host, core, owner, _) = setup();
        assert_eq!(core.owner(&host).unwrap(), owner);
        assert_eq!(host.events().len(), 1);
        assert_eq!(host.events()[0].event_type, "ownership_transferred");
        assert_eq!(host.events()[0].attribute("new_owner"), Some(&owner[..]));
    }

    #[test]
    fn test_initialize_rejects_zero_owner() {
        let mut host = Ledger::new(1);
        let err = AuthorizationCore::new(ACCOUNT)
            .initialize(&mut host, ZERO_ADDRESS)
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidOwner));
    }

    #[test]
    fn test_transfer_ownership_owner_only() {
        let (mut host, core, owner, _) = setup();
        let (bob, _) = deterministic_keypair(2);

        let err = core.transfer_ownership(&mut host, &bob, bob).unwrap_err();
        assert!(matches!(err, AccountError::CallerNotAuthorized { .. }));

        let err = core.transfer_ownership(&mut host, &owner, ZERO_ADDRESS).unwrap_err();
        assert!(matches!(err, AccountError::InvalidOwner));

        core.transfer_ownership(&mut host, &owner, bob).unwrap();
        assert_eq!(core.owner(&host).unwrap(), bob);
    }

    #[test]
    fn test_authorize_owner_and_stranger() {
        let (mut host, core, _, key) = setup();
        let digest = keccak256(b"intent");
        let mut meter = GasMeter::unlimited();

        let sig = sign_personal_digest(&digest, &key).unwrap();
        assert_eq!(core.authorize(&mut host, &digest, &sig, &mut meter).unwrap(), Verdict::Authorized);

        let (_, stranger) = deterministic_keypair(9);
        let sig = sign_personal_digest(&digest, &stranger).unwrap();
        assert_eq!(core.authorize(&mut host, &digest, &sig, &mut meter).unwrap(), Verdict::Rejected);
    }

    #[test]
    fn test_authorize_requires_personal_message_wrapping() {
        let (mut host, core, _, key) = setup();
        let digest = keccak256(b"intent");
        let raw = sign_digest(&digest, &key).unwrap();
        let verdict = core
            .authorize(&mut host, &digest, &raw, &mut GasMeter::unlimited())
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected);
    }

    #[test]
    fn test_malformed_signature_is_rejected_not_error() {
        let (mut host, core, _, _) = setup();
        let digest = keccak256(b"intent");
        for sig in [vec![], vec![0u8; 64], vec![0xff; 65]] {
            let verdict = core
                .authorize(&mut host, &digest, &sig, &mut GasMeter::unlimited())
                .unwrap();
            assert_eq!(verdict, Verdict::Rejected);
        }
    }

    #[test]
    fn test_authorize_out_of_gas() {
        let (mut host, core, _, key) = setup();
        let digest = keccak256(b"intent");
        let sig = sign_personal_digest(&digest, &key).unwrap();
        let err = core
            .authorize(&mut host, &digest, &sig, &mut GasMeter::new(100))
            .unwrap_err();
        assert!(matches!(err, AccountError::OutOfGas { .. }));
    }

    #[test]
    fn test_check_replay_advances_once() {
        let (mut host, core, _, _) = setup();
        let mut meter = GasMeter::unlimited();
        core.check_replay(&mut host, 0, 0, &mut meter).unwrap();
        let err = core.check_replay(&mut host, 0, 0, &mut meter).unwrap_err();
        assert!(matches!(err, AccountError::ReplayRejected { expected: 1, got: 0 }));
        assert_eq!(host.nonce_of(&ACCOUNT, 0), 1);
    }

    #[test]
    fn test_check_replay_system_goes_through_registry() {
        let (host, core, _, _) = setup();
        let mut host = host.register(NONCE_HOLDER_ADDRESS, NonceHolder);
        let mut meter = GasMeter::new(1_000_000);

        core.check_replay_system(&mut host, 0, &mut meter).unwrap();
        assert_eq!(host.nonce_of(&ACCOUNT, SEQUENCER_NONCE_KEY), 1);
        assert!(meter.consumed() >= G_NONCE_UPDATE);
        assert!(host.events().iter().any(|e| e.event_type == "nonce_incremented"));

        let err = core.check_replay_system(&mut host, 0, &mut meter).unwrap_err();
        assert!(matches!(err, AccountError::ReplayRejected { expected: 1, got: 0 }));
    }

    #[test]
    fn test_check_replay_system_honours_reverting_registry() {
        let (host, core, _, _) = setup();
        let mut host = host.register(NONCE_HOLDER_ADDRESS, RejectingReceiver::new("frozen"));
        let err = core
            .check_replay_system(&mut host, 0, &mut GasMeter::new(1_000_000))
            .unwrap_err();
        assert!(matches!(err, AccountError::ReplayRejected { expected: 0, got: 0 }));
        assert_eq!(host.nonce_of(&ACCOUNT, SEQUENCER_NONCE_KEY), 0);
    }

    #[test]
    fn test_check_replay_system_without_registry_is_rejected() {
        let (mut host, core, _, _) = setup();
        let err = core
            .check_replay_system(&mut host, 0, &mut GasMeter::new(1_000_000))
            .unwrap_err();
        assert!(matches!(err, AccountError::ReplayRejected { .. }));
    }

    #[test]
    fn test_settle_zero_is_noop() {
        let (mut host, core, _, _) = setup();
        let before = host.events().len();
        core.settle(&mut host, &DRIVER, 0, &mut GasMeter::unlimited()).unwrap();
        assert_eq!(host.events().len(), before);
        assert_eq!(host.balance_of(&ACCOUNT), 1_000);
    }

    #[test]
    fn test_settle_pays_exact_amount() {
        let (mut host, core, _, _) = setup();
        core.settle(&mut host, &DRIVER, 250, &mut GasMeter::unlimited()).unwrap();
        assert_eq!(host.balance_of(&ACCOUNT), 750);
        assert_eq!(host.balance_of(&DRIVER), 250);
    }

    #[test]
    fn test_settle_shortfall_and_refusal() {
        let (mut host, core, _, _) = setup();
        let err = core
            .settle(&mut host, &DRIVER, 5_000, &mut GasMeter::unlimited())
            .unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { required: 5_000, available: 1_000 }));

        host.install(DRIVER, Box::new(RejectingReceiver::new("no thanks")));
        let err = core
            .settle(&mut host, &DRIVER, 10, &mut GasMeter::unlimited())
            .unwrap_err();
        assert!(matches!(err, AccountError::SettlementFailed { amount: 10 }));
        assert_eq!(host.balance_of(&ACCOUNT), 1_000);
    }

    #[test]
    fn test_require_funds_overflow() {
        let (host, core, _, _) = setup();
        let err = core.require_funds(&host, None).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { required: Amount::MAX, .. }));
        assert!(core.require_funds(&host, Some(1_000)).is_ok());
    }

    #[test]
    fn test_dispatch_routes_report_uniformly() {
        let (mut host, core, _, _) = setup();
        host.install(DRIVER, Box::new(RejectingReceiver::new("boom")));
        let mut meter = GasMeter::unlimited();

        for route in [DispatchRoute::Plain, DispatchRoute::System] {
            let err = core
                .dispatch(&mut host, &DRIVER, 0, b"", route, &mut meter)
                .unwrap_err();
            assert_eq!(err.return_data(), b"boom");
        }
    }

    #[test]
    fn test_dispatch_to_empty_address_is_noop() {
        let (mut host, core, _, _) = setup();
        let data = core
            .dispatch(&mut host, &[0x55; 20], 0, b"", DispatchRoute::Plain, &mut GasMeter::unlimited())
            .unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_is_valid_signature() {
        let (host, core, _, key) = setup();
        let hash = keccak256(b"message");
        let sig = sign_personal_digest(&hash, &key).unwrap();
        assert_eq!(core.is_valid_signature(&host, &hash, &sig).unwrap(), EIP1271_SUCCESS_MAGIC);

        let (_, other) = deterministic_keypair(4);
        let sig = sign_personal_digest(&hash, &other).unwrap();
        assert_eq!(core.is_valid_signature(&host, &hash, &sig).unwrap(), EIP1271_FAILURE);
    }
}
