//! Shared test helpers for integration tests.
//!
//! Provides deterministic keypairs, network configs, ledger builders, and
//! intent signing helpers used across all integration test files.

#![allow(dead_code)]

use warden_engine::{
    destinations::{MockToken, NonceHolder, SystemDeployer},
    BootloaderDriver, EntryPointDriver, Ledger, NetworkConfig, ProtocolModel, RelayerAccount,
    SequencerAccount,
};
use warden_primitives::{
    crypto::{deterministic_keypair, sign_personal_digest, SigningKey},
    types::{BOOTLOADER_ADDRESS, NONCE_HOLDER_ADDRESS, ONE_UNIT, SYSTEM_DEPLOYER_ADDRESS},
    Address, Amount, Transaction, UserOperation, U256,
};

pub const RELAYER_CHAIN_ID: u64 = 11_155_111;
pub const SEQUENCER_CHAIN_ID: u64 = 300;

pub const ACCOUNT: Address = [0xac; 20];
pub const ENTRY_POINT: Address = [0xe7; 20];
pub const TOKEN: Address = [0x70; 20];
pub const SINK: Address = [0x5e; 20];

/// Starting balance of every account built here.
pub const STARTING_BALANCE: Amount = 10 * ONE_UNIT;

// ── Deterministic Keypairs ──

/// Alice: seed=1, the owner in every fixture.
pub fn alice() -> (Address, SigningKey) {
    deterministic_keypair(1)
}

/// Bob: seed=2, a legitimate but unprivileged party.
pub fn bob() -> (Address, SigningKey) {
    deterministic_keypair(2)
}

/// Mallory: seed=3, signs things she should not.
pub fn mallory() -> (Address, SigningKey) {
    deterministic_keypair(3)
}

// ── Network configs ──

pub fn relayer_config() -> NetworkConfig {
    NetworkConfig {
        name: "test-relayer".into(),
        chain_id: RELAYER_CHAIN_ID,
        model: ProtocolModel::Relayer,
        driver: ENTRY_POINT,
        owner: alice().0,
    }
}

pub fn sequencer_config() -> NetworkConfig {
    NetworkConfig {
        name: "test-sequencer".into(),
        chain_id: SEQUENCER_CHAIN_ID,
        model: ProtocolModel::Sequencer,
        driver: BOOTLOADER_ADDRESS,
        owner: alice().0,
    }
}

// ── Ledger builders ──

/// A relayer-model ledger with a funded, deployed account and a token.
pub fn relayer_setup() -> (Ledger, RelayerAccount) {
    let mut ledger = Ledger::new(RELAYER_CHAIN_ID)
        .fund(ACCOUNT, STARTING_BALANCE)
        .register(TOKEN, MockToken);
    let account = RelayerAccount::deploy(&mut ledger, ACCOUNT, &relayer_config()).unwrap();
    (ledger, account)
}

/// A sequencer-model ledger with a funded, deployed account, a token, the
/// system deployer, and the nonce registry.
pub fn sequencer_setup() -> (Ledger, SequencerAccount) {
    let mut ledger = Ledger::new(SEQUENCER_CHAIN_ID)
        .fund(ACCOUNT, STARTING_BALANCE)
        .register(TOKEN, MockToken)
        .register(SYSTEM_DEPLOYER_ADDRESS, SystemDeployer)
        .register(NONCE_HOLDER_ADDRESS, NonceHolder);
    let account = SequencerAccount::deploy(&mut ledger, ACCOUNT, &sequencer_config()).unwrap();
    (ledger, account)
}

pub fn entry_point_driver() -> EntryPointDriver {
    EntryPointDriver::new(ENTRY_POINT)
}

pub fn bootloader_driver() -> BootloaderDriver {
    BootloaderDriver::default()
}

// ── Intents ──

/// An unsigned user operation minting `amount` tokens to the account.
pub fn mint_op(nonce: u128, amount: Amount) -> UserOperation {
    UserOperation {
        sender: ACCOUNT,
        nonce,
        destination: TOKEN,
        value: 0,
        payload: MockToken::mint_call(&ACCOUNT, U256::from(amount)),
        account_gas_limits: UserOperation::pack_pair(200_000, 500_000),
        pre_verification_gas: 50_000,
        gas_fees: UserOperation::pack_pair(1, 1_000),
        ..Default::default()
    }
}

/// Sign `op` for `ENTRY_POINT` on the relayer chain.
pub fn sign_op(mut op: UserOperation, key: &SigningKey) -> UserOperation {
    let digest = op.hash(&ENTRY_POINT, RELAYER_CHAIN_ID);
    op.signature = sign_personal_digest(&digest, key).unwrap().to_vec();
    op
}

/// An unsigned transaction minting `amount` tokens to the account.
pub fn mint_tx(nonce: u64, amount: Amount) -> Transaction {
    Transaction {
        from: ACCOUNT,
        to: TOKEN,
        gas_limit: 1_000_000,
        gas_per_pubdata_byte_limit: 800,
        max_fee_per_gas: 1_000,
        nonce,
        data: MockToken::mint_call(&ACCOUNT, U256::from(amount)),
        ..Default::default()
    }
}

/// Sign `tx` for the sequencer chain.
pub fn sign_tx(mut tx: Transaction, key: &SigningKey) -> Transaction {
    let digest = tx.encode_hash(SEQUENCER_CHAIN_ID);
    tx.signature = sign_personal_digest(&digest, key).unwrap().to_vec();
    tx
}

/// Token balance of the account at `TOKEN`.
pub fn token_balance(ledger: &Ledger) -> U256 {
    MockToken::balance_of(ledger, &TOKEN, &ACCOUNT)
}
