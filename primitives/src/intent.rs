//! Intent structures and their canonical digests.
//!
//! An intent is the signed, nonce-tagged request an account authorizes and
//! dispatches. The relayer model carries a [`UserOperation`]; the sequencer
//! model carries a [`Transaction`]. Both are immutable once signed, and both
//! digests cover every field except the signature (and, for transactions,
//! the forward-compatible reserved fields).

use alloy_primitives::U256;
use alloy_sol_types::{Eip712Domain, SolStruct, SolValue};
use serde::{Deserialize, Serialize};

use crate::abi::{eip712, sol_address, sol_hash};
use crate::crypto::keccak256;
use crate::types::{Address, Amount, Hash, ZERO_ADDRESS};

/// Relayer-model intent.
///
/// The fee fields are consumed by the entry point, not by the account; they
/// are part of the digest so the owner's signature commits to them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserOperation {
    /// Account the operation acts for.
    pub sender: Address,
    /// Replay counter: high 64 bits are the nonce key, low 64 the sequence.
    pub nonce: u128,
    /// Call target.
    pub destination: Address,
    /// Native funds moved with the call.
    pub value: Amount,
    /// Opaque calldata interpreted by the destination.
    pub payload: Vec<u8>,
    /// Packed verification gas limit (high 16 bytes) and call gas limit (low 16 bytes).
    pub account_gas_limits: [u8; 32],
    /// Gas paid for the bundle overhead.
    pub pre_verification_gas: u64,
    /// Packed max priority fee (high 16 bytes) and max fee (low 16 bytes).
    pub gas_fees: [u8; 32],
    /// Fee sponsor address followed by sponsor data, empty when self-funded.
    pub paymaster_and_data: Vec<u8>,
    /// `r || s || v` owner signature over the personal-message digest.
    pub signature: Vec<u8>,
}

impl UserOperation {
    /// Nonce key (high 64 bits of the replay counter).
    pub fn nonce_key(&self) -> u64 {
        (self.nonce >> 64) as u64
    }

    /// Nonce sequence within its key (low 64 bits of the replay counter).
    pub fn nonce_sequence(&self) -> u64 {
        self.nonce as u64
    }

    /// Build a replay counter from its key and sequence.
    pub fn compose_nonce(key: u64, sequence: u64) -> u128 {
        ((key as u128) << 64) | sequence as u128
    }

    /// Pack two 128-bit values into one word, high half first.
    pub fn pack_pair(high: u128, low: u128) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[..16].copy_from_slice(&high.to_be_bytes());
        word[16..].copy_from_slice(&low.to_be_bytes());
        word
    }

    /// Hash of every field except the signature.
    fn packed_hash(&self) -> Hash {
        let encoded = (
            sol_address(&self.sender),
            U256::from(self.nonce),
            sol_address(&self.destination),
            U256::from(self.value),
            sol_hash(&keccak256(&self.payload)),
            sol_hash(&self.account_gas_limits),
            U256::from(self.pre_verification_gas),
            sol_hash(&self.gas_fees),
            sol_hash(&keccak256(&self.paymaster_and_data)),
        )
            .abi_encode();
        keccak256(&encoded)
    }

    /// The request digest the entry point passes to `validate_user_op`.
    ///
    /// Binds the operation to one entry point on one chain.
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> Hash {
        let encoded = (
            sol_hash(&self.packed_hash()),
            sol_address(entry_point),
            U256::from(chain_id),
        )
            .abi_encode();
        keccak256(&encoded)
    }
}

/// EIP-712 type string for sequencer-model transactions.
pub const TRANSACTION_TYPE: &str = "Transaction(uint256 txType,uint256 from,uint256 to,uint256 gasLimit,uint256 gasPerPubdataByteLimit,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,uint256 paymaster,uint256 nonce,uint256 value,bytes data,bytes32[] factoryDeps,bytes paymasterInput)";

const DOMAIN_NAME: &str = "zkSync";
const DOMAIN_VERSION: &str = "2";

/// Transaction type tag for EIP-712 account transactions.
pub const EIP712_TX_TYPE: u8 = 0x71;

/// Sequencer-model intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction type discriminator.
    pub tx_type: u8,
    /// Account the transaction acts for.
    pub from: Address,
    /// Call target.
    pub to: Address,
    /// Maximum gas the transaction may consume.
    pub gas_limit: u64,
    /// Maximum gas per byte of published data.
    pub gas_per_pubdata_byte_limit: u64,
    /// Maximum fee per unit of gas.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per unit of gas.
    pub max_priority_fee_per_gas: u128,
    /// Fee sponsor, or the zero address when the account pays.
    pub paymaster: Address,
    /// Replay counter.
    pub nonce: u64,
    /// Native funds moved with the call.
    pub value: Amount,
    /// Forward-compatible fixed fields. Never hashed, never interpreted.
    pub reserved: [[u8; 32]; 4],
    /// Opaque calldata interpreted by the destination.
    pub data: Vec<u8>,
    /// `r || s || v` owner signature over the personal-message digest.
    pub signature: Vec<u8>,
    /// Bytecode hashes the destination needs for its own deployment.
    pub factory_deps: Vec<Hash>,
    /// Fee sponsor flow selector and arguments.
    pub paymaster_input: Vec<u8>,
    /// Forward-compatible dynamic field. Never hashed, never interpreted.
    pub reserved_dynamic: Vec<u8>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            tx_type: EIP712_TX_TYPE,
            from: ZERO_ADDRESS,
            to: ZERO_ADDRESS,
            gas_limit: 0,
            gas_per_pubdata_byte_limit: 0,
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            paymaster: ZERO_ADDRESS,
            nonce: 0,
            value: 0,
            reserved: [[0u8; 32]; 4],
            data: Vec::new(),
            signature: Vec::new(),
            factory_deps: Vec::new(),
            paymaster_input: Vec::new(),
            reserved_dynamic: Vec::new(),
        }
    }
}

impl Transaction {
    /// True when a fee sponsor covers this transaction's fee.
    pub fn has_paymaster(&self) -> bool {
        self.paymaster != ZERO_ADDRESS
    }

    /// Worst-case fee: `gas_limit * max_fee_per_gas`. `None` on overflow.
    pub fn max_fee(&self) -> Option<Amount> {
        (self.gas_limit as u128).checked_mul(self.max_fee_per_gas)
    }

    /// Balance the account must hold for this transaction to validate.
    ///
    /// The fee is excluded when a sponsor pays it. `None` on overflow.
    pub fn total_required_balance(&self) -> Option<Amount> {
        let fee = if self.has_paymaster() { 0 } else { self.max_fee()? };
        fee.checked_add(self.value)
    }

    /// The signed view of this transaction.
    pub fn eip712_struct(&self) -> eip712::Transaction {
        eip712::Transaction {
            txType: U256::from(self.tx_type),
            from: U256::from_be_slice(&self.from),
            to: U256::from_be_slice(&self.to),
            gasLimit: U256::from(self.gas_limit),
            gasPerPubdataByteLimit: U256::from(self.gas_per_pubdata_byte_limit),
            maxFeePerGas: U256::from(self.max_fee_per_gas),
            maxPriorityFeePerGas: U256::from(self.max_priority_fee_per_gas),
            paymaster: U256::from_be_slice(&self.paymaster),
            nonce: U256::from(self.nonce),
            value: U256::from(self.value),
            data: self.data.clone().into(),
            factoryDeps: self.factory_deps.iter().map(sol_hash).collect(),
            paymasterInput: self.paymaster_input.clone().into(),
        }
    }

    /// EIP-712 digest of the transaction on `chain_id`.
    pub fn encode_hash(&self, chain_id: u64) -> Hash {
        self.eip712_struct()
            .eip712_signing_hash(&signing_domain(chain_id))
            .0
    }
}

fn signing_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(DOMAIN_NAME.into()),
        Some(DOMAIN_VERSION.into()),
        Some(U256::from(chain_id)),
        None,
        None,
    )
}
