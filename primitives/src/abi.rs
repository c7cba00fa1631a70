//! Solidity interfaces spoken across the call boundary.
//!
//! Calldata is built and parsed with `alloy-sol-types`. Accounts keep
//! addresses and hashes as plain byte arrays; the helpers at the bottom
//! bridge them to alloy's types.

use alloy_primitives::{Address as SolAddress, B256};
use alloy_sol_types::sol;

use crate::types::{Address, Hash};

sol! {
    #![sol(extra_derives(Debug))]

    /// Fee sponsor flows carried in a transaction's `paymaster_input`.
    #[sol(all_derives)]
    interface IPaymasterFlow {
        function general(bytes input) external;
        function approvalBased(address token, uint256 minAllowance, bytes innerInput) external;
    }

    /// Fungible token surface used by the approval flow and the mock token.
    #[sol(all_derives)]
    interface IToken {
        function mint(address to, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address holder) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    /// System contract deployer.
    #[sol(all_derives)]
    interface IContractDeployer {
        function create2(bytes32 salt, bytes32 bytecodeHash, bytes input) external returns (address);
    }

    /// System nonce registry. Returns the caller's advanced nonce.
    #[sol(all_derives)]
    interface INonceHolder {
        function incrementMinNonceIfEquals(uint256 expectedNonce) external returns (uint256);
    }

    /// Revert payload of the nonce registry on a mismatch.
    #[sol(all_derives)]
    error NonceMismatch(uint256 expected, uint256 got);
}

/// EIP-712 struct definitions for signed intents.
pub mod eip712 {
    alloy_sol_types::sol! {
        /// Sequencer-model account transaction. Addresses are carried as `uint256`.
        struct Transaction {
            uint256 txType;
            uint256 from;
            uint256 to;
            uint256 gasLimit;
            uint256 gasPerPubdataByteLimit;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            uint256 paymaster;
            uint256 nonce;
            uint256 value;
            bytes data;
            bytes32[] factoryDeps;
            bytes paymasterInput;
        }
    }
}

pub fn sol_address(addr: &Address) -> SolAddress {
    SolAddress::from(*addr)
}

pub fn from_sol_address(addr: SolAddress) -> Address {
    addr.into_array()
}

pub fn sol_hash(hash: &Hash) -> B256 {
    B256::from(*hash)
}

/// Leading 4-byte selector of `data`, if it has one.
pub fn selector_of(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4)?.try_into().ok()
}
