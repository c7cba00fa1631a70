//! Per-network configuration.
//!
//! A [`NetworkRegistry`] maps a network key to a [`NetworkConfig`]. The
//! configuration is resolved once and handed to the adapter at deployment;
//! nothing reads it from global state afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_primitives::{types::BOOTLOADER_ADDRESS, Address};

/// Canonical relayer-model entry point (v0.7).
pub const ENTRY_POINT_V07: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";

const DEFAULT_OWNER: &str = "0x643315C9Be056cDEA171F4e7b2222a4ddaB9F88D";
const LOCAL_ENTRY_POINT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const LOCAL_OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("no network configured for chain id {0}")]
    UnknownChain(u64),

    #[error("failed to parse network configuration: {0}")]
    Parse(String),
}

/// Which authorization protocol a network speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolModel {
    /// Entry point driven (ERC-4337 style).
    Relayer,
    /// Bootloader driven (native account abstraction).
    Sequencer,
}

/// Everything an account needs to know about the network it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Registry key; filled from the map key when loading JSON.
    #[serde(default)]
    pub name: String,
    pub chain_id: u64,
    pub model: ProtocolModel,
    /// Entry point (relayer) or bootloader (sequencer).
    #[serde(with = "hex_address")]
    pub driver: Address,
    /// Owner written at deployment.
    #[serde(with = "hex_address")]
    pub owner: Address,
}

mod hex_address {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use warden_primitives::{
        types::{address_from_hex, address_to_hex},
        Address,
    };

    pub fn serialize<S: Serializer>(addr: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&address_to_hex(addr))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        address_from_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid address: {s}")))
    }
}

fn parse_builtin(s: &str) -> Address {
    warden_primitives::types::address_from_hex(s).unwrap_or_default()
}

/// Keyed set of network configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkConfig>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The networks the account ships with.
    pub fn builtin() -> Self {
        let entry_point = parse_builtin(ENTRY_POINT_V07);
        let owner = parse_builtin(DEFAULT_OWNER);
        let mut registry = Self::new();
        registry.insert(NetworkConfig {
            name: "sepolia".into(),
            chain_id: 11_155_111,
            model: ProtocolModel::Relayer,
            driver: entry_point,
            owner,
        });
        registry.insert(NetworkConfig {
            name: "arbitrum-sepolia".into(),
            chain_id: 421_614,
            model: ProtocolModel::Relayer,
            driver: entry_point,
            owner,
        });
        registry.insert(NetworkConfig {
            name: "zksync-sepolia".into(),
            chain_id: 300,
            model: ProtocolModel::Sequencer,
            driver: BOOTLOADER_ADDRESS,
            owner,
        });
        registry.insert(NetworkConfig {
            name: "zksync-mainnet".into(),
            chain_id: 324,
            model: ProtocolModel::Sequencer,
            driver: BOOTLOADER_ADDRESS,
            owner,
        });
        registry.insert(NetworkConfig {
            name: "local".into(),
            chain_id: 31_337,
            model: ProtocolModel::Relayer,
            driver: parse_builtin(LOCAL_ENTRY_POINT),
            owner: parse_builtin(LOCAL_OWNER),
        });
        registry
    }

    /// Load a registry from a JSON object keyed by network name.
    ///
    /// ```json
    /// { "devnet": { "chain_id": 1337, "model": "relayer",
    ///               "driver": "0x…", "owner": "0x…" } }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, NetworkConfig> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut registry = Self::new();
        for (name, mut config) in raw {
            config.name = name;
            registry.insert(config);
        }
        Ok(registry)
    }

    /// Add or replace a network under `config.name`.
    pub fn insert(&mut self, config: NetworkConfig) {
        self.networks.insert(config.name.clone(), config);
    }

    /// Overlay `other` on top of this registry; its entries win.
    pub fn extend(&mut self, other: NetworkRegistry) {
        self.networks.extend(other.networks);
    }

    pub fn resolve(&self, key: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(key)
            .ok_or_else(|| ConfigError::UnknownNetwork(key.to_string()))
    }

    /// First network (in key order) with the given chain id.
    pub fn resolve_chain(&self, chain_id: u64) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .values()
            .find(|c| c.chain_id == chain_id)
            .ok_or(ConfigError::UnknownChain(chain_id))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}
