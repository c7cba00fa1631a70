//! Network configuration: built-in table, JSON loading, and deployment
//! from a resolved config.

mod common;

use common::*;
use warden_engine::{
    config::ENTRY_POINT_V07, ConfigError, HostInterface, Ledger, NetworkRegistry, ProtocolModel,
    RelayerAccount, SequencerAccount,
};
use warden_primitives::{
    types::{address_from_hex, BOOTLOADER_ADDRESS},
    AccountError, ZERO_ADDRESS,
};

#[test]
fn test_builtin_networks_resolve() {
    let registry = NetworkRegistry::builtin();

    let sepolia = registry.resolve("sepolia").unwrap();
    assert_eq!(sepolia.chain_id, 11_155_111);
    assert_eq!(sepolia.model, ProtocolModel::Relayer);
    assert_eq!(Some(sepolia.driver), address_from_hex(ENTRY_POINT_V07));

    let zksync = registry.resolve("zksync-sepolia").unwrap();
    assert_eq!(zksync.chain_id, 300);
    assert_eq!(zksync.model, ProtocolModel::Sequencer);
    assert_eq!(zksync.driver, BOOTLOADER_ADDRESS);

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(
        names,
        vec!["arbitrum-sepolia", "local", "sepolia", "zksync-mainnet", "zksync-sepolia"]
    );
}

#[test]
fn test_unknown_network_fails() {
    let registry = NetworkRegistry::builtin();
    assert_eq!(
        registry.resolve("mainnet-ish"),
        Err(ConfigError::UnknownNetwork("mainnet-ish".into()))
    );
    assert_eq!(registry.resolve_chain(999), Err(ConfigError::UnknownChain(999)));
}

#[test]
fn test_resolve_by_chain_id() {
    let registry = NetworkRegistry::builtin();
    assert_eq!(registry.resolve_chain(324).unwrap().name, "zksync-mainnet");
    assert_eq!(registry.resolve_chain(31_337).unwrap().name, "local");
}

#[test]
fn test_load_from_json_and_overlay() {
    let json = r#"{
        "devnet": {
            "chain_id": 1337,
            "model": "sequencer",
            "driver": "0x0000000000000000000000000000000000008001",
            "owner": "0x1111111111111111111111111111111111111111"
        },
        "sepolia": {
            "chain_id": 11155111,
            "model": "relayer",
            "driver": "0x2222222222222222222222222222222222222222",
            "owner": "0x3333333333333333333333333333333333333333"
        }
    }"#;
    let custom = NetworkRegistry::from_json(json).unwrap();

    let devnet = custom.resolve("devnet").unwrap();
    assert_eq!(devnet.name, "devnet");
    assert_eq!(devnet.model, ProtocolModel::Sequencer);
    assert_eq!(devnet.owner, [0x11; 20]);

    let mut registry = NetworkRegistry::builtin();
    registry.extend(custom);
    assert_eq!(registry.resolve("sepolia").unwrap().driver, [0x22; 20]);
    assert!(registry.resolve("zksync-sepolia").is_ok());
}

#[test]
fn test_malformed_json_is_parse_error() {
    assert!(matches!(
        NetworkRegistry::from_json("{ not json"),
        Err(ConfigError::Parse(_))
    ));
    let unknown_model = r#"{"x": {"chain_id": 1, "model": "rollup",
        "driver": "0x0000000000000000000000000000000000008001",
        "owner": "0x0000000000000000000000000000000000008001"}}"#;
    assert!(matches!(
        NetworkRegistry::from_json(unknown_model),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_deploy_from_builtin_config() {
    let registry = NetworkRegistry::builtin();

    let config = registry.resolve("arbitrum-sepolia").unwrap();
    let mut ledger = Ledger::new(config.chain_id);
    let account = RelayerAccount::deploy(&mut ledger, ACCOUNT, config).unwrap();
    assert_eq!(account.entry_point(), config.driver);
    assert_eq!(account.owner(&ledger).unwrap(), config.owner);

    let config = registry.resolve("zksync-mainnet").unwrap();
    let mut ledger = Ledger::new(config.chain_id);
    let account = SequencerAccount::deploy(&mut ledger, ACCOUNT, config).unwrap();
    assert_eq!(account.bootloader(), BOOTLOADER_ADDRESS);
    assert_eq!(account.owner(&ledger).unwrap(), config.owner);
    assert_eq!(ledger.events().len(), 1);
}

#[test]
fn test_deploy_rejects_zero_owner() {
    let mut config = relayer_config();
    config.owner = ZERO_ADDRESS;
    let mut ledger = Ledger::new(config.chain_id);

    let err = RelayerAccount::deploy(&mut ledger, ACCOUNT, &config).unwrap_err();
    assert!(matches!(err, AccountError::InvalidOwner));
    assert!(ledger.events().is_empty());
}
