//! Deterministic fixtures shared by the bridge test suites

use std::collections::BTreeMap;

use cardano_bridge_codec::TxInput;
use cardano_bridge_common::{
    Address, Lovelace, NetworkId, PolicyScript, ProtocolParameters, ProtocolVersion, SigningKey,
    TxHash,
    configuration::{BridgeConfig, ChainConfig, PolicyConfig, TxSettings},
    crypto::keyhash_224,
};

pub const FEE_PER_BYTE: u64 = 44;
pub const FEE_FIXED: u64 = 155381;
pub const MAX_TX_SIZE: u64 = 16384;
pub const MIN_UTXO_VALUE: Lovelace = 1_000_000;
pub const BRIDGING_FEE: Lovelace = 1_000_000;

/// A valid testnet enterprise address
pub const TEST_ADDRESS: &str = "addr_test1vpe3gtplyv5ygjnwnddyv0yc640hupqgkr2528xzf5nms7qalkkln";

pub fn protocol_parameters() -> ProtocolParameters {
    ProtocolParameters {
        fee_per_byte: FEE_PER_BYTE,
        fee_fixed: FEE_FIXED,
        max_tx_size: MAX_TX_SIZE,
        min_utxo_value: MIN_UTXO_VALUE,
        version: ProtocolVersion { major: 8, minor: 0 },
    }
}

/// Signing key whose seed is 32 copies of `n`
pub fn signing_key(n: u8) -> SigningKey {
    SigningKey::from_bytes(&[n; 32]).expect("32 byte seed")
}

pub fn signing_keys(seeds: impl IntoIterator<Item = u8>) -> Vec<SigningKey> {
    seeds.into_iter().map(signing_key).collect()
}

/// Testnet enterprise address for a key
pub fn key_address(key: &SigningKey) -> Address {
    Address::enterprise(NetworkId::Testnet, &key.public_key().hash())
}

/// Testnet enterprise address for an arbitrary key hash derived from `n`
pub fn address(n: u8) -> Address {
    Address::enterprise(NetworkId::Testnet, &keyhash_224(&[n]))
}

/// UTxO at output index 0 of a transaction whose hash is 32 copies of `n`
pub fn utxo(n: u8, amount: Lovelace) -> TxInput {
    TxInput::new(TxHash::new([n; 32]), 0, amount)
}

pub fn policy_config(threshold: u32, keys: &[SigningKey]) -> PolicyConfig {
    PolicyConfig {
        threshold,
        key_hashes: keys.iter().map(|key| key.public_key().hash()).collect(),
    }
}

/// Script address controlled by a K-of-N policy over `config`
pub fn policy_address(config: &PolicyConfig) -> Address {
    let script = PolicyScript::AtLeast(
        config.threshold,
        config.key_hashes.iter().copied().map(PolicyScript::Signature).collect(),
    );
    Address::script_enterprise(NetworkId::Testnet, &script.compute_hash())
}

/// Chain whose multisig and fee addresses are the script addresses of the two policies
pub fn chain_config(multisig_policy: PolicyConfig, fee_policy: PolicyConfig) -> ChainConfig {
    ChainConfig {
        node_url: "http://localhost:1337".to_string(),
        network: NetworkId::Testnet,
        multisig_address: policy_address(&multisig_policy),
        fee_address: policy_address(&fee_policy),
        bridging_fee: BRIDGING_FEE,
        min_utxo_value: MIN_UTXO_VALUE,
        multisig_policy,
        fee_policy,
    }
}

/// Two participant sets of four keys each: seeds 1..=4 guard the multisig
/// address and 5..=8 the fee address, both 3-of-4
pub fn dual_multisig_keys() -> (Vec<SigningKey>, Vec<SigningKey>) {
    (signing_keys(1..=4), signing_keys(5..=8))
}

/// Bridge configuration with a single chain `chain_id` using [`dual_multisig_keys`]
pub fn bridge_config(chain_id: &str) -> BridgeConfig {
    let (multisig, fee) = dual_multisig_keys();
    BridgeConfig {
        tx: TxSettings::default(),
        chains: BTreeMap::from([(
            chain_id.to_string(),
            chain_config(policy_config(3, &multisig), policy_config(3, &fee)),
        )]),
    }
}
