use config::{Config, ConfigError};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    address::Address,
    hash::KeyHash,
    types::{Lovelace, NetworkId},
    validation::ValidationError,
};

pub const CONFIG_KEY_TX: &str = "tx";
pub const CONFIG_KEY_CHAINS: &str = "chains";

pub const DEFAULT_POTENTIAL_FEE: Lovelace = 200_000;
pub const DEFAULT_TTL_SLOTS: u64 = 300;
pub const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MIN_UTXO_VALUE: Lovelace = 1_000_000;

/// Transaction construction settings shared by every chain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TxSettings {
    /// Fee allowance reserved during coin selection, before the real fee is known
    pub potential_fee: Lovelace,

    /// Validity window added to the current tip slot
    pub ttl_slots: u64,

    /// How long the submitter waits for a quorum of witnesses
    pub collect_timeout_secs: u64,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            potential_fee: DEFAULT_POTENTIAL_FEE,
            ttl_slots: DEFAULT_TTL_SLOTS,
            collect_timeout_secs: DEFAULT_COLLECT_TIMEOUT_SECS,
        }
    }
}

/// K-of-N multisig policy, as configured
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    pub threshold: u32,
    pub key_hashes: Vec<KeyHash>,
}

/// Per destination chain settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// Node endpoint used for queries and submission
    pub node_url: String,

    #[serde(default)]
    pub network: NetworkId,

    /// Address holding bridged funds
    pub multisig_address: Address,

    /// Address that pays batch fees and collects the bridging fee
    pub fee_address: Address,

    pub bridging_fee: Lovelace,

    #[serde(default = "default_min_utxo_value")]
    pub min_utxo_value: Lovelace,

    pub multisig_policy: PolicyConfig,

    pub fee_policy: PolicyConfig,
}

fn default_min_utxo_value() -> Lovelace {
    DEFAULT_MIN_UTXO_VALUE
}

/// Bridge configuration; the supported destination chains are the keys of `chains`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub tx: TxSettings,

    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
}

impl BridgeConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        // an absent [tx] table means defaults; a malformed one is an error
        let tx = match config.get::<TxSettings>(CONFIG_KEY_TX) {
            Ok(tx) => tx,
            Err(ConfigError::NotFound(_)) => TxSettings::default(),
            Err(e) => return Err(e),
        };
        let chains = config.get::<BTreeMap<String, ChainConfig>>(CONFIG_KEY_CHAINS)?;
        Ok(Self { tx, chains })
    }

    /// Settings for a destination chain, if it is supported
    pub fn chain(&self, chain_id: &str) -> Result<&ChainConfig, ValidationError> {
        if chain_id.is_empty() {
            return Err(ValidationError::EmptyChainId);
        }
        self.chains
            .get(chain_id)
            .ok_or_else(|| ValidationError::UnsupportedChain(chain_id.to_string()))
    }

    pub fn supported_chains(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }
}
