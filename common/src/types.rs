//! Scalar types shared across the bridge crates

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// Amount of ADA in lovelace (1 ADA = 1,000,000 lovelace)
pub type Lovelace = u64;

/// Absolute slot number
pub type Slot = u64;

/// Destination chain identifier, e.g. `prime` or `vector`
pub type ChainId = String;

/// Network discriminator carried in every address header
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    #[default]
    Testnet,
    Mainnet,
}

impl NetworkId {
    /// Value of the low nibble of an address header
    pub fn id(&self) -> u8 {
        match self {
            NetworkId::Testnet => 0,
            NetworkId::Mainnet => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(NetworkId::Testnet),
            1 => Some(NetworkId::Mainnet),
            _ => None,
        }
    }

    /// Bech32 prefix for payment addresses on this network
    pub fn address_hrp(&self) -> &'static str {
        match self {
            NetworkId::Testnet => "addr_test",
            NetworkId::Mainnet => "addr",
        }
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            NetworkId::Testnet => write!(f, "testnet"),
            NetworkId::Mainnet => write!(f, "mainnet"),
        }
    }
}
