//! Cardano payment address, held in its raw byte form
//!
//! The first byte is the header: the high nibble selects the address type
//! (base, pointer, enterprise, with key or script credentials) and the low
//! nibble carries the network id. Only Shelley payment addresses are accepted.

use crate::{
    hash::{KeyHash, ScriptHash},
    types::NetworkId,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

const HEADER_ENTERPRISE_KEY: u8 = 0b0110;
const HEADER_ENTERPRISE_SCRIPT: u8 = 0b0111;
const CREDENTIAL_LENGTH: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid bech32: {0}")]
    Bech32(String),

    #[error("empty address")]
    Empty,

    #[error("unsupported address header {0:#04x}")]
    UnsupportedHeader(u8),

    #[error("invalid length {actual} for address type {kind}")]
    InvalidLength { kind: u8, actual: usize },

    #[error("prefix {hrp} does not match {network} address")]
    PrefixMismatch { hrp: String, network: NetworkId },
}

/// Validated Shelley payment address
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<u8>);

impl Address {
    /// Validate raw address bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let header = *bytes.first().ok_or(AddressError::Empty)?;
        let kind = header >> 4;
        if NetworkId::from_id(header & 0x0f).is_none() {
            return Err(AddressError::UnsupportedHeader(header));
        }

        let valid_length = match kind {
            // base: payment + delegation credential
            0..=3 => bytes.len() == 1 + 2 * CREDENTIAL_LENGTH,
            // pointer: payment credential followed by variable-length pointer
            4 | 5 => bytes.len() > 1 + CREDENTIAL_LENGTH,
            // enterprise
            6 | 7 => bytes.len() == 1 + CREDENTIAL_LENGTH,
            _ => return Err(AddressError::UnsupportedHeader(header)),
        };

        if !valid_length {
            return Err(AddressError::InvalidLength {
                kind,
                actual: bytes.len(),
            });
        }

        Ok(Self(bytes.to_vec()))
    }

    /// Parse a bech32 address, checking the prefix agrees with the network in the header
    pub fn from_bech32(text: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(text).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let address = Self::from_bytes(&data)?;
        let network = address.network();
        if hrp.as_str() != network.address_hrp() {
            return Err(AddressError::PrefixMismatch {
                hrp: hrp.to_string(),
                network,
            });
        }
        Ok(address)
    }

    pub fn to_bech32(&self) -> Result<String, AddressError> {
        let hrp = bech32::Hrp::parse(self.network().address_hrp())
            .map_err(|e| AddressError::Bech32(e.to_string()))?;
        bech32::encode::<bech32::Bech32>(hrp, &self.0)
            .map_err(|e| AddressError::Bech32(e.to_string()))
    }

    /// Enterprise address paying to a verification key hash
    pub fn enterprise(network: NetworkId, key_hash: &KeyHash) -> Self {
        Self::with_header(HEADER_ENTERPRISE_KEY, network, key_hash.as_ref())
    }

    /// Enterprise address locked by a policy script
    pub fn script_enterprise(network: NetworkId, script_hash: &ScriptHash) -> Self {
        Self::with_header(HEADER_ENTERPRISE_SCRIPT, network, script_hash.as_ref())
    }

    fn with_header(kind: u8, network: NetworkId, credential: &[u8]) -> Self {
        let mut data = Vec::with_capacity(1 + credential.len());
        data.push((kind << 4) | network.id());
        data.extend_from_slice(credential);
        Self(data)
    }

    pub fn network(&self) -> NetworkId {
        // Validated on construction
        NetworkId::from_id(self.0[0] & 0x0f).unwrap_or_default()
    }

    /// True if the payment credential is a script hash
    pub fn is_script(&self) -> bool {
        (self.0[0] >> 4) & 0x01 == 1
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_string()).finish()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_bech32().map_err(serde::ser::Error::custom)?)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(serde::de::Error::custom)
    }
}

impl<C> minicbor::Encode<C> for Address {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?.ok()
    }
}

impl<'a, C> minicbor::Decode<'a, C> for Address {
    fn decode(
        d: &mut minicbor::Decoder<'a>,
        _ctx: &mut C,
    ) -> Result<Self, minicbor::decode::Error> {
        let bytes = d.bytes()?;
        Self::from_bytes(bytes).map_err(|e| minicbor::decode::Error::message(e.to_string()))
    }
}
