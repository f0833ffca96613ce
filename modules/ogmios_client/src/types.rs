//! Ogmios v6 JSON-RPC wire types

use std::collections::BTreeMap;

use cardano_bridge_codec::TxInput;
use cardano_bridge_common::{Lovelace, ProtocolParameters, ProtocolVersion, Slot, TxHash};
use serde::{Deserialize, Serialize};

pub const JSONRPC_VERSION: &str = "2.0";

/// Size charged for an output's fixed overhead when converting the deposit
/// coefficient into a flat minimum
pub const UTXO_ENTRY_OVERHEAD: u64 = 160;

/// Encoded size of an ADA-only enterprise output
pub const MIN_OUTPUT_SIZE: u64 = 37;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse<R> {
    pub result: Option<R>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct NoParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Lovelaces {
    pub lovelace: Lovelace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Ada {
    pub ada: Lovelaces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Bytes {
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgmiosProtocolParameters {
    pub min_fee_coefficient: u64,
    pub min_fee_constant: Ada,
    pub max_transaction_size: Bytes,
    pub min_utxo_deposit_coefficient: u64,
    pub version: ProtocolVersion,
}

impl From<OgmiosProtocolParameters> for ProtocolParameters {
    fn from(params: OgmiosProtocolParameters) -> Self {
        Self {
            fee_per_byte: params.min_fee_coefficient,
            fee_fixed: params.min_fee_constant.ada.lovelace,
            max_tx_size: params.max_transaction_size.bytes,
            min_utxo_value: params.min_utxo_deposit_coefficient
                * (UTXO_ENTRY_OVERHEAD + MIN_OUTPUT_SIZE),
            version: params.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UtxoQuery<'a> {
    pub addresses: Vec<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionId {
    pub id: TxHash,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OgmiosValue {
    pub ada: Lovelaces,

    /// Native assets by policy id
    #[serde(flatten)]
    pub assets: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OgmiosUtxo {
    pub transaction: TransactionId,
    pub index: u16,
    pub address: String,
    pub value: OgmiosValue,
}

impl OgmiosUtxo {
    pub fn has_assets(&self) -> bool {
        !self.value.assets.is_empty()
    }
}

impl From<&OgmiosUtxo> for TxInput {
    fn from(utxo: &OgmiosUtxo) -> Self {
        TxInput::new(utxo.transaction.id, utxo.index, utxo.value.ada.lovelace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OgmiosTip {
    Point { slot: Slot, id: String },
    Origin(String),
}

impl OgmiosTip {
    pub fn slot(&self) -> Slot {
        match self {
            Self::Point { slot, .. } => *slot,
            Self::Origin(_) => 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Cbor {
    pub cbor: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitParams {
    pub transaction: Cbor,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResult {
    pub transaction: TransactionId,
}
