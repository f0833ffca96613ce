//! Ledger node interface used by the bridge flows

use async_trait::async_trait;
use cardano_bridge_codec::TxInput;
use cardano_bridge_common::{Address, ProtocolParameters, Slot, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current chain tip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub slot: Slot,
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node unreachable: {0}")]
    Transport(String),

    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected node response: {0}")]
    Response(String),

    /// The node refused the transaction
    #[error("transaction rejected ({code}): {message}")]
    Submission { code: i64, message: String },
}

/// Queries and submission against one network
/// Note all methods take `&self`; implementations lock internally if needed
#[async_trait]
pub trait Node: Send + Sync {
    async fn get_protocol_parameters(&self) -> Result<ProtocolParameters, NodeError>;

    /// Unspent outputs at `address`, in the order the node returns them
    async fn get_utxos(&self, address: &Address) -> Result<Vec<TxInput>, NodeError>;

    async fn get_tip(&self) -> Result<Tip, NodeError>;

    /// Submit an encoded transaction, returning its id
    async fn submit_transaction(&self, tx: &[u8]) -> Result<TxHash, NodeError>;
}
