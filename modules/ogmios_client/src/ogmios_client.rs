//! Node access over the Ogmios JSON-RPC interface
//!
//! Every call is a single HTTP POST of a JSON-RPC 2.0 request to the Ogmios
//! endpoint. Retry policy belongs to the caller.

pub mod types;

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use cardano_bridge_codec::TxInput;
use cardano_bridge_common::{Address, ProtocolParameters, TxHash};
use cardano_bridge_module_orchestrator::{Node, NodeError, Tip};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::types::{
    Cbor, JSONRPC_VERSION, NoParams, OgmiosProtocolParameters, OgmiosTip, OgmiosUtxo, RpcRequest,
    RpcResponse, SubmitParams, SubmitResult, UtxoQuery,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct OgmiosClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl OgmiosClient {
    pub fn new(url: impl Into<String>) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<R, NodeError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        };
        debug!(method, id, url = %self.url, "ogmios request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse<R> = response.json().await.map_err(|e| {
            NodeError::Response(format!("{method}: HTTP {status}, undecodable body: {e}"))
        })?;

        match (body.result, body.error) {
            (_, Some(error)) => Err(NodeError::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(NodeError::Response(format!("{method}: empty response"))),
        }
    }
}

#[async_trait]
impl Node for OgmiosClient {
    async fn get_protocol_parameters(&self) -> Result<ProtocolParameters, NodeError> {
        let params: OgmiosProtocolParameters =
            self.call("queryLedgerState/protocolParameters", NoParams {}).await?;
        Ok(params.into())
    }

    /// UTxOs carrying native assets are left out; spending them would need
    /// multi-asset outputs
    async fn get_utxos(&self, address: &Address) -> Result<Vec<TxInput>, NodeError> {
        let bech32 = address.to_bech32().map_err(|e| NodeError::Response(e.to_string()))?;
        let utxos: Vec<OgmiosUtxo> = self
            .call(
                "queryLedgerState/utxo",
                UtxoQuery {
                    addresses: vec![bech32.as_str()],
                },
            )
            .await?;

        Ok(utxos
            .iter()
            .filter(|utxo| {
                if utxo.has_assets() {
                    debug!(tx_hash = %utxo.transaction.id, index = utxo.index, "skipping UTxO with native assets");
                }
                !utxo.has_assets()
            })
            .map(TxInput::from)
            .collect())
    }

    async fn get_tip(&self) -> Result<Tip, NodeError> {
        let tip: OgmiosTip = self.call("queryLedgerState/tip", NoParams {}).await?;
        Ok(Tip { slot: tip.slot() })
    }

    async fn submit_transaction(&self, tx: &[u8]) -> Result<TxHash, NodeError> {
        let params = SubmitParams {
            transaction: Cbor {
                cbor: hex::encode(tx),
            },
        };
        match self.call::<_, SubmitResult>("submitTransaction", params).await {
            Ok(result) => Ok(result.transaction.id),
            Err(NodeError::Rpc { code, message }) => {
                warn!(code, "transaction rejected: {message}");
                Err(NodeError::Submission { code, message })
            }
            Err(e) => Err(e),
        }
    }
}
