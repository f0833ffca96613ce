//! Per-chain bridge flows: build from node state, sign, collect, submit

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use cardano_bridge_codec::{Transaction, VKeyWitness};
use cardano_bridge_common::{
    ChainId, Lovelace, ProtocolParameters, SigningKey, TxHash, ValidationError,
    configuration::{BridgeConfig, ChainConfig},
};
use cardano_bridge_tx::{
    BatchRequest, DepositRequest, TxBuildError, build_batch, build_deposit,
    finalize_with_witnesses, sign_transaction,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    collector::{CollectError, WitnessCollector},
    node::{Node, NodeError},
    relay::RelayChannel,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Build(#[from] TxBuildError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Collect(#[from] CollectError),
}

/// Bridge flows against the node of one chain
pub struct ChainService {
    chain_id: ChainId,
    config: Arc<BridgeConfig>,
    node: Arc<dyn Node>,
}

impl ChainService {
    pub fn new(
        chain_id: impl Into<ChainId>,
        config: Arc<BridgeConfig>,
        node: Arc<dyn Node>,
    ) -> Result<Self, ValidationError> {
        let chain_id = chain_id.into();
        config.chain(&chain_id)?;
        Ok(Self {
            chain_id,
            config,
            node,
        })
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn chain(&self) -> Result<&ChainConfig, ValidationError> {
        self.config.chain(&self.chain_id)
    }

    /// Node parameters, with the minimum UTxO value raised to the chain's floor
    async fn protocol_parameters(&self) -> Result<ProtocolParameters, ServiceError> {
        let mut params = self.node.get_protocol_parameters().await?;
        params.min_utxo_value = params.min_utxo_value.max(self.chain()?.min_utxo_value);
        Ok(params)
    }

    /// Unsigned deposit from `request.sender`, funded from the sender's UTxOs
    #[instrument(skip_all, fields(chain = %self.chain_id, destination = %request.chain_id))]
    pub async fn build_deposit(&self, request: &DepositRequest) -> Result<Transaction, ServiceError> {
        let plan = request.validate(&self.config)?;

        let params = self.protocol_parameters().await?;
        let utxos = self.node.get_utxos(&plan.sender).await?;
        let tip = self.node.get_tip().await?;

        let tx = build_deposit(&plan, &self.config.tx, &params, &utxos, tip.slot)?;
        info!(tx_hash = %tx.hash(), total = plan.total(), fee = tx.body.fee, "built deposit");
        Ok(tx)
    }

    /// Unsigned batch paying `payouts` from this chain's multisig address
    #[instrument(skip_all, fields(chain = %self.chain_id, batch_nonce_id = batch_nonce_id))]
    pub async fn build_batch(
        &self,
        payouts: BTreeMap<String, Lovelace>,
        batch_nonce_id: u64,
    ) -> Result<Transaction, ServiceError> {
        let request = BatchRequest {
            chain_id: self.chain_id.clone(),
            payouts,
            batch_nonce_id,
        };
        let plan = request.validate(&self.config)?;

        let params = self.protocol_parameters().await?;
        let multisig_utxos = self.node.get_utxos(&plan.multisig_address).await?;
        let fee_utxos = self.node.get_utxos(&plan.fee_address).await?;
        let tip = self.node.get_tip().await?;

        let tx = build_batch(&plan, &self.config.tx, &params, &multisig_utxos, &fee_utxos, tip.slot)?;
        info!(
            tx_hash = %tx.hash(),
            total = plan.total(),
            fee = tx.body.fee,
            quorum = plan.quorum(),
            "built batch"
        );
        Ok(tx)
    }

    pub fn sign(&self, tx: &Transaction, key: &SigningKey) -> VKeyWitness {
        sign_transaction(tx, key)
    }

    #[instrument(skip_all, fields(chain = %self.chain_id, tx_hash = %tx.hash()))]
    pub async fn submit(&self, tx: &Transaction) -> Result<TxHash, ServiceError> {
        let id = self.node.submit_transaction(&tx.to_bytes()).await?;
        info!(witnesses = tx.witness_set.vkey_witnesses.len(), "submitted");
        Ok(id)
    }

    /// Single-signer completion, as for a deposit
    pub async fn sign_and_submit(
        &self,
        tx: Transaction,
        key: &SigningKey,
    ) -> Result<TxHash, ServiceError> {
        let witness = self.sign(&tx, key);
        let signed = finalize_with_witnesses(tx, [witness])?;
        self.submit(&signed).await
    }

    /// Wait for a quorum of multisig witnesses on `relay`, then submit
    pub async fn collect_and_submit(
        &self,
        tx: Transaction,
        relay: &dyn RelayChannel,
    ) -> Result<TxHash, ServiceError> {
        let window = Duration::from_secs(self.config.tx.collect_timeout_secs);
        let signed = WitnessCollector::new(tx, window).collect(relay).await?;
        self.submit(&signed).await
    }
}
