//! User deposit into the bridge multisig address
//!
//! The deposit pays the sum of all receivers plus the bridging fee to the
//! multisig address in a single output and records the destination chain
//! and the individual transfers in metadata label 1. Change returns to the
//! sender. The transaction is returned unsigned for the sender to sign.

use std::collections::BTreeMap;

use cardano_bridge_codec::{Transaction, TxInput, TxOutput};
use cardano_bridge_common::{
    Address, ChainId, Lovelace, Metadata, Metadatum, ProtocolParameters, Slot, ValidationError,
    configuration::{BridgeConfig, TxSettings},
    metadata::BRIDGE_METADATA_LABEL,
};
use tracing::debug;

use crate::{
    builder::TxBuilder,
    coin_selection::select_inputs,
    error::TxBuildError,
    validation::{parse_address, parse_receivers},
};

/// Deposit as requested by a user, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepositRequest {
    pub sender: String,
    pub chain_id: String,
    pub receivers: BTreeMap<String, Lovelace>,
}

/// Validated deposit with the destination chain's bridge addresses resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    pub sender: Address,
    pub chain_id: ChainId,
    pub receivers: Vec<(Address, Lovelace)>,
    pub multisig_address: Address,
    pub fee_address: Address,
    pub bridging_fee: Lovelace,
}

impl DepositRequest {
    pub fn new(
        sender: impl Into<String>,
        chain_id: impl Into<String>,
        receivers: BTreeMap<String, Lovelace>,
    ) -> Self {
        Self {
            sender: sender.into(),
            chain_id: chain_id.into(),
            receivers,
        }
    }

    /// Check the request against the bridge configuration. Fails, in order, on
    /// an empty or invalid sender, an empty or unsupported chain id, no
    /// receivers, and any receiver below the minimum or with a bad address.
    pub fn validate(&self, config: &BridgeConfig) -> Result<DepositPlan, ValidationError> {
        if self.sender.is_empty() {
            return Err(ValidationError::EmptySender);
        }
        let sender = parse_address(&self.sender)?;
        let chain = config.chain(&self.chain_id)?;
        let receivers = parse_receivers(&self.receivers, chain.min_utxo_value)?;

        Ok(DepositPlan {
            sender,
            chain_id: self.chain_id.clone(),
            receivers,
            multisig_address: chain.multisig_address.clone(),
            fee_address: chain.fee_address.clone(),
            bridging_fee: chain.bridging_fee,
        })
    }
}

impl DepositPlan {
    /// Amount locked at the multisig address
    pub fn total(&self) -> Lovelace {
        self.receivers.iter().map(|(_, amount)| amount).sum::<Lovelace>() + self.bridging_fee
    }

    /// `{1: {"chainId": .., "transactions": [{"address": .., "amount": ..}, ..]}}`,
    /// with the bridging fee recorded as a transfer to the fee address
    pub fn metadata(&self) -> Metadata {
        let transfer = |address: &Address, amount: Lovelace| {
            Metadatum::record([
                ("address", Metadatum::Bytes(address.to_vec())),
                ("amount", Metadatum::uint(amount)),
            ])
        };

        let transactions = self
            .receivers
            .iter()
            .map(|(address, amount)| transfer(address, *amount))
            .chain(std::iter::once(transfer(&self.fee_address, self.bridging_fee)))
            .collect();

        let record = Metadatum::record([
            ("chainId", Metadatum::text(self.chain_id.as_str())),
            ("transactions", Metadatum::Array(transactions)),
        ]);
        Metadata::from([(BRIDGE_METADATA_LABEL, record)])
    }
}

/// Build the unsigned deposit transaction from the sender's UTxOs
pub fn build_deposit(
    plan: &DepositPlan,
    settings: &TxSettings,
    params: &ProtocolParameters,
    sender_utxos: &[TxInput],
    slot: Slot,
) -> Result<Transaction, TxBuildError> {
    let total = plan.total();
    let inputs = select_inputs(sender_utxos, total, settings.potential_fee, params.min_utxo_value)?;
    debug!(chain_id = %plan.chain_id, total, inputs = inputs.len(), "building deposit");

    let mut builder = TxBuilder::new(params.clone());
    builder.add_inputs(inputs);
    builder.add_outputs([TxOutput::new(plan.multisig_address.clone(), total)])?;
    builder.set_ttl_from_slot(slot, settings.ttl_slots);
    builder.set_metadata(plan.metadata());
    // the sender's own signature
    builder.reserve_witnesses(1);
    builder.add_change_if_needed(plan.sender.clone())?;
    builder.build()
}
