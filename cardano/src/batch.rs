//! Batched payout from the bridge multisig address
//!
//! Payouts are funded from the multisig address and the fee from the fee
//! address, each guarded by its own K-of-N policy. Both policies travel in the
//! witness set and the fee is sized for every participant of both. Change,
//! including what is left of the fee input, returns to the multisig address.
//!
//! A chain may use one address for both roles. Its UTxOs are then selected
//! once, for payouts and fee together, and an output is never spent twice.

use std::collections::{BTreeMap, HashSet};

use cardano_bridge_codec::{Transaction, TxInput, TxOutput};
use cardano_bridge_common::{
    Address, ChainId, Lovelace, Metadata, Metadatum, PolicyScript, ProtocolParameters, Slot,
    TxHash,
    configuration::{BridgeConfig, TxSettings},
    metadata::BRIDGE_METADATA_LABEL,
};
use tracing::debug;

use crate::{
    builder::TxBuilder, coin_selection::select_inputs, error::TxBuildError,
    policy::policy_from_config, validation::parse_receivers,
};

pub const BATCH_NONCE_KEY: &str = "batch_nonce_id";

/// Confirmed payouts for a destination chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    pub chain_id: String,
    pub payouts: BTreeMap<String, Lovelace>,
    pub batch_nonce_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub chain_id: ChainId,
    pub payouts: Vec<(Address, Lovelace)>,
    pub multisig_address: Address,
    pub fee_address: Address,
    pub multisig_policy: PolicyScript,
    pub fee_policy: PolicyScript,
    pub batch_nonce_id: u64,
}

impl BatchRequest {
    /// Resolve the chain's addresses and policies and check every payout
    pub fn validate(&self, config: &BridgeConfig) -> Result<BatchPlan, TxBuildError> {
        let chain = config.chain(&self.chain_id)?;
        let payouts = parse_receivers(&self.payouts, chain.min_utxo_value)?;

        Ok(BatchPlan {
            chain_id: self.chain_id.clone(),
            payouts,
            multisig_address: chain.multisig_address.clone(),
            fee_address: chain.fee_address.clone(),
            multisig_policy: policy_from_config(&chain.multisig_policy)?,
            fee_policy: policy_from_config(&chain.fee_policy)?,
            batch_nonce_id: self.batch_nonce_id,
        })
    }
}

impl BatchPlan {
    pub fn total(&self) -> Lovelace {
        self.payouts.iter().map(|(_, amount)| amount).sum()
    }

    /// Policy scripts carried by the witness set; one when both roles share a policy
    pub fn policies(&self) -> Vec<PolicyScript> {
        if self.multisig_policy == self.fee_policy {
            vec![self.multisig_policy.clone()]
        } else {
            vec![self.multisig_policy.clone(), self.fee_policy.clone()]
        }
    }

    /// Placeholder witnesses needed to size the fee: every participant of every policy
    pub fn witness_reservation(&self) -> usize {
        self.policies().iter().map(PolicyScript::signer_count).sum()
    }

    /// Witnesses that must be collected before submission
    pub fn quorum(&self) -> usize {
        self.policies().iter().map(PolicyScript::required_signers).sum()
    }

    fn shares_address(&self) -> bool {
        self.multisig_address == self.fee_address
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::from([(
            BRIDGE_METADATA_LABEL,
            Metadatum::record([(BATCH_NONCE_KEY, Metadatum::uint(self.batch_nonce_id))]),
        )])
    }
}

/// Build the unsigned batch transaction. The witness list is left empty for
/// out-of-band collection from the policy participants.
pub fn build_batch(
    plan: &BatchPlan,
    settings: &TxSettings,
    params: &ProtocolParameters,
    multisig_utxos: &[TxInput],
    fee_utxos: &[TxInput],
    slot: Slot,
) -> Result<Transaction, TxBuildError> {
    let total = plan.total();
    let inputs = if plan.shares_address() {
        let pool = without_spent(fee_utxos, multisig_utxos);
        let pool: Vec<TxInput> = multisig_utxos.iter().cloned().chain(pool).collect();
        select_inputs(&pool, total, settings.potential_fee, params.min_utxo_value)?
    } else {
        let mut inputs = select_inputs(multisig_utxos, total, 0, params.min_utxo_value)?;
        let fee_candidates: Vec<TxInput> = without_spent(fee_utxos, &inputs).collect();
        inputs.extend(select_inputs(&fee_candidates, 0, settings.potential_fee, 0)?);
        inputs
    };
    debug!(
        chain_id = %plan.chain_id,
        batch_nonce_id = plan.batch_nonce_id,
        total,
        inputs = inputs.len(),
        shared_address = plan.shares_address(),
        "building batch"
    );

    let mut builder = TxBuilder::new(params.clone());
    builder.add_inputs(inputs);
    builder.add_outputs(
        plan.payouts
            .iter()
            .map(|(address, amount)| TxOutput::new(address.clone(), *amount)),
    )?;
    builder.set_ttl_from_slot(slot, settings.ttl_slots);
    builder.set_metadata(plan.metadata());
    builder.add_policy_scripts(plan.policies());
    builder.reserve_witnesses(plan.witness_reservation());
    builder.add_change_if_needed(plan.multisig_address.clone())?;
    builder.build()
}

/// `candidates` whose outpoint is not already among `spent`
fn without_spent<'a>(
    candidates: &'a [TxInput],
    spent: &'a [TxInput],
) -> impl Iterator<Item = TxInput> + 'a {
    let spent: HashSet<(TxHash, u16)> = spent.iter().map(TxInput::outpoint).collect();
    candidates.iter().filter(move |utxo| !spent.contains(&utxo.outpoint())).cloned()
}
