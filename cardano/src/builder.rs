//! Transaction builder
//!
//! Inputs and outputs are added first, then TTL, metadata, policy scripts
//! and the witness reservation, and only then the change output, whose
//! amount absorbs the fee. `build` signs with any held keys.

use cardano_bridge_codec::{AuxiliaryData, Transaction, TxInput, TxOutput};
use cardano_bridge_common::{
    Address, InsufficientFundsError, Lovelace, Metadata, PolicyScript, ProtocolParameters, Slot,
    SigningKey,
};
use tracing::debug;

use crate::{
    error::TxBuildError,
    fee::{compute_min_fee, placeholder_witnesses},
    signing::sign_transaction,
};

/// Validity window, in slots, added to the current tip
pub const TTL_HORIZON: u64 = 300;

#[derive(Debug)]
pub struct TxBuilder {
    params: ProtocolParameters,
    tx: Transaction,
    signing_keys: Vec<SigningKey>,
    reserved_witnesses: usize,
    change_index: Option<usize>,
}

impl TxBuilder {
    pub fn new(params: ProtocolParameters) -> Self {
        Self {
            params,
            tx: Transaction::default(),
            signing_keys: Vec::new(),
            reserved_witnesses: 0,
            change_index: None,
        }
    }

    /// Keys that `build` signs with; their witnesses are reserved for fee sizing
    pub fn with_signing_keys(mut self, keys: impl IntoIterator<Item = SigningKey>) -> Self {
        self.signing_keys.extend(keys);
        self.reserved_witnesses = self.reserved_witnesses.max(self.signing_keys.len());
        self
    }

    pub fn add_inputs(&mut self, inputs: impl IntoIterator<Item = TxInput>) -> &mut Self {
        self.tx.body.inputs.extend(inputs);
        self
    }

    /// Add payment outputs, each of which must clear the minimum UTxO value
    pub fn add_outputs(
        &mut self,
        outputs: impl IntoIterator<Item = TxOutput>,
    ) -> Result<&mut Self, TxBuildError> {
        for output in outputs {
            if output.amount < self.params.min_utxo_value {
                return Err(TxBuildError::OutputBelowMinimum {
                    amount: output.amount,
                    minimum: self.params.min_utxo_value,
                });
            }
            self.tx.body.outputs.push(output);
        }
        Ok(self)
    }

    pub fn set_ttl(&mut self, ttl: Slot) -> &mut Self {
        self.tx.body.ttl = ttl;
        self
    }

    pub fn set_ttl_from_slot(&mut self, slot: Slot, horizon: u64) -> &mut Self {
        self.set_ttl(slot + horizon)
    }

    /// Attach metadata and commit to it from the body
    pub fn set_metadata(&mut self, metadata: Metadata) -> &mut Self {
        let auxiliary_data = AuxiliaryData::new(metadata);
        self.tx.body.auxiliary_data_hash = Some(auxiliary_data.hash());
        self.tx.auxiliary_data = Some(auxiliary_data);
        self
    }

    pub fn add_policy_scripts(
        &mut self,
        scripts: impl IntoIterator<Item = PolicyScript>,
    ) -> &mut Self {
        self.tx.witness_set.policy_scripts.extend(scripts);
        self
    }

    /// Number of witnesses the finished transaction will carry, for fee sizing.
    /// Never fewer than the signing keys held.
    pub fn reserve_witnesses(&mut self, count: usize) -> &mut Self {
        self.reserved_witnesses = count.max(self.signing_keys.len());
        self
    }

    pub fn total_input(&self) -> Lovelace {
        self.tx.body.inputs.iter().map(|input| input.amount).sum()
    }

    pub fn total_output(&self) -> Lovelace {
        self.tx.body.outputs.iter().map(|output| output.amount).sum()
    }

    fn total_payments(&self) -> Lovelace {
        self.tx
            .body
            .outputs
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != self.change_index)
            .map(|(_, output)| output.amount)
            .sum()
    }

    /// Size-accurate copy of the transaction with placeholder witnesses
    fn provisional(&self) -> Transaction {
        let mut tx = self.tx.clone();
        tx.witness_set.vkey_witnesses = placeholder_witnesses(self.reserved_witnesses);
        tx
    }

    /// Minimum fee for the transaction as it currently stands
    pub fn min_fee(&self) -> Result<Lovelace, TxBuildError> {
        compute_min_fee(&self.provisional(), &self.params)
    }

    /// Send everything not paid out to `change_address`, less the fee.
    ///
    /// The change output is added at full value so the fee is sized with it
    /// present, then reduced by the fee. Fails if the remainder cannot cover
    /// the fee plus a minimum UTxO.
    pub fn add_change_if_needed(&mut self, change_address: Address) -> Result<&mut Self, TxBuildError> {
        let total_input = self.total_input();
        let payments = self.total_payments();
        let change = total_input.checked_sub(payments).ok_or(InsufficientFundsError {
            available: total_input,
            required: payments,
        })?;

        if change > 0 {
            match self.change_index {
                Some(index) => {
                    self.tx.body.outputs[index] = TxOutput::new(change_address, change);
                }
                None => {
                    self.tx.body.outputs.push(TxOutput::new(change_address, change));
                    self.change_index = Some(self.tx.body.outputs.len() - 1);
                }
            }
        }

        let fee = self.min_fee()?;
        let floor = fee.saturating_add(self.params.min_utxo_value);
        let required = payments.saturating_add(floor);
        let change_index = match self.change_index {
            Some(index) if change >= floor => index,
            _ => {
                return Err(InsufficientFundsError {
                    available: total_input,
                    required,
                }
                .into());
            }
        };

        self.tx.body.outputs[change_index].amount = change - fee;
        self.tx.body.fee = fee;
        debug!(total_input, payments, fee, change = change - fee, "change added");
        Ok(self)
    }

    /// Finalize the transaction.
    ///
    /// With signing keys held, the body hash is signed and the witnesses
    /// attached. Without keys the witness list stays empty for out-of-band
    /// collection. Once witnesses are attached, further calls return the
    /// transaction unchanged.
    pub fn build(&mut self) -> Result<Transaction, TxBuildError> {
        if !self.tx.witness_set.vkey_witnesses.is_empty() {
            return Ok(self.tx.clone());
        }

        let size = self.provisional().size();
        if size > self.params.max_tx_size {
            return Err(TxBuildError::TxTooLarge {
                size,
                max: self.params.max_tx_size,
            });
        }

        let witnesses: Vec<_> =
            self.signing_keys.iter().map(|key| sign_transaction(&self.tx, key)).collect();
        self.tx.witness_set.vkey_witnesses = witnesses;
        Ok(self.tx.clone())
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }
}
