//! Linear fee model and the fee/size fixed point

use cardano_bridge_codec::{Transaction, VKeyWitness};
use cardano_bridge_common::{Lovelace, ProtocolParameters};
use tracing::debug;

use crate::error::TxBuildError;

/// Upper bound on sizing passes. The fee only ever grows between passes and
/// each byte of growth is bounded, so two or three passes settle in practice.
pub const MAX_FEE_PASSES: usize = 8;

/// `constant + coefficient * size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearFee {
    pub coefficient: u64,
    pub constant: u64,
}

impl LinearFee {
    pub fn new(coefficient: u64, constant: u64) -> Self {
        Self {
            coefficient,
            constant,
        }
    }

    /// `None` when the fee does not fit in a `Lovelace`
    pub fn fee_for_size(&self, size: u64) -> Option<Lovelace> {
        self.coefficient.checked_mul(size)?.checked_add(self.constant)
    }
}

impl From<&ProtocolParameters> for LinearFee {
    fn from(params: &ProtocolParameters) -> Self {
        Self::new(params.fee_per_byte, params.fee_fixed)
    }
}

/// Zero-filled witnesses, the same encoded size as real ones
pub fn placeholder_witnesses(count: usize) -> Vec<VKeyWitness> {
    vec![VKeyWitness::placeholder(); count]
}

/// Minimum fee for a size-accurate provisional transaction.
///
/// `provisional` must already carry its final inputs, outputs, metadata,
/// scripts and placeholder witnesses. The fee field is sized from zero and
/// re-measured until the fee no longer changes, which takes at least two
/// passes. The result does not depend on the fee already in `provisional`.
pub fn compute_min_fee(
    provisional: &Transaction,
    params: &ProtocolParameters,
) -> Result<Lovelace, TxBuildError> {
    let linear = LinearFee::from(params);
    let fee_for = |size| linear.fee_for_size(size).ok_or(TxBuildError::FeeOverflow { size });
    let mut tx = provisional.clone();
    tx.body.fee = 0;

    let mut fee = fee_for(tx.size())?;
    for pass in 2..=MAX_FEE_PASSES {
        tx.body.fee = fee;
        let size = tx.size();
        if size > params.max_tx_size {
            return Err(TxBuildError::TxTooLarge {
                size,
                max: params.max_tx_size,
            });
        }

        let next = fee_for(size)?;
        debug!(pass, size, fee = next, "fee pass");
        if next == fee {
            return Ok(fee);
        }
        fee = next;
    }

    Err(TxBuildError::FeeNotConverged {
        passes: MAX_FEE_PASSES,
    })
}
