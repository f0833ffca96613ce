use cardano_bridge_codec::CodecError;
use cardano_bridge_common::{
    InsufficientFundsError, Lovelace, PolicyError, ValidationError, VerificationKey,
};
use thiserror::Error;

/// Any failure while constructing, sizing or completing a transaction
#[derive(Debug, Error)]
pub enum TxBuildError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFundsError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("output of {amount} is below the minimum UTxO value {minimum}")]
    OutputBelowMinimum { amount: Lovelace, minimum: Lovelace },

    #[error("transaction size {size} exceeds the maximum {max}")]
    TxTooLarge { size: u64, max: u64 },

    #[error("fee for a {size} byte transaction overflows")]
    FeeOverflow { size: u64 },

    #[error("fee did not settle after {passes} passes")]
    FeeNotConverged { passes: usize },

    #[error("duplicate witness from {0}")]
    DuplicateWitness(VerificationKey),

    #[error("witness from {0} does not sign this transaction")]
    InvalidWitness(VerificationKey),
}
