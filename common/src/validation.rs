//! Error taxonomy for transaction construction

use thiserror::Error;

use crate::{address::AddressError, types::Lovelace};

/// Caller input rejected before any node interaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sender address is empty")]
    EmptySender,

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: AddressError },

    #[error("destination chain id is empty")]
    EmptyChainId,

    #[error("destination chain {0} is not supported")]
    UnsupportedChain(String),

    #[error("no receivers")]
    NoRecipients,

    #[error("amount {amount} for {address} is below the minimum UTxO value {minimum}")]
    AmountBelowMinimum {
        address: String,
        amount: Lovelace,
        minimum: Lovelace,
    },
}

impl ValidationError {
    pub fn invalid_address(address: &str, reason: AddressError) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason,
        }
    }
}

/// Not enough value in the candidate UTxOs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient funds: available {available}, required {required}")]
pub struct InsufficientFundsError {
    pub available: Lovelace,
    pub required: Lovelace,
}

/// Malformed policy configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("threshold {threshold} must be between 1 and {participants} participants")]
    InvalidThreshold { threshold: u32, participants: usize },
}
