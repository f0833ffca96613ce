//! Checks on caller input, run before any node interaction

use std::collections::BTreeMap;

use cardano_bridge_common::{Address, Lovelace, ValidationError};

pub fn parse_address(text: &str) -> Result<Address, ValidationError> {
    Address::from_bech32(text).map_err(|reason| ValidationError::invalid_address(text, reason))
}

/// Parse a receiver map into outputs, in key order.
///
/// Fails on an empty map, on any amount below `min_utxo_value`, then on any
/// address that does not parse.
pub fn parse_receivers(
    receivers: &BTreeMap<String, Lovelace>,
    min_utxo_value: Lovelace,
) -> Result<Vec<(Address, Lovelace)>, ValidationError> {
    if receivers.is_empty() {
        return Err(ValidationError::NoRecipients);
    }

    receivers
        .iter()
        .map(|(address, amount)| {
            if *amount < min_utxo_value {
                return Err(ValidationError::AmountBelowMinimum {
                    address: address.clone(),
                    amount: *amount,
                    minimum: min_utxo_value,
                });
            }
            Ok((parse_address(address)?, *amount))
        })
        .collect()
}
