use crate::types::Lovelace;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    pub major: u64,
    pub minor: u64,
}

/// Ledger parameters the transaction builder depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    /// Linear fee coefficient (lovelace per byte)
    pub fee_per_byte: u64,

    /// Linear fee constant
    pub fee_fixed: u64,

    /// Maximum size of an encoded transaction, in bytes
    pub max_tx_size: u64,

    #[serde(rename = "minUTxOValue")]
    pub min_utxo_value: Lovelace,

    pub version: ProtocolVersion,
}

impl ProtocolParameters {
    /// Minimum fee for a transaction of `tx_size` bytes; `None` on overflow
    pub fn min_fee(&self, tx_size: u64) -> Option<Lovelace> {
        self.fee_per_byte.checked_mul(tx_size)?.checked_add(self.fee_fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_fee() {
        let params = ProtocolParameters {
            fee_per_byte: 44,
            fee_fixed: 155381,
            max_tx_size: 16384,
            min_utxo_value: 1_000_000,
            version: ProtocolVersion { major: 8, minor: 0 },
        };
        assert_eq!(params.min_fee(0), Some(155381));
        assert_eq!(params.min_fee(300), Some(155381 + 44 * 300));
    }

    #[test]
    fn linear_fee_overflow() {
        let params = ProtocolParameters {
            fee_per_byte: u64::MAX / 2,
            fee_fixed: 1,
            max_tx_size: 16384,
            min_utxo_value: 1_000_000,
            version: ProtocolVersion::default(),
        };
        assert_eq!(params.min_fee(1), Some(u64::MAX / 2 + 1));
        assert_eq!(params.min_fee(3), None);
        assert_eq!(ProtocolParameters { fee_fixed: u64::MAX, ..params }.min_fee(1), None);
    }

    #[test]
    fn json_names() {
        let json = r#"{"feePerByte":44,"feeFixed":155381,"maxTxSize":16384,
            "minUTxOValue":1000000,"version":{"major":9,"minor":1}}"#;
        let params: ProtocolParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.fee_per_byte, 44);
        assert_eq!(params.min_utxo_value, 1_000_000);
        assert_eq!(params.version, ProtocolVersion { major: 9, minor: 1 });
    }
}
