//! Greedy UTxO selection

use cardano_bridge_codec::TxInput;
use cardano_bridge_common::{InsufficientFundsError, Lovelace};
use tracing::debug;

/// Pick inputs covering `target + potential_fee + min_change_value`.
///
/// Walks `available` once, in order. The first candidate that covers the
/// whole amount on its own is taken alone; otherwise candidates are
/// accumulated until the running total covers it. The `min_change_value`
/// term keeps any change output above the minimum UTxO value.
pub fn select_inputs(
    available: &[TxInput],
    target: Lovelace,
    potential_fee: Lovelace,
    min_change_value: Lovelace,
) -> Result<Vec<TxInput>, InsufficientFundsError> {
    let desired = target.saturating_add(potential_fee).saturating_add(min_change_value);

    let mut chosen = Vec::new();
    let mut sum: Lovelace = 0;
    for utxo in available {
        if utxo.amount >= desired {
            debug!(
                tx_hash = %utxo.tx_hash,
                index = utxo.index,
                desired,
                "single input covers target"
            );
            return Ok(vec![utxo.clone()]);
        }

        sum = sum.saturating_add(utxo.amount);
        chosen.push(utxo.clone());
        if sum >= desired {
            debug!(inputs = chosen.len(), sum, desired, "accumulated inputs cover target");
            return Ok(chosen);
        }
    }

    Err(InsufficientFundsError {
        available: sum,
        required: desired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardano_bridge_common::TxHash;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use test_case::test_case;

    fn utxos(amounts: &[Lovelace]) -> Vec<TxInput> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| TxInput::new(TxHash::new([i as u8; 32]), i as u16, *amount))
            .collect()
    }

    fn indexes(selected: &[TxInput]) -> Vec<u16> {
        selected.iter().map(|input| input.index).collect()
    }

    #[test_case(&[5_000_000], 1_000_000 => vec![0u16] ; "single sufficient utxo")]
    #[test_case(&[1_000_000, 5_000_000, 9_000_000], 2_000_000 => vec![1u16] ; "first sufficient utxo wins")]
    #[test_case(&[1_000_000, 1_500_000, 1_000_000], 1_000_000 => vec![0u16, 1] ; "accumulates in order")]
    #[test_case(&[3_200_000], 2_000_000 => vec![0u16] ; "exact desired amount")]
    #[test_case(&[1_000_000, 1_000_000, 9_000_000], 2_000_000 => vec![2u16] ; "later large utxo is taken alone")]
    fn selects(amounts: &[Lovelace], target: Lovelace) -> Vec<u16> {
        // desired = target + 200_000 + 1_000_000
        indexes(&select_inputs(&utxos(amounts), target, 200_000, 1_000_000).unwrap())
    }

    #[test]
    fn insufficient_funds_reports_amounts() {
        let err = select_inputs(&utxos(&[1_000_000, 500_000]), 2_000_000, 200_000, 1_000_000)
            .unwrap_err();
        assert_eq!(
            err,
            InsufficientFundsError {
                available: 1_500_000,
                required: 3_200_000
            }
        );
    }

    #[test]
    fn empty_set_is_insufficient() {
        let err = select_inputs(&[], 0, 200_000, 0).unwrap_err();
        assert_eq!(err.available, 0);
        assert_eq!(err.required, 200_000);
    }

    #[quickcheck]
    fn selection_is_sufficient(amounts: Vec<u32>, target: u32, potential_fee: u16) -> TestResult {
        let available = utxos(&amounts.iter().map(|a| u64::from(*a)).collect::<Vec<_>>());
        let target = u64::from(target);
        let potential_fee = u64::from(potential_fee);
        let min_change = 1_000_000;
        let desired = target + potential_fee + min_change;
        let total: u64 = available.iter().map(|i| i.amount).sum();

        match select_inputs(&available, target, potential_fee, min_change) {
            Ok(selected) => {
                let sum: u64 = selected.iter().map(|i| i.amount).sum();
                TestResult::from_bool(total >= desired && sum >= desired && !selected.is_empty())
            }
            Err(err) => TestResult::from_bool(
                total < desired && err.available == total && err.required == desired,
            ),
        }
    }
}
