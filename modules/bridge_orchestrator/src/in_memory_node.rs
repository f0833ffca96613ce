//! In-memory node holding a UTxO set, for tests and dry runs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use cardano_bridge_codec::{Transaction, TxInput};
use cardano_bridge_common::{Address, Lovelace, ProtocolParameters, Slot, TxHash};
use tokio::sync::RwLock;
use tracing::info;

use crate::node::{Node, NodeError, Tip};

/// Code used when a submitted transaction cannot be decoded or lists an input twice
pub const REJECT_MALFORMED: i64 = 3000;

/// Code used when a submitted transaction spends an unknown output
pub const REJECT_UNKNOWN_INPUT: i64 = 3117;

/// Code used when inputs do not equal outputs plus fee
pub const REJECT_VALUE_NOT_CONSERVED: i64 = 3123;

pub struct InMemoryNode {
    params: ProtocolParameters,
    tip: RwLock<Slot>,

    /// Unspent outputs by address, in insertion order
    utxos: RwLock<HashMap<Address, Vec<TxInput>>>,

    /// Every accepted transaction, in submission order
    submitted: RwLock<Vec<Transaction>>,
}

impl InMemoryNode {
    pub fn new(params: ProtocolParameters) -> Self {
        Self {
            params,
            tip: RwLock::new(0),
            utxos: RwLock::new(HashMap::new()),
            submitted: RwLock::new(Vec::new()),
        }
    }

    pub async fn add_utxo(&self, address: Address, utxo: TxInput) {
        self.utxos.write().await.entry(address).or_default().push(utxo);
    }

    pub async fn set_tip(&self, slot: Slot) {
        *self.tip.write().await = slot;
    }

    pub async fn submitted(&self) -> Vec<Transaction> {
        self.submitted.read().await.clone()
    }

    /// Ledger value of the output `input` spends
    fn lookup(utxos: &HashMap<Address, Vec<TxInput>>, input: &TxInput) -> Option<Lovelace> {
        utxos
            .values()
            .flatten()
            .find(|u| u.outpoint() == input.outpoint())
            .map(|u| u.amount)
    }

    /// Check `tx` against the UTxO set: distinct, known inputs whose value
    /// equals outputs plus fee
    fn validate(
        utxos: &HashMap<Address, Vec<TxInput>>,
        tx: &Transaction,
    ) -> Result<(), NodeError> {
        let mut seen = HashSet::new();
        let mut consumed: u128 = 0;
        for input in &tx.body.inputs {
            if !seen.insert(input.outpoint()) {
                return Err(NodeError::Submission {
                    code: REJECT_MALFORMED,
                    message: format!("input {}#{} listed twice", input.tx_hash, input.index),
                });
            }
            let amount = Self::lookup(utxos, input).ok_or_else(|| NodeError::Submission {
                code: REJECT_UNKNOWN_INPUT,
                message: format!("unknown input {}#{}", input.tx_hash, input.index),
            })?;
            consumed += u128::from(amount);
        }

        let produced = tx.body.outputs.iter().map(|o| u128::from(o.amount)).sum::<u128>()
            + u128::from(tx.body.fee);
        if consumed != produced {
            return Err(NodeError::Submission {
                code: REJECT_VALUE_NOT_CONSERVED,
                message: format!("value not conserved: consumed {consumed}, produced {produced}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Node for InMemoryNode {
    async fn get_protocol_parameters(&self) -> Result<ProtocolParameters, NodeError> {
        Ok(self.params.clone())
    }

    async fn get_utxos(&self, address: &Address) -> Result<Vec<TxInput>, NodeError> {
        Ok(self.utxos.read().await.get(address).cloned().unwrap_or_default())
    }

    async fn get_tip(&self) -> Result<Tip, NodeError> {
        Ok(Tip {
            slot: *self.tip.read().await,
        })
    }

    /// Spends the inputs and records the outputs as new UTxOs. Rejects
    /// repeated or unknown inputs and any imbalance between inputs and
    /// outputs plus fee.
    async fn submit_transaction(&self, tx: &[u8]) -> Result<TxHash, NodeError> {
        let tx = Transaction::from_bytes(tx).map_err(|e| NodeError::Submission {
            code: REJECT_MALFORMED,
            message: e.to_string(),
        })?;
        let id = tx.hash();

        let mut utxos = self.utxos.write().await;
        Self::validate(&utxos, &tx)?;

        let spent: HashSet<_> = tx.body.inputs.iter().map(TxInput::outpoint).collect();
        for held in utxos.values_mut() {
            held.retain(|u| !spent.contains(&u.outpoint()));
        }
        for (index, output) in tx.body.outputs.iter().enumerate() {
            utxos
                .entry(output.address.clone())
                .or_default()
                .push(TxInput::new(id, index as u16, output.amount));
        }
        drop(utxos);

        info!(tx_hash = %id, "accepted transaction");
        self.submitted.write().await.push(tx);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardano_bridge_codec::TxOutput;
    use cardano_bridge_test_utils::{address, protocol_parameters, utxo};

    fn spend(input: TxInput, to: Address, amount: u64) -> Transaction {
        let mut tx = Transaction::default();
        tx.body.fee = input.amount - amount;
        tx.body.inputs.push(input);
        tx.body.outputs.push(TxOutput::new(to, amount));
        tx
    }

    #[tokio::test]
    async fn submission_moves_funds() {
        let node = InMemoryNode::new(protocol_parameters());
        node.add_utxo(address(1), utxo(1, 5_000_000)).await;

        let tx = spend(utxo(1, 5_000_000), address(2), 4_800_000);
        let id = node.submit_transaction(&tx.to_bytes()).await.unwrap();

        assert!(node.get_utxos(&address(1)).await.unwrap().is_empty());
        assert_eq!(
            node.get_utxos(&address(2)).await.unwrap(),
            vec![TxInput::new(id, 0, 4_800_000)]
        );
        assert_eq!(node.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn double_spend_rejected() {
        let node = InMemoryNode::new(protocol_parameters());
        node.add_utxo(address(1), utxo(1, 5_000_000)).await;

        let tx = spend(utxo(1, 5_000_000), address(2), 4_800_000);
        node.submit_transaction(&tx.to_bytes()).await.unwrap();
        assert!(matches!(
            node.submit_transaction(&tx.to_bytes()).await,
            Err(NodeError::Submission { code: REJECT_UNKNOWN_INPUT, .. })
        ));
    }

    #[tokio::test]
    async fn garbage_rejected() {
        let node = InMemoryNode::new(protocol_parameters());
        assert!(matches!(
            node.submit_transaction(&[0xff, 0x00]).await,
            Err(NodeError::Submission { code: REJECT_MALFORMED, .. })
        ));
    }

    #[tokio::test]
    async fn repeated_input_rejected() {
        let node = InMemoryNode::new(protocol_parameters());
        node.add_utxo(address(1), utxo(1, 5_000_000)).await;

        // counting the one UTxO twice would fund 9.8 ADA of outputs
        let mut tx = spend(utxo(1, 5_000_000), address(2), 4_800_000);
        tx.body.inputs.push(utxo(1, 5_000_000));
        tx.body.outputs.push(TxOutput::new(address(3), 5_000_000));
        assert!(matches!(
            node.submit_transaction(&tx.to_bytes()).await,
            Err(NodeError::Submission { code: REJECT_MALFORMED, .. })
        ));
        assert_eq!(node.get_utxos(&address(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unbalanced_transaction_rejected() {
        let node = InMemoryNode::new(protocol_parameters());
        node.add_utxo(address(1), utxo(1, 5_000_000)).await;

        let mut tx = spend(utxo(1, 5_000_000), address(2), 4_800_000);
        tx.body.fee = 100_000;
        assert!(matches!(
            node.submit_transaction(&tx.to_bytes()).await,
            Err(NodeError::Submission { code: REJECT_VALUE_NOT_CONSERVED, .. })
        ));
        assert!(node.submitted().await.is_empty());
    }
}
