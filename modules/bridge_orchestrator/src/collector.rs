//! Witness collection for multisig transactions
//!
//! Envelopes are read from a relay until every policy in the witness set is
//! satisfied or the collection window closes. Witnesses for another body,
//! with bad signatures, from keys outside the policies, repeated, or for a
//! policy that is already satisfied are dropped with a log line, so the
//! result carries exactly the quorum.

use std::{collections::HashSet, time::Duration};

use cardano_bridge_codec::{Transaction, VKeyWitness};
use cardano_bridge_common::{KeyHash, PolicyScript};
use cardano_bridge_tx::{TxBuildError, finalize_with_witnesses, hash_body};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::relay::{RelayChannel, RelayError};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("quorum not reached within {timeout:?}: {collected} of {required} witnesses")]
    Timeout {
        collected: usize,
        required: usize,
        timeout: Duration,
    },

    #[error("relay closed with {collected} of {required} witnesses")]
    RelayClosed { collected: usize, required: usize },

    #[error(transparent)]
    Build(#[from] TxBuildError),
}

pub struct WitnessCollector {
    tx: Transaction,
    participants: HashSet<KeyHash>,
    timeout: Duration,
}

impl WitnessCollector {
    /// Collector for `tx`, whose quorum is defined by its own policy scripts
    pub fn new(tx: Transaction, timeout: Duration) -> Self {
        let participants =
            tx.witness_set.policy_scripts.iter().flat_map(PolicyScript::key_hashes).collect();
        Self {
            tx,
            participants,
            timeout,
        }
    }

    /// Fewest witnesses that satisfy every policy
    pub fn required(&self) -> usize {
        self.tx.witness_set.policy_scripts.iter().map(PolicyScript::required_signers).sum()
    }

    fn satisfied(&self, script: &PolicyScript, provided: &HashSet<KeyHash>) -> bool {
        script.eval(provided, None, Some(self.tx.body.ttl))
    }

    fn quorum(&self, provided: &HashSet<KeyHash>) -> bool {
        self.tx.witness_set.policy_scripts.iter().all(|script| self.satisfied(script, provided))
    }

    /// True if `key_hash` participates in a policy that still lacks signatures
    fn needed(&self, key_hash: &KeyHash, provided: &HashSet<KeyHash>) -> bool {
        self.tx.witness_set.policy_scripts.iter().any(|script| {
            script.key_hashes().contains(key_hash) && !self.satisfied(script, provided)
        })
    }

    /// Gather witnesses until quorum and return the completed transaction
    pub async fn collect(self, relay: &dyn RelayChannel) -> Result<Transaction, CollectError> {
        let body_hash = hash_body(&self.tx.body);
        let required = self.required();
        let deadline = Instant::now() + self.timeout;

        let mut witnesses: Vec<VKeyWitness> = Vec::new();
        let mut provided: HashSet<KeyHash> = HashSet::new();

        while !self.quorum(&provided) {
            let envelope = match timeout_at(deadline, relay.next()).await {
                Err(_) => {
                    return Err(CollectError::Timeout {
                        collected: witnesses.len(),
                        required,
                        timeout: self.timeout,
                    });
                }
                Ok(Err(RelayError::Closed)) => {
                    return Err(CollectError::RelayClosed {
                        collected: witnesses.len(),
                        required,
                    });
                }
                Ok(Err(RelayError::Codec(e))) => {
                    warn!("dropping undecodable envelope: {e}");
                    continue;
                }
                Ok(Ok(envelope)) => envelope,
            };

            let witness = envelope.witness;
            let key_hash = witness.key_hash();
            if hash_body(&envelope.transaction.body) != body_hash {
                warn!(%key_hash, "dropping witness for another transaction");
            } else if !witness.verify(body_hash) {
                warn!(%key_hash, "dropping witness with invalid signature");
            } else if !self.participants.contains(&key_hash) {
                warn!(%key_hash, "dropping witness from non-participant");
            } else if provided.contains(&key_hash) {
                debug!(%key_hash, "ignoring repeated witness");
            } else if !self.needed(&key_hash, &provided) {
                debug!(%key_hash, "ignoring witness for satisfied policy");
            } else {
                provided.insert(key_hash);
                debug!(%key_hash, collected = witnesses.len() + 1, required, "witness accepted");
                witnesses.push(witness);
            }
        }

        info!(tx_hash = %body_hash, witnesses = witnesses.len(), "quorum reached");
        Ok(finalize_with_witnesses(self.tx, witnesses)?)
    }
}
