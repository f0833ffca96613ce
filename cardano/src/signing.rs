//! Body hashing and witness production

use std::collections::HashSet;

use cardano_bridge_codec::{Transaction, TxBody, VKeyWitness};
use cardano_bridge_common::{Signature, SigningKey, TxHash, VerificationKey};

use crate::error::TxBuildError;

/// Blake2b-256 of the canonical body encoding. Witness set and auxiliary
/// data are not covered (metadata is covered through its hash in the body).
pub fn hash_body(body: &TxBody) -> TxHash {
    body.hash()
}

pub fn sign(key: &SigningKey, body_hash: &TxHash) -> Signature {
    key.sign(body_hash)
}

pub fn witness(vkey: VerificationKey, signature: Signature) -> VKeyWitness {
    VKeyWitness::new(vkey, signature)
}

/// One signer's witness for `tx`
pub fn sign_transaction(tx: &Transaction, key: &SigningKey) -> VKeyWitness {
    let body_hash = hash_body(&tx.body);
    witness(key.public_key(), sign(key, &body_hash))
}

/// Merge externally collected witnesses into `tx`.
///
/// Every witness must verify against the body hash and no key may sign
/// twice. The body is left untouched.
pub fn finalize_with_witnesses(
    mut tx: Transaction,
    witnesses: impl IntoIterator<Item = VKeyWitness>,
) -> Result<Transaction, TxBuildError> {
    let body_hash = hash_body(&tx.body);
    let mut signers: HashSet<VerificationKey> =
        tx.witness_set.vkey_witnesses.iter().map(|w| w.vkey).collect();

    for witness in witnesses {
        if !witness.verify(body_hash) {
            return Err(TxBuildError::InvalidWitness(witness.vkey));
        }
        if !signers.insert(witness.vkey) {
            return Err(TxBuildError::DuplicateWitness(witness.vkey));
        }
        tx.witness_set.vkey_witnesses.push(witness);
    }

    Ok(tx)
}
