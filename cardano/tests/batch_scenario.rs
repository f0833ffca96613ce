use std::collections::{BTreeMap, HashSet};

use cardano_bridge_codec::Transaction;
use cardano_bridge_common::{
    KeyHash, Lovelace, Metadatum,
    configuration::{BridgeConfig, TxSettings},
    metadata::BRIDGE_METADATA_LABEL,
};
use cardano_bridge_test_utils::{
    address, bridge_config, chain_config, dual_multisig_keys, policy_config, protocol_parameters,
    utxo,
};
use cardano_bridge_tx::{
    BatchRequest, build_batch, compute_min_fee, finalize_with_witnesses, sign_transaction,
};

fn unsigned_batch() -> Transaction {
    let config = bridge_config("vector");
    let request = BatchRequest {
        chain_id: "vector".to_string(),
        payouts: BTreeMap::from([
            (address(1).to_string(), 1_000_000),
            (address(2).to_string(), 1_000_000),
        ]),
        batch_nonce_id: 1,
    };
    let plan = request.validate(&config).unwrap();
    build_batch(
        &plan,
        &config.tx,
        &protocol_parameters(),
        &[utxo(10, 5_000_000)],
        &[utxo(11, 5_000_000)],
        40_000,
    )
    .unwrap()
}

#[test]
fn dual_multisig_batch_fully_witnessed() {
    let unsigned = unsigned_batch();
    let (multisig, fee) = dual_multisig_keys();
    let witnesses: Vec<_> =
        multisig.iter().chain(fee.iter()).map(|key| sign_transaction(&unsigned, key)).collect();
    let tx = finalize_with_witnesses(unsigned, witnesses).unwrap();

    assert!(tx.body.inputs.len() <= 2);
    assert!(tx.body.outputs.len() <= 3);
    assert!(tx.body.outputs.iter().all(|output| output.amount > 0));
    assert_eq!(tx.witness_set.policy_scripts.len(), 2);
    assert_eq!(tx.witness_set.vkey_witnesses.len(), 8);
    assert!(tx.body.fee > 0);

    let metadata = &tx.auxiliary_data.as_ref().unwrap().metadata;
    assert_eq!(
        metadata[&BRIDGE_METADATA_LABEL].get("batch_nonce_id").and_then(Metadatum::as_u64),
        Some(1)
    );

    // the fee was sized for all eight witnesses
    assert!(tx.body.fee >= protocol_parameters().min_fee(tx.size()).unwrap());
    assert_eq!(compute_min_fee(&tx, &protocol_parameters()).unwrap(), tx.body.fee);

    let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
    assert_eq!(decoded.hash(), tx.hash());
    assert_eq!(decoded.witness_set, tx.witness_set);
}

#[test]
fn quorum_of_each_policy_satisfies_both_scripts() {
    let unsigned = unsigned_batch();
    let (multisig, fee) = dual_multisig_keys();
    let signers = multisig[1..].iter().chain(fee[1..].iter());
    let witnesses: Vec<_> = signers.map(|key| sign_transaction(&unsigned, key)).collect();
    let tx = finalize_with_witnesses(unsigned, witnesses).unwrap();

    let provided: HashSet<KeyHash> =
        tx.witness_set.vkey_witnesses.iter().map(|witness| witness.key_hash()).collect();
    assert_eq!(provided.len(), 6);
    assert!(tx.witness_set.policy_scripts.iter().all(|script| script.eval(&provided, None, None)));
}

#[test]
fn signers_of_one_policy_do_not_satisfy_the_other() {
    let unsigned = unsigned_batch();
    let (multisig, _) = dual_multisig_keys();
    let witnesses: Vec<_> = multisig.iter().map(|key| sign_transaction(&unsigned, key)).collect();
    let tx = finalize_with_witnesses(unsigned, witnesses).unwrap();

    let provided: HashSet<KeyHash> =
        tx.witness_set.vkey_witnesses.iter().map(|witness| witness.key_hash()).collect();
    let [multisig_policy, fee_policy] = &tx.witness_set.policy_scripts[..] else {
        panic!("expected two policy scripts");
    };
    assert!(multisig_policy.eval(&provided, None, None));
    assert!(!fee_policy.eval(&provided, None, None));
}

#[test]
fn shared_multisig_and_fee_address_spends_each_output_once() {
    let (keys, _) = dual_multisig_keys();
    let policy = policy_config(3, &keys);
    let config = BridgeConfig {
        tx: TxSettings::default(),
        chains: BTreeMap::from([("vector".to_string(), chain_config(policy.clone(), policy))]),
    };
    let request = BatchRequest {
        chain_id: "vector".to_string(),
        payouts: BTreeMap::from([
            (address(1).to_string(), 1_000_000),
            (address(2).to_string(), 1_000_000),
        ]),
        batch_nonce_id: 2,
    };
    let plan = request.validate(&config).unwrap();
    assert_eq!(plan.multisig_address, plan.fee_address);

    // the node reports the same UTxO set for both roles
    let utxos = [utxo(10, 5_000_000)];
    let unsigned =
        build_batch(&plan, &config.tx, &protocol_parameters(), &utxos, &utxos, 40_000).unwrap();

    assert_eq!(unsigned.body.inputs.len(), 1);
    let paid: Lovelace = unsigned.body.outputs.iter().map(|output| output.amount).sum();
    assert_eq!(paid + unsigned.body.fee, 5_000_000);
    assert_eq!(unsigned.witness_set.policy_scripts.len(), 1);

    let witnesses: Vec<_> = keys.iter().map(|key| sign_transaction(&unsigned, key)).collect();
    let tx = finalize_with_witnesses(unsigned, witnesses).unwrap();
    assert_eq!(compute_min_fee(&tx, &protocol_parameters()).unwrap(), tx.body.fee);
}
