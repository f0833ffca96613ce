use std::{collections::BTreeMap, sync::Arc};

use cardano_bridge_codec::{TxInput, WitnessEnvelope};
use cardano_bridge_common::{
    ValidationError,
    configuration::{BridgeConfig, TxSettings},
};
use cardano_bridge_module_orchestrator::{
    ChainService, InMemoryNode, InMemoryRelay, Node, NodeError, RelayChannel, ServiceError,
    in_memory_node::REJECT_VALUE_NOT_CONSERVED,
};
use cardano_bridge_test_utils::{
    address, bridge_config, chain_config, dual_multisig_keys, key_address, policy_config,
    protocol_parameters, signing_key, utxo,
};
use cardano_bridge_tx::DepositRequest;

const CHAIN: &str = "prime";

async fn setup() -> (Arc<InMemoryNode>, ChainService) {
    let node = Arc::new(InMemoryNode::new(protocol_parameters()));
    node.set_tip(50_000).await;
    let service = ChainService::new(CHAIN, Arc::new(bridge_config(CHAIN)), node.clone()).unwrap();
    (node, service)
}

#[tokio::test]
async fn deposit_then_batch_payout() {
    let (node, service) = setup().await;
    let config = bridge_config(CHAIN);
    let chain = &config.chains[CHAIN];

    // user deposit locks 2 ADA for the receivers plus the bridging fee
    let sender = signing_key(42);
    node.add_utxo(key_address(&sender), utxo(1, 20_000_000)).await;
    let request = DepositRequest::new(
        key_address(&sender).to_string(),
        CHAIN,
        BTreeMap::from([(address(1).to_string(), 1_000_000), (address(2).to_string(), 1_000_000)]),
    );
    let deposit = service.build_deposit(&request).await.unwrap();
    assert_eq!(deposit.body.ttl, 50_300);
    let deposit_id = service.sign_and_submit(deposit, &sender).await.unwrap();
    assert_eq!(
        node.get_utxos(&chain.multisig_address).await.unwrap(),
        vec![TxInput::new(deposit_id, 0, 3_000_000)]
    );

    // validators pay it out, the fee address covering the fee
    node.add_utxo(chain.fee_address.clone(), utxo(2, 5_000_000)).await;
    let payouts =
        BTreeMap::from([(address(1).to_string(), 1_000_000), (address(2).to_string(), 1_000_000)]);
    let batch = service.build_batch(payouts, 1).await.unwrap();
    assert!(batch.witness_set.vkey_witnesses.is_empty());

    let relay = Arc::new(InMemoryRelay::new());
    let (multisig, fee) = dual_multisig_keys();
    let signers: Vec<_> = multisig
        .into_iter()
        .chain(fee)
        .map(|key| {
            let relay = relay.clone();
            let batch = batch.clone();
            tokio::spawn(async move {
                let witness = cardano_bridge_tx::sign_transaction(&batch, &key);
                relay.publish(&WitnessEnvelope::new(batch, witness)).await
            })
        })
        .collect();
    for signer in signers {
        signer.await.unwrap().unwrap();
    }

    let batch_id = service.collect_and_submit(batch, relay.as_ref()).await.unwrap();
    for receiver in [address(1), address(2)] {
        let received = node.get_utxos(&receiver).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].tx_hash, batch_id);
        assert_eq!(received[0].amount, 1_000_000);
    }

    let submitted = node.submitted().await;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[1].witness_set.vkey_witnesses.len(), 6);
    assert!(node.get_utxos(&chain.fee_address).await.unwrap().is_empty());
}

#[tokio::test]
async fn deposit_validation_precedes_node_queries() {
    let (_, service) = setup().await;
    let request = DepositRequest::new(
        key_address(&signing_key(42)).to_string(),
        "unknown",
        BTreeMap::from([(address(1).to_string(), 1_000_000)]),
    );
    assert!(matches!(
        service.build_deposit(&request).await,
        Err(ServiceError::Validation(ValidationError::UnsupportedChain(_)))
    ));
}

#[tokio::test]
async fn unfunded_sender() {
    let (_, service) = setup().await;
    let request = DepositRequest::new(
        key_address(&signing_key(42)).to_string(),
        CHAIN,
        BTreeMap::from([(address(1).to_string(), 1_000_000)]),
    );
    assert!(matches!(
        service.build_deposit(&request).await,
        Err(ServiceError::Build(cardano_bridge_tx::TxBuildError::InsufficientFunds(_)))
    ));
}

#[test]
fn unknown_service_chain() {
    let node = Arc::new(InMemoryNode::new(protocol_parameters()));
    assert!(matches!(
        ChainService::new("vector", Arc::new(bridge_config(CHAIN)), node),
        Err(ValidationError::UnsupportedChain(_))
    ));
}

#[tokio::test]
async fn node_rejects_unbalanced_transaction() {
    let (node, service) = setup().await;
    let sender = signing_key(42);
    node.add_utxo(key_address(&sender), utxo(1, 20_000_000)).await;
    let request = DepositRequest::new(
        key_address(&sender).to_string(),
        CHAIN,
        BTreeMap::from([(address(1).to_string(), 1_000_000)]),
    );
    let mut deposit = service.build_deposit(&request).await.unwrap();
    deposit.body.outputs[0].amount += 1_000_000;

    assert!(matches!(
        service.sign_and_submit(deposit, &sender).await,
        Err(ServiceError::Node(NodeError::Submission {
            code: REJECT_VALUE_NOT_CONSERVED,
            ..
        }))
    ));
    assert!(node.submitted().await.is_empty());
    assert_eq!(node.get_utxos(&key_address(&sender)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn batch_from_shared_multisig_and_fee_address() {
    let (keys, _) = dual_multisig_keys();
    let policy = policy_config(3, &keys);
    let chain = chain_config(policy.clone(), policy);
    let bridge_address = chain.multisig_address.clone();
    let config = BridgeConfig {
        tx: TxSettings::default(),
        chains: BTreeMap::from([(CHAIN.to_string(), chain)]),
    };

    let node = Arc::new(InMemoryNode::new(protocol_parameters()));
    node.add_utxo(bridge_address.clone(), utxo(3, 5_000_000)).await;
    let service = ChainService::new(CHAIN, Arc::new(config), node.clone()).unwrap();

    let payouts =
        BTreeMap::from([(address(1).to_string(), 1_000_000), (address(2).to_string(), 1_000_000)]);
    let batch = service.build_batch(payouts, 3).await.unwrap();
    assert_eq!(batch.body.inputs.len(), 1);

    let relay = InMemoryRelay::new();
    for key in &keys[..3] {
        let witness = cardano_bridge_tx::sign_transaction(&batch, key);
        relay.publish(&WitnessEnvelope::new(batch.clone(), witness)).await.unwrap();
    }
    let batch_id = service.collect_and_submit(batch, &relay).await.unwrap();

    let change = node.get_utxos(&bridge_address).await.unwrap();
    assert_eq!(change.len(), 1);
    assert_eq!(change[0].tx_hash, batch_id);
    let submitted = node.submitted().await;
    assert_eq!(submitted[0].witness_set.vkey_witnesses.len(), 3);
    assert_eq!(change[0].amount + submitted[0].body.fee, 3_000_000);
}
