//! Subcommands of the bridge CLI

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use cardano_bridge_codec::{Transaction, WitnessEnvelope};
use cardano_bridge_common::{Address, Lovelace, SigningKey, configuration::BridgeConfig};
use cardano_bridge_module_ogmios::OgmiosClient;
use cardano_bridge_module_orchestrator::{ChainService, InMemoryRelay, RelayChannel};
use cardano_bridge_tx::{DepositRequest, sign_transaction};
use tokio::fs;
use tracing::info;

#[derive(clap::Subcommand)]
pub enum Command {
    /// Build a deposit from the key's address, sign it and submit it
    Deposit {
        /// Chain whose node funds the deposit
        #[arg(long)]
        chain: String,
        /// Destination chain recorded in the metadata
        #[arg(long)]
        destination: String,
        /// File holding the hex signing key
        #[arg(long)]
        key: PathBuf,
        /// Receiver as ADDRESS=LOVELACE; may be repeated
        #[arg(long = "receiver", value_parser = parse_amount, required = true)]
        receivers: Vec<(String, Lovelace)>,
        /// Print the signed transaction instead of submitting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Build an unsigned batch and print its CBOR hex
    Batch {
        #[arg(long)]
        chain: String,
        /// Payout as ADDRESS=LOVELACE; may be repeated
        #[arg(long = "payout", value_parser = parse_amount, required = true)]
        payouts: Vec<(String, Lovelace)>,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Sign a transaction and print the witness envelope hex
    Witness {
        #[arg(long)]
        key: PathBuf,
        /// File holding the transaction CBOR hex
        tx: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Collect witness envelopes into a transaction and submit it once quorum is met
    Submit {
        #[arg(long)]
        chain: String,
        tx: PathBuf,
        /// File holding a witness envelope hex; may be repeated
        #[arg(long = "witness", required = true)]
        witnesses: Vec<PathBuf>,
    },

    /// Decode and print a transaction
    Inspect { tx: PathBuf },
}

/// Parse `ADDRESS=LOVELACE`
fn parse_amount(arg: &str) -> Result<(String, Lovelace), String> {
    let (address, amount) =
        arg.split_once('=').ok_or_else(|| format!("expected ADDRESS=LOVELACE, got '{arg}'"))?;
    let amount = amount.parse().map_err(|e| format!("bad amount '{amount}': {e}"))?;
    Ok((address.to_string(), amount))
}

async fn read_hex(path: &PathBuf) -> Result<String> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))?;
    Ok(text.trim().to_string())
}

async fn read_key(path: &PathBuf) -> Result<SigningKey> {
    Ok(SigningKey::from_hex(&read_hex(path).await?)?)
}

async fn read_tx(path: &PathBuf) -> Result<Transaction> {
    Ok(Transaction::from_hex(&read_hex(path).await?)?)
}

async fn write_hex(out: Option<PathBuf>, hex: String) -> Result<()> {
    match out {
        Some(path) => fs::write(&path, hex)
            .await
            .with_context(|| format!("could not write {}", path.display())),
        None => {
            println!("{hex}");
            Ok(())
        }
    }
}

fn service(bridge: &Arc<BridgeConfig>, chain: &str) -> Result<ChainService> {
    let node = OgmiosClient::new(bridge.chain(chain)?.node_url.clone())?;
    Ok(ChainService::new(chain, bridge.clone(), Arc::new(node))?)
}

fn collect_amounts(pairs: Vec<(String, Lovelace)>) -> Result<BTreeMap<String, Lovelace>> {
    let mut amounts = BTreeMap::new();
    for (address, amount) in pairs {
        if amounts.insert(address.clone(), amount).is_some() {
            bail!("address {address} given more than once");
        }
    }
    Ok(amounts)
}

fn print_transaction(tx: &Transaction) {
    println!("hash:     {}", tx.hash());
    println!("size:     {} bytes", tx.size());
    println!("fee:      {}", tx.body.fee);
    println!("ttl:      {}", tx.body.ttl);
    for input in &tx.body.inputs {
        println!("input:    {}#{}", input.tx_hash, input.index);
    }
    for output in &tx.body.outputs {
        println!("output:   {} {}", output.address, output.amount);
    }
    for script in &tx.witness_set.policy_scripts {
        println!(
            "policy:   {} ({} of {})",
            script.compute_hash(),
            script.required_signers(),
            script.signer_count()
        );
    }
    for witness in &tx.witness_set.vkey_witnesses {
        let valid = witness.verify(tx.hash());
        println!("witness:  {} valid={valid}", witness.key_hash());
    }
    if let Some(auxiliary_data) = &tx.auxiliary_data {
        for (label, value) in &auxiliary_data.metadata {
            println!("metadata: {label} {value:?}");
        }
    }
}

impl Command {
    pub async fn run(self, bridge: Arc<BridgeConfig>) -> Result<()> {
        match self {
            Command::Deposit {
                chain,
                destination,
                key,
                receivers,
                dry_run,
            } => {
                let key = read_key(&key).await?;
                let network = bridge.chain(&chain)?.network;
                let sender = Address::enterprise(network, &key.public_key().hash());
                let request = DepositRequest::new(
                    sender.to_bech32()?,
                    destination,
                    collect_amounts(receivers)?,
                );

                let service = service(&bridge, &chain)?;
                let tx = service.build_deposit(&request).await?;
                if dry_run {
                    let witness = service.sign(&tx, &key);
                    let signed = cardano_bridge_tx::finalize_with_witnesses(tx, [witness])?;
                    return write_hex(None, signed.to_hex()).await;
                }
                let id = service.sign_and_submit(tx, &key).await?;
                info!(tx_hash = %id, "deposit submitted");
                println!("{id}");
                Ok(())
            }

            Command::Batch {
                chain,
                payouts,
                nonce,
                out,
            } => {
                let tx = service(&bridge, &chain)?
                    .build_batch(collect_amounts(payouts)?, nonce)
                    .await?;
                write_hex(out, tx.to_hex()).await
            }

            Command::Witness { key, tx, out } => {
                let key = read_key(&key).await?;
                let tx = read_tx(&tx).await?;
                let witness = sign_transaction(&tx, &key);
                info!(tx_hash = %tx.hash(), key_hash = %witness.key_hash(), "signed");
                write_hex(out, WitnessEnvelope::new(tx, witness).to_hex()).await
            }

            Command::Submit {
                chain,
                tx,
                witnesses,
            } => {
                let tx = read_tx(&tx).await?;
                let relay = InMemoryRelay::new();
                for path in &witnesses {
                    let envelope = WitnessEnvelope::from_hex(&read_hex(path).await?)?;
                    relay.publish(&envelope).await?;
                }
                relay.close().await;

                let id = service(&bridge, &chain)?.collect_and_submit(tx, &relay).await?;
                info!(tx_hash = %id, "batch submitted");
                println!("{id}");
                Ok(())
            }

            Command::Inspect { tx } => {
                print_transaction(&read_tx(&tx).await?);
                Ok(())
            }
        }
    }
}
