//! 'main' for the Cardano bridge command line process

mod commands;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use cardano_bridge_common::configuration::BridgeConfig;
use clap::Parser;
use config::{Config, Environment, File};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer as _, Registry, filter, fmt, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

use crate::commands::Command;

fn default_config_path() -> PathBuf {
    PathBuf::from(option_env!("BRIDGE_CLI_DEFAULT_CONFIG").unwrap_or("bridge-cli.toml"))
}

#[derive(clap::Parser)]
#[command(name = "bridge-cli", about = "Build, sign and submit Cardano bridge transactions")]
struct Args {
    /// Path to configuration.
    #[arg(long, default_value = default_config_path().into_os_string())]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    let args = Args::parse();

    // Standard logging using RUST_LOG for log levels default to INFO for events only
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env().add_directive(filter::LevelFilter::INFO.into()))
        .with_filter(filter::filter_fn(|meta| meta.is_event()));
    Registry::default().with(fmt_layer).init();

    let config = Config::builder()
        .add_source(File::from(args.config.as_path()).required(false))
        .add_source(Environment::with_prefix("BRIDGE").separator("__"))
        .build()?;
    let bridge = Arc::new(BridgeConfig::from_config(&config)?);
    info!(
        chains = ?bridge.supported_chains().collect::<Vec<_>>(),
        "loaded bridge configuration"
    );

    args.command.run(bridge).await
}
