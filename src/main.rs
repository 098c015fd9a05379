//! Command-line client for a BaaS gateway.
//!
//! ```text
//! baas-cli --config sdk.toml call getBalance '["0x..."]'
//! baas-cli --config sdk.toml fee 1500000000000000000
//! ```
//!
//! Local accounts come from the private-key environment variable named in the
//! `[keystore]` section.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use baas_sdk::api::{dispatch, ApiReply};
use baas_sdk::config::{load_config, SdkConfig};
use baas_sdk::observability::logging::init_logging;
use baas_sdk::rpc::types::parse_quantity;
use baas_sdk::{LegacyTxCodec, LocalKeystore, Sdk};

#[derive(Parser)]
#[command(name = "baas-cli")]
#[command(about = "Call a BaaS blockchain gateway through the SDK", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke an SDK method and print the reply
    Call {
        /// Method name, e.g. getBalance
        method: String,
        /// JSON array of positional params
        #[arg(default_value = "[]")]
        params: String,
    },
    /// Compute the service fee for an amount in wei
    Fee {
        /// Amount in wei, decimal or 0x-hex
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SdkConfig::default(),
    };
    init_logging(&config.observability);

    let keystore = LocalKeystore::from_env(&config.keystore)?;
    let sdk = Sdk::new(config, Arc::new(keystore), Arc::new(LegacyTxCodec)).await?;

    match cli.command {
        Commands::Call { method, params } => {
            let params: Value = serde_json::from_str(&params)?;
            let reply = ApiReply::from_result(dispatch(&sdk, &method, params).await);
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Fee { amount } => {
            let amount = parse_quantity(&amount).ok_or_else(|| format!("invalid amount '{}'", amount))?;
            let schedule = sdk.client().get_fee().await?;
            sdk.fees().set_schedule(schedule);
            println!("{}", sdk.service_fee(amount));
        }
    }

    sdk.shutdown();
    Ok(())
}
