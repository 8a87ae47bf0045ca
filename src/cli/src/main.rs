//! Operator CLI for the native/execution bridge.

use anyhow::Result;
use bridge::MappingStrategy;
use cli::commands::{balance, fund, output, send, signature, summary};
use cli::config::BridgeConfig;
use cli::console;
use colored::Colorize;
use primitives::format_amount;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line arguments for the bridge CLI.
#[derive(Debug, StructOpt)]
#[structopt(name = "revive-bridge", about = "Bridge native funds into the execution layer")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// WebSocket endpoint of the native node
    #[structopt(long)]
    native: Option<String>,

    /// JSON-RPC endpoint of the execution layer
    #[structopt(long)]
    evm: Option<String>,

    /// Token-view contract address
    #[structopt(long)]
    token_view: Option<String>,

    /// Secret URI of the signing account
    #[structopt(long)]
    signer: Option<String>,

    /// Give up waiting for finality after this many seconds
    #[structopt(long)]
    timeout: Option<u64>,

    /// Print results as JSON
    #[structopt(long)]
    json: bool,

    /// Subcommand to run
    #[structopt(subcommand)]
    cmd: Command,
}

/// Subcommands for the bridge CLI.
#[derive(Debug, StructOpt)]
enum Command {
    /// Send the demo amount to the signer's own execution account
    #[structopt(name = "fund")]
    Fund {
        /// Mapping strategy: claim, derive or map
        #[structopt(long, default_value = "claim")]
        strategy: MappingStrategy,

        /// Amount to send, overriding the configured demo amount
        #[structopt(long)]
        amount: Option<String>,
    },

    /// Send funds to an execution address
    #[structopt(name = "send")]
    Send {
        /// Target execution address (0x-prefixed, 20 bytes)
        #[structopt(long)]
        to: String,

        /// Decimal amount to send
        #[structopt(long)]
        amount: String,

        /// Mapping strategy: claim, derive or map
        #[structopt(long, default_value = "claim")]
        strategy: MappingStrategy,
    },

    /// Map the signer and show its balances on both ledgers
    #[structopt(name = "summary")]
    Summary {
        /// Mapping strategy: claim, derive or map
        #[structopt(long, default_value = "claim")]
        strategy: MappingStrategy,
    },

    /// Show the native balance of an address
    #[structopt(name = "balance")]
    Balance {
        /// Native address, defaults to the signer
        address: Option<String>,
    },

    /// Show the classified transfer call
    #[structopt(name = "signature")]
    Signature,

    /// Show the resolved configuration
    #[structopt(name = "config")]
    Config {
        /// Also write it to the configuration file
        #[structopt(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    dotenv::dotenv().ok();

    // Parse command line arguments
    let opt = Opt::from_args();

    // Load configuration, then environment, then flags
    let mut config = BridgeConfig::load(opt.config.as_deref())?;
    config.apply_env();
    if let Some(native) = opt.native {
        config.native_endpoint = native;
    }
    if let Some(evm) = opt.evm {
        config.execution_endpoint = evm;
    }
    if let Some(token_view) = opt.token_view {
        config.token_view_contract = Some(token_view).filter(|c| !c.is_empty());
    }
    if let Some(signer) = opt.signer {
        config.signer_uri = signer;
    }
    if opt.timeout.is_some() {
        config.finality_timeout_secs = opt.timeout;
    }
    debug!("Resolved configuration: {:?}", config);

    let json = opt.json;
    match opt.cmd {
        Command::Fund { strategy, amount } => {
            let report = fund::run(&config, strategy, amount.as_deref(), json).await?;
            output(json, &report, console::print_report)?;
        }
        Command::Send { to, amount, strategy } => {
            let report = send::run(&config, strategy, &to, &amount, json).await?;
            output(json, &report, console::print_report)?;
        }
        Command::Summary { strategy } => {
            let summary = summary::run(&config, strategy, json).await?;
            output(json, &summary, console::print_summary)?;
        }
        Command::Balance { address } => {
            let (address, info) = balance::run(&config, address.as_deref(), json).await?;
            let value = serde_json::json!({
                "address": &address,
                "free": format_amount(info.free),
                "reserved": format_amount(info.reserved),
                "nonce": info.nonce,
            });
            output(json, &value, |_| console::print_native_info(&address, &info))?;
        }
        Command::Config { save } => {
            if save {
                let path = opt.config.clone().unwrap_or_else(BridgeConfig::default_path);
                config.to_file(&path)?;
                eprintln!("Saved configuration to {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Signature => {
            let signature = signature::run(&config, json).await?;
            output(json, &signature, console::print_signature)?;
            if !signature.is_resolved() {
                eprintln!("{}", "WARNING: transfer signature could not be classified".yellow());
            }
        }
    }

    Ok(())
}
