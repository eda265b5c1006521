//! evm-wallet - create keys, sign and send legacy transfers from the shell

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use evm_wallet_engine::encoding::{format_ether, parse_address, parse_ether};
use evm_wallet_engine::{
    metrics, sign_message, GasSetting, MessageSignature, RpcProvider, Settings,
    TransactionSender, Wallet,
};

#[derive(Parser)]
#[command(name = "evm-wallet")]
#[command(about = "Key management and transaction signing for EVM chains", long_about = None)]
struct Cli {
    /// Configuration file (overrides EVM_WALLET_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet with a 12-word mnemonic
    New,
    /// Restore a wallet from its mnemonic
    Restore {
        #[arg(long, env = "EVM_WALLET_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
    },
    /// Show the address of a private key
    Import {
        #[arg(long, env = "EVM_WALLET_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Query the balance of an address
    Balance { address: String },
    /// Sign a transfer and broadcast it
    Send {
        #[arg(long, env = "EVM_WALLET_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        #[arg(long)]
        to: String,
        /// Amount in ether
        #[arg(long)]
        value: String,
        /// Gas price in wei as hex, or "auto"
        #[arg(long, default_value = "auto")]
        gas_price: String,
        /// Gas limit as hex, or "auto"
        #[arg(long, default_value = "auto")]
        gas_limit: String,
        /// Print the signed payload without broadcasting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Broadcast a previously signed payload
    Broadcast { signed: String },
    /// Sign a message with a private key
    SignMessage {
        #[arg(long, env = "EVM_WALLET_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        message: String,
    },
    /// Recover the signer of a message signature
    RecoverMessage { signature: String, message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.json_logs);

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    run(cli.command, &settings).await?;

    if settings.metrics.enabled {
        eprintln!("{}", metrics::render());
    }
    Ok(())
}

async fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::New => {
            let wallet = Wallet::generate()?;
            print_wallet(&wallet)?;
        }
        Commands::Restore { mnemonic } => {
            let wallet = Wallet::from_mnemonic(&mnemonic)?;
            print_wallet(&wallet)?;
        }
        Commands::Import { private_key } => {
            let wallet = Wallet::from_private_key(&private_key)?;
            print_wallet(&wallet)?;
        }
        Commands::Balance { address } => {
            let address = parse_address(&address)?;
            let sender = connect(settings)?;
            let balance = sender.balance(address).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "address": address.to_checksum(None),
                    "wei": balance.to_string(),
                    "ether": format_ether(balance),
                }))?
            );
        }
        Commands::Send {
            private_key,
            to,
            value,
            gas_price,
            gas_limit,
            dry_run,
        } => {
            let wallet = Wallet::from_private_key(&private_key)?;
            let to = parse_address(&to)?;
            let value = parse_ether(&value)?;
            let gas_price = GasSetting::parse(&gas_price)?;
            let gas_limit = GasSetting::parse(&gas_limit)?;
            let sender = connect(settings)?;

            if dry_run {
                let signed = sender
                    .build_and_sign_transfer(&wallet, to, value, gas_price, gas_limit, sender.chain_id())
                    .await?;
                println!("{}", signed.to_hex());
            } else {
                let hash = sender
                    .send_transfer(&wallet, to, value, gas_price, gas_limit)
                    .await?;
                println!("{}", hash);
            }
        }
        Commands::Broadcast { signed } => {
            let sender = connect(settings)?;
            let hash = sender.broadcast(&signed).await?;
            println!("{}", hash);
        }
        Commands::SignMessage {
            private_key,
            message,
        } => {
            let wallet = Wallet::from_private_key(&private_key)?;
            let signature = sign_message(&wallet, message.as_bytes())?;
            println!("{}", signature.to_hex());
        }
        Commands::RecoverMessage { signature, message } => {
            let signature = MessageSignature::from_hex(&signature)?;
            let signer = signature.recover(message.as_bytes())?;
            println!("{}", signer.to_checksum(None));
        }
    }
    Ok(())
}

fn connect(settings: &Settings) -> Result<TransactionSender> {
    let provider = RpcProvider::new(&settings.network)
        .with_context(|| format!("Failed to connect to {}", settings.network.name))?;
    info!(
        "Using {} (chain {})",
        settings.network.name, settings.network.chain_id
    );
    Ok(TransactionSender::new(
        Arc::new(provider),
        settings.network.chain_id,
        &settings.gas,
    ))
}

fn print_wallet(wallet: &Wallet) -> Result<()> {
    let mut summary = json!({
        "address": wallet.address().to_checksum(None),
        "public_key": wallet.public_key_hex(),
    });
    if let Some(mnemonic) = wallet.mnemonic() {
        summary["mnemonic"] = json!(mnemonic);
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_logging(json_logs: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,evm_wallet_engine=debug"));

    let (plain, json) = if json_logs {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(fmt::layer().with_target(true).with_writer(std::io::stderr)),
            None,
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}
