//! Obscura CLI - query the backend and drive a local wallet session.

use std::sync::Arc;

use anyhow::{bail, Context};
use chain_sol::{format_sol, Pubkey, RpcClient, SolanaRpc};
use clap::{Parser, Subcommand};
use obscura_api::{ObscuraClient, QuoteRequest};
use serde_json::Value;
use tracing::info;
use wallet_session::{
    init_tracing, Chain, LocalWalletTransport, LogFormat, SessionConfig, WalletSession,
};

/// Obscura CLI
#[derive(Parser, Debug)]
#[command(name = "obscura")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides OBSCURA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log output format: pretty or json (overrides OBSCURA_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backend health
    Health,
    /// Backend service information
    Info,
    /// Status of a submitted intent
    Intent { id: String },
    /// Current settlement batches
    Batches,
    /// Price quotes for a cross-chain transfer
    Quotes {
        #[arg(long)]
        source_chain: String,
        #[arg(long)]
        target_chain: String,
        #[arg(long)]
        input_asset: String,
        #[arg(long)]
        output_asset: String,
        #[arg(long)]
        amount: String,
    },
    /// Supported EVM networks, or one network by chain ID
    Networks {
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// SOL balance of an address on the configured cluster
    Balance { address: String },
    /// Connect a throwaway local wallet and sign a message with it
    Session {
        #[arg(long, default_value_t = Chain::Solana)]
        chain: Chain,
        #[arg(long, default_value = "hello from obscura")]
        message: String,
    },
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, config: SessionConfig) -> anyhow::Result<()> {
    let api_url = cli.api_url.as_deref().unwrap_or(&config.api_url);
    let api = || ObscuraClient::with_timeout(api_url, config.http_timeout);

    match cli.command {
        Command::Health => print_json(&api()?.health().await?),
        Command::Info => print_json(&api()?.info().await?),
        Command::Intent { id } => print_json(&api()?.get_intent(&id).await?),
        Command::Batches => print_json(&api()?.get_batches().await?),
        Command::Quotes {
            source_chain,
            target_chain,
            input_asset,
            output_asset,
            amount,
        } => {
            let quotes = api()?
                .get_quotes(&QuoteRequest {
                    source_chain,
                    target_chain,
                    input_asset,
                    output_asset,
                    amount,
                })
                .await?;
            print_json(&quotes)
        }
        Command::Networks { chain_id: None } => print_json(&chain_eth::supported_networks()),
        Command::Networks {
            chain_id: Some(chain_id),
        } => print_json(chain_eth::get_network(chain_id)?),
        Command::Balance { address } => {
            let pubkey: Pubkey = address.parse().context("invalid Solana address")?;
            let rpc = RpcClient::new(config.rpc_url(), config.http_timeout)?
                .with_commitment(config.commitment);
            let lamports = rpc.get_balance(&pubkey).await?;
            println!("{}", format_sol(lamports));
            Ok(())
        }
        Command::Session { chain, message } => {
            let wallet = Arc::new(LocalWalletTransport::generate());
            let session = WalletSession::from_config(&config, wallet)?;

            session.connect(chain).await?;
            info!(cluster = %session.cluster(), "session connected");
            print_json(&session.state())?;

            let Some(signature) = session.sign_message(&message).await else {
                bail!("wallet did not sign the message");
            };
            print_json(&Value::from(signature))?;

            session.disconnect().await;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SessionConfig::from_env()?;
    init_tracing(cli.log_format.unwrap_or(config.log_format))?;

    run(cli, config).await
}
