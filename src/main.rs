use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use earnfinity::chain::{ChainNode, RpcClient, TokenContract};
use earnfinity::config::{Config, DEFAULT_CONFIG_PATH};
use earnfinity::core::catalog::Currency;
use earnfinity::session::RewardsPortal;
use earnfinity::util::display;

#[derive(Parser)]
#[command(name = "earnfinity", about = "Loyalty token portal backed by a local EVM node", long_about = None)]
struct Cli {
    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Wallet to act as; defaults to the node's first account
    #[arg(short, long, global = true)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List accounts managed by the node
    Accounts,
    /// Show the wallet's token balance
    Balance,
    /// Show recent ledger entries with totals
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one transaction in detail
    Detail { hash: B256 },
    /// Buy store items, e.g. `purchase T-Shirt:2 Sneakers`
    Purchase {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Burn tokens for a reward item
    Redeem { item: String },
    /// Donate tokens to a cause
    Donate { cause: String, amount: u64 },
    /// Spend tokens on a partner offer
    Partner { name: String },
    /// Quote converting tokens to another currency
    Convert {
        amount: f64,
        #[arg(default_value = "USD")]
        currency: Currency,
    },
    /// List store items, rewards, causes and partners
    Catalog,
}

fn init_tracing() -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "earnfinity.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Keep the file writer alive for the whole process
    std::mem::forget(guard);

    Ok(())
}

/// `Name:qty` or `Name`
fn parse_cart_item(raw: &str) -> Result<(&str, u32)> {
    match raw.rsplit_once(':') {
        Some((name, quantity)) => {
            let quantity = quantity
                .trim()
                .parse()
                .with_context(|| format!("Invalid quantity in {}", raw))?;
            Ok((name.trim(), quantity))
        }
        None => Ok((raw.trim(), 1)),
    }
}

async fn open_portal(config: &Config) -> Result<RewardsPortal> {
    let client = RpcClient::new(config.rpc_client_config())?;
    let node: Arc<dyn ChainNode> = Arc::new(client);

    let network_id = match config.contract.address {
        Some(_) => None,
        None => Some(node.network_id().await.context("Failed to connect to the local node")?),
    };
    let contract = TokenContract::load_artifact(
        &config.contract.artifact_path,
        config.contract.address,
        network_id.as_deref(),
    )?;

    Ok(RewardsPortal::new(node, contract, config.portal_settings()))
}

async fn connect_wallet(portal: &mut RewardsPortal, wallet: Option<String>) -> Result<()> {
    let wallet = match wallet {
        Some(wallet) => wallet,
        None => portal
            .accounts()
            .await?
            .first()
            .map(|account| account.to_string())
            .context("Node has no accounts; pass --wallet")?,
    };
    portal.connect(&wallet).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    if let Commands::Catalog = cli.command {
        display::print_catalog();
        return Ok(());
    }

    let config = if cli.config.exists() {
        Config::load_from_file(&cli.config)?
    } else {
        warn!("Config file {} not found, using defaults", cli.config.display());
        Config::default()
    };

    let mut portal = open_portal(&config).await?;
    info!("🪙 Earnfinity portal on {}", config.node.rpc_url);

    // Ctrl+C stops a confirmation wait; the submitted transaction stays submitted
    let cancel = portal.cancel_handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("🛑 Shutdown signal received");
            let _ = cancel.send(());
        }
    });

    let result = run(&mut portal, cli.command, cli.wallet).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(portal: &mut RewardsPortal, command: Commands, wallet: Option<String>) -> Result<()> {
    let rate = portal.settings().token_usd_rate;

    match command {
        Commands::Accounts => {
            display::print_accounts(&portal.accounts().await?);
        }
        Commands::Balance => {
            connect_wallet(portal, wallet).await?;
            if let Some(session) = portal.session() {
                display::print_session(session, rate);
            }
        }
        Commands::History { limit } => {
            connect_wallet(portal, wallet).await?;
            let outcome = portal.history(limit).await?;
            let summary = portal.summarize(&outcome);
            display::print_history(&outcome, &summary);
        }
        Commands::Detail { hash } => {
            let detail = portal.transaction_detail(hash).await?;
            display::print_detail(&detail);
        }
        Commands::Purchase { items } => {
            let cart = items
                .iter()
                .map(|item| parse_cart_item(item))
                .collect::<Result<Vec<_>>>()?;
            connect_wallet(portal, wallet).await?;
            let receipt = portal.purchase(&cart).await?;
            display::print_purchase(&receipt);
        }
        Commands::Redeem { item } => {
            connect_wallet(portal, wallet).await?;
            let receipt = portal.redeem_reward(&item).await?;
            display::print_action(&receipt);
        }
        Commands::Donate { cause, amount } => {
            connect_wallet(portal, wallet).await?;
            let receipt = portal.donate(&cause, amount).await?;
            display::print_action(&receipt);
        }
        Commands::Partner { name } => {
            connect_wallet(portal, wallet).await?;
            let receipt = portal.redeem_partner(&name).await?;
            display::print_action(&receipt);
        }
        Commands::Convert { amount, currency } => {
            connect_wallet(portal, wallet).await?;
            let quote = portal.quote_conversion(amount, currency)?;
            display::print_quote(&quote);
        }
        Commands::Catalog => display::print_catalog(),
    }

    portal.disconnect();
    Ok(())
}
