//! Science Fund Minter CLI
//!
//! Terminal front end for the wallet session: connect, inspect, mint.

use clap::{Parser, Subcommand};
use science_fund_minter::wallet::ModalChooser;
use science_fund_minter::{
    Config, DonationForm, Error, FundingPool, Result, RpcConfig, SessionDirective,
    SessionManager, SessionView,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sf-minter")]
#[command(about = "Science Fund token minter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Wallet provider to use when none is cached
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a wallet and remember the provider
    Connect,

    /// Disconnect and forget the cached provider
    Disconnect,

    /// Reconnect a cached provider, if any, and show the session
    Status,

    /// Show the USD estimate for a donation amount
    Quote {
        /// Amount in ETH
        #[arg(short, long)]
        amount: String,
    },

    /// Mint a donation token
    Mint {
        /// Funding pool (pandemic, general)
        #[arg(long, default_value = "pandemic")]
        pool: String,

        /// Amount in ETH
        #[arg(short, long)]
        amount: String,

        /// Print the transaction instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Keep a session open and read commands from stdin
    Watch,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Connect => {
            let (manager, _directives) = build_manager(&config, cli.provider)?;
            let view = manager.connect().await?;
            print_json(&view)?;
        }
        Commands::Disconnect => {
            let (manager, _directives) = build_manager(&config, cli.provider)?;
            // Reattach first so the wallet's own disconnect hook runs
            if let Err(e) = manager.activate().await {
                tracing::warn!(error = %e, "Could not reattach cached wallet");
            }
            manager.disconnect().await;
            print_json(&manager.view())?;
        }
        Commands::Status => {
            let (manager, _directives) = build_manager(&config, cli.provider)?;
            if let Err(e) = manager.activate().await {
                tracing::warn!(error = %e, "Automatic reconnect failed");
            }
            print_json(&manager.view())?;
        }
        Commands::Quote { amount } => {
            run_quote(&config, &amount)?;
        }
        Commands::Mint {
            pool,
            amount,
            dry_run,
        } => {
            run_mint(&config, cli.provider, &pool, &amount, dry_run).await?;
        }
        Commands::Watch => {
            run_watch(&config, cli.provider).await?;
        }
        Commands::Config => {
            print_json(&config)?;
        }
    }

    Ok(())
}

fn build_manager(
    config: &Config,
    provider: Option<String>,
) -> Result<(SessionManager, mpsc::UnboundedReceiver<SessionDirective>)> {
    let contract_address = config.contract_address()?;
    let chooser = ModalChooser::new(config.modal.clone(), RpcConfig::from_env())
        .with_preferred(provider);
    Ok(SessionManager::new(Arc::new(chooser), contract_address))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_quote(config: &Config, amount: &str) -> Result<()> {
    let donation = DonationForm::new(FundingPool::default(), amount).validate(&config.donation)?;
    let usd = donation.usd_estimate(config.donation.eth_usd_rate);

    println!("{} ETH ≈ {:.2} USD", donation.amount_eth, usd);
    println!("  Minimum donation: {} ETH", config.donation.min_eth);
    Ok(())
}

async fn run_mint(
    config: &Config,
    provider: Option<String>,
    pool: &str,
    amount: &str,
    dry_run: bool,
) -> Result<()> {
    let pool: FundingPool = pool.parse()?;
    let donation = DonationForm::new(pool, amount).validate(&config.donation)?;

    let (manager, _directives) = build_manager(config, provider)?;
    if !manager.activate().await? {
        manager.connect().await?;
    }
    let contract = manager.contract().await.ok_or(Error::NotConnected)?;

    tracing::info!(
        pool = pool.label(),
        amount_eth = donation.amount_eth,
        usd_estimate = donation.usd_estimate(config.donation.eth_usd_rate),
        network = ?manager.network_name().await,
        dry_run,
        "Minting donation token"
    );

    if dry_run {
        print_json(&contract.mint_request(&donation))?;
        return Ok(());
    }

    let tx_hash = contract.mint(&donation).await?;
    println!("Mint submitted: {}", tx_hash);
    Ok(())
}

fn print_view(view: &SessionView) {
    match (&view.account, &view.network_name) {
        (Some(account), Some(network)) => println!("Connected {} on {}", account, network),
        _ => println!("Not connected"),
    }
}

/// Interactive session loop. A reload directive tears the session down and
/// starts a fresh one, which reconnects through the cached provider.
async fn run_watch(config: &Config, provider: Option<String>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let (manager, mut directives) = build_manager(config, provider.clone())?;
        if let Err(e) = manager.activate().await {
            tracing::warn!(error = %e, "Automatic reconnect failed");
        }
        print_view(&manager.view());

        let restart = loop {
            tokio::select! {
                directive = directives.recv() => match directive {
                    Some(SessionDirective::Reload { chain_id }) => {
                        tracing::info!(chain_id, "Wallet network changed, restarting session");
                        break true;
                    }
                    None => break false,
                },
                line = lines.next_line() => {
                    let Some(line) = line? else { break false };
                    match line.trim() {
                        "connect" => match manager.connect().await {
                            Ok(view) => print_view(&view),
                            Err(e) if e.is_recoverable() => println!("Connect failed: {}", e),
                            Err(e) => return Err(e),
                        },
                        "disconnect" => {
                            manager.disconnect().await;
                            print_view(&manager.view());
                        }
                        "status" => print_view(&manager.view()),
                        "quit" | "exit" => break false,
                        "" => {}
                        other => println!(
                            "Unknown command '{}'. Try connect, disconnect, status or quit",
                            other
                        ),
                    }
                }
                _ = tokio::signal::ctrl_c() => break false,
            }
        };

        if !restart {
            return Ok(());
        }
    }
}
