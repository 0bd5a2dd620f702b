//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the Raydium sniper.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::adapters::jupiter::{JupiterClient, JupiterConfig};
use crate::adapters::ledger::FileLedger;
use crate::adapters::market_data::{HeliusClient, JupiterPriceClient, RugCheckClient};
use crate::adapters::solana::{SolanaClient, SolanaSubmitter, WalletManager};
use crate::application::{
    BuyOutcome, BuyReport, PipelinePorts, SellResult, TradePipeline, TradeRunner,
};
use crate::config::{load_config, Config, Endpoints, WalletSource};
use crate::domain::{MintPair, SwapAmount};
use crate::ports::HoldingsLedger;

/// Raydium sniper - buys newly created Raydium pools after a token-safety check
#[derive(Parser, Debug)]
#[command(
    name = "raydium-sniper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Buys tokens from freshly created Raydium pools on Solana",
    long_about = "Resolves the mints of a new Raydium pool from its creation transaction, \
                  runs the configured risk rules against a token-safety report and, when \
                  approved, swaps SOL for the token through Jupiter."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Buy from one or more pool-creation transactions
    Buy(BuyCmd),

    /// Sell a held token back to SOL
    Sell(SellCmd),

    /// Run the risk rules against a token without trading
    Check(CheckCmd),

    /// List open holdings
    Holdings(HoldingsCmd),
}

/// Buy new pools
#[derive(Parser, Debug)]
pub struct BuyCmd {
    /// Pool-creation transaction signatures
    #[arg(value_name = "SIGNATURE", required = true)]
    pub signatures: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sniper.toml")]
    pub config: PathBuf,
}

/// Sell a holding
#[derive(Parser, Debug)]
pub struct SellCmd {
    /// Token mint to sell
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// Amount in base units; must match the wallet balance
    #[arg(value_name = "AMOUNT")]
    pub amount: SwapAmount,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sniper.toml")]
    pub config: PathBuf,
}

/// Evaluate a token
#[derive(Parser, Debug)]
pub struct CheckCmd {
    /// Token mint to evaluate
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sniper.toml")]
    pub config: PathBuf,
}

/// List holdings
#[derive(Parser, Debug)]
pub struct HoldingsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/sniper.toml")]
    pub config: PathBuf,
}

/// Execute the parsed command
pub async fn execute(app: CliApp) -> Result<()> {
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Buy(cmd) => buy_command(cmd).await,
        Command::Sell(cmd) => sell_command(cmd).await,
        Command::Check(cmd) => check_command(cmd).await,
        Command::Holdings(cmd) => holdings_command(cmd).await,
    }
}

/// Initialize logging based on verbosity flags
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

/// Handle buy command
async fn buy_command(cmd: BuyCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let pipeline = Arc::new(build_pipeline(&config)?);

    if config.rug_check.simulation_mode {
        tracing::warn!("Simulation mode is on - approved tokens will not be bought");
    }

    let cancel = shutdown_token();
    let runner = TradeRunner::new(pipeline, config.tx.concurrent_transactions, cancel);
    let reports = runner.run_buys(cmd.signatures).await;

    let mut failures = 0;
    for report in &reports {
        print_report(report);
        if report.result.is_err() {
            failures += 1;
        }
    }

    println!();
    println!("{} pool(s) processed, {} failed", reports.len(), failures);
    Ok(())
}

/// Handle sell command
async fn sell_command(cmd: SellCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let pipeline = build_pipeline(&config)?;
    let pair = MintPair::new(cmd.mint, config.liquidity_pool.quote_mint.clone());

    let cancel = shutdown_token();
    let result = match pipeline.sell(&pair, &cmd.amount, &cancel).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Sell of {} failed: {}", pair.token_mint, e);
            SellResult::from(&e)
        }
    };

    println!("Sell {}", pair.token_mint);
    println!("  Success:     {}", result.success);
    if let Some(message) = &result.message {
        println!("  Message:     {}", message);
    }
    if let Some(signature) = &result.transaction_id {
        println!("  Transaction: {}", signature);
    }

    if !result.success {
        bail!("Sell of {} did not complete", pair.token_mint);
    }
    Ok(())
}

/// Handle check command
async fn check_command(cmd: CheckCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let pipeline = build_pipeline(&config)?;

    let decision = pipeline.check(&cmd.mint).await?;

    println!("Token: {}", cmd.mint);
    if decision.approved {
        println!("  Decision: APPROVED");
    } else {
        println!("  Decision: REJECTED");
        println!("  Reason:   {}", decision.reason.as_deref().unwrap_or("unspecified"));
    }
    Ok(())
}

/// Handle holdings command
async fn holdings_command(cmd: HoldingsCmd) -> Result<()> {
    let config = load(&cmd.config)?;
    let ledger = open_ledger(&config)?;
    let holdings = ledger.list_holdings().await?;

    if holdings.is_empty() {
        println!("No open holdings");
        return Ok(());
    }

    println!("{:<46} {:<16} {:>18} {:>14} {:>14}", "MINT", "NAME", "BALANCE", "SOL PAID", "COST (REF)");
    for holding in &holdings {
        println!(
            "{:<46} {:<16} {:>18.6} {:>14.9} {:>14.4}",
            holding.mint,
            holding.token_name,
            holding.balance,
            holding.sol_paid,
            holding.cost_basis_reference()
        );
    }
    Ok(())
}

fn load(path: &Path) -> Result<Config> {
    tracing::info!("Config: {}", path.display());
    load_config(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn open_ledger(config: &Config) -> Result<FileLedger> {
    let path = shellexpand::tilde(&config.swap.holdings_path).to_string();
    FileLedger::open(&path).with_context(|| format!("Failed to open holdings file {}", path))
}

/// Wire the HTTP adapters, wallet and ledger into a pipeline
fn build_pipeline(config: &Config) -> Result<TradePipeline> {
    let endpoints = Endpoints::from_env().context("Invalid environment")?;
    let timeout = config.http_timeout();
    let settings = config.pipeline_settings();

    let wallet = Arc::new(load_wallet(&endpoints.wallet)?);
    tracing::info!("Wallet: {}", wallet.public_key());

    let jupiter = Arc::new(JupiterClient::with_config(JupiterConfig {
        quote_url: endpoints.quote_url.clone(),
        swap_url: endpoints.swap_url.clone(),
        timeout,
        verbose_log: config.swap.verbose_log,
        ..JupiterConfig::default()
    })?);

    let chain = SolanaSubmitter::new(
        SolanaClient::new(endpoints.rpc_url.clone()),
        SolanaClient::new(endpoints.submit_rpc_url.clone()),
        wallet,
    );

    let ports = PipelinePorts {
        details: Arc::new(HeliusClient::new(endpoints.transactions_url.clone(), timeout)?),
        reports: Arc::new(RugCheckClient::new(endpoints.rugcheck_url.clone(), timeout)?),
        prices: Arc::new(JupiterPriceClient::new(endpoints.price_url.clone(), timeout)?),
        quotes: jupiter.clone(),
        swaps: jupiter,
        chain: Arc::new(chain),
        ledger: Arc::new(open_ledger(config)?),
    };

    Ok(TradePipeline::new(ports, settings))
}

/// Load the wallet with helpful error messages
fn load_wallet(source: &WalletSource) -> Result<WalletManager> {
    match source {
        WalletSource::SecretKey(secret) => WalletManager::from_base58(secret).map_err(|e| {
            anyhow::anyhow!(
                "Failed to decode PRIV_KEY_WALLET: {}\n\n\
                 Expected the base58 secret key exported by your wallet.",
                e
            )
        }),
        WalletSource::KeypairFile(raw_path) => {
            let expanded = shellexpand::tilde(raw_path).to_string();
            if !Path::new(&expanded).exists() {
                bail!(
                    "Wallet file not found: {}\n\n\
                     To create a new wallet, run:\n  \
                     solana-keygen new --outfile {}\n\n\
                     Or set PRIV_KEY_WALLET in your .env",
                    expanded,
                    expanded
                );
            }
            WalletManager::from_file(&expanded).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to load wallet from '{}': {}\n\n\
                     Expected format: JSON array of bytes (e.g., [1,2,3,...])",
                    expanded,
                    e
                )
            })
        }
    }
}

/// Cancel on Ctrl-C so retries and confirmation waits stop promptly
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::warn!("Shutdown requested, cancelling in-flight trades...");
        trigger.cancel();
    });
    cancel
}

fn print_report(report: &BuyReport) {
    let path: Vec<String> = report.states.iter().map(|s| format!("{:?}", s)).collect();
    println!("Pool {}", report.pool_signature);
    println!("  States: {}", path.join(" -> "));

    match &report.result {
        Ok(BuyOutcome::Rejected { mint, reason }) => {
            println!("  Rejected {}: {}", mint, reason);
        }
        Ok(BuyOutcome::Simulated { pair }) => {
            println!("  Approved {} (simulation, no swap sent)", pair.token_mint);
        }
        Ok(BuyOutcome::Bought { pair, signature, holding }) => {
            println!("  Bought {} ({})", holding.token_name, pair.token_mint);
            println!("  Transaction: {}", signature);
            println!("  Balance: {:.6}, cost: {:.4}", holding.balance, holding.cost_basis_reference());
        }
        Err(e) => {
            println!("  Failed: {}", e);
        }
    }
}
