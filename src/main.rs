//! tronfee command line
//!
//! ```text
//! tronfee plan --from <addr> --to <addr> --amount 12.5 [--token USDT] [--dry-run] [--yes]
//! tronfee estimate --from <addr> --to <addr> --amount 12.5 [--token USDT]
//! ```
//!
//! Rental confirmation is read from stdin unless `--yes` is given. Ctrl-C
//! while waiting for rented energy stops the wait; the order stays placed.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tronfee::config::Config;
use tronfee::estimator::{EstimateRequest, FeeEstimator};
use tronfee::planner::{PlanOptions, TransferPlanner, TransferRequest};
use tronfee::rental::{
    cancel_pair, AutoApprove, EnergyRentalCoordinator, ItrxClient, RentalApproval, RentalQuote,
};
use tronfee::tron::abi::validate_address;
use tronfee::tron::{Trc20Method, TronGridClient, TronscanClient};
use tronfee::types::{format_units, parse_units, Address, NetworkId, Token, TRX_DECIMALS};
use tronfee::{metrics, ChainResourceProvider, ProviderRegistry};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print prometheus metrics after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check balances, history and fees, rent energy if needed
    Plan {
        #[command(flatten)]
        transfer: TransferArgs,

        /// Run every check but never place a rental order
        #[arg(long)]
        dry_run: bool,

        /// Accept the rental quote without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Estimate energy, bandwidth and fees only
    Estimate {
        #[command(flatten)]
        transfer: TransferArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct TransferArgs {
    /// Sender address
    #[arg(long)]
    from: String,

    /// Recipient address
    #[arg(long)]
    to: String,

    /// Amount in token units, e.g. 12.5
    #[arg(long)]
    amount: String,

    /// Token symbol
    #[arg(long, default_value = "USDT")]
    token: String,
}

impl TransferArgs {
    fn request(&self) -> Result<TransferRequest> {
        let token = Token::lookup(NetworkId::Tron, &self.token)
            .with_context(|| format!("Unknown TRON token: {}", self.token))?;
        let sender = Address::new(self.from.as_str());
        let recipient = Address::new(self.to.as_str());
        validate_address(&sender).context("Invalid sender address")?;
        validate_address(&recipient).context("Invalid recipient address")?;
        let amount = parse_units(&self.amount, token.decimals)
            .map_err(anyhow::Error::msg)
            .context("Invalid amount")?;
        if amount == 0 {
            bail!("Amount must be greater than zero");
        }

        Ok(TransferRequest {
            sender,
            recipient,
            token,
            amount,
        })
    }
}

/// Asks on the terminal before an order is placed
struct StdinApproval;

#[async_trait]
impl RentalApproval for StdinApproval {
    async fn approve(&self, quote: &RentalQuote) -> bool {
        let prompt = format!(
            "Rent {} energy for {} TRX ({})? [Y/n] ",
            quote.energy,
            format_units(quote.price, TRX_DECIMALS),
            quote.period
        );
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut answer = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut answer).await {
            Ok(0) | Err(_) => false,
            Ok(_) => !matches!(answer.trim().to_lowercase().as_str(), "n" | "no"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    init_logging(args.verbose, config.logging.json)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting tronfee");

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(
        TronGridClient::new(&config.tron).context("Failed to create TronGrid client")?,
    ));
    let provider = registry.get(NetworkId::Tron)?;

    let go = match &args.command {
        Command::Plan {
            transfer,
            dry_run,
            yes,
        } => run_plan(&config, provider, transfer.request()?, *dry_run, *yes, args.json).await?,
        Command::Estimate { transfer } => {
            run_estimate(&config, provider, transfer.request()?, args.json).await?;
            true
        }
    };

    if args.metrics {
        println!("{}", metrics::render()?);
    }
    if !go {
        std::process::exit(2);
    }
    Ok(())
}

async fn run_plan(
    config: &Config,
    provider: Arc<dyn ChainResourceProvider>,
    request: TransferRequest,
    dry_run: bool,
    yes: bool,
    json: bool,
) -> Result<bool> {
    let history = Arc::new(TronscanClient::new(&config.tronscan).context("Failed to create Tronscan client")?);
    let market = Arc::new(ItrxClient::new(&config.rental).context("Failed to create ITRX client")?);
    let estimator = FeeEstimator::new(Arc::clone(&provider), &config.fees);
    let coordinator = EnergyRentalCoordinator::new(Arc::clone(&provider), market, &config.rental);
    let planner = TransferPlanner::new(provider, history, estimator, coordinator, config.planner.clone());

    let options = if dry_run {
        PlanOptions::dry_run()
    } else {
        let (cancel, signal) = cancel_pair();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning energy wait");
                cancel.cancel();
            }
        });
        let approval: Arc<dyn RentalApproval> = if yes {
            Arc::new(AutoApprove)
        } else {
            Arc::new(StdinApproval)
        };
        PlanOptions::live(approval, signal)
    };

    let plan = planner.plan(&request, options).await.context("Planning failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{plan}");
    }

    Ok(plan.outcome.abort_reason().is_none())
}

async fn run_estimate(
    config: &Config,
    provider: Arc<dyn ChainResourceProvider>,
    request: TransferRequest,
    json: bool,
) -> Result<()> {
    let estimator = FeeEstimator::new(provider, &config.fees);
    let estimate = estimator
        .estimate(&EstimateRequest {
            owner: request.sender,
            contract: request.token.address,
            method: Trc20Method::Transfer,
            recipient: request.recipient,
            amount: request.amount,
        })
        .await
        .context("Estimation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        println!("Energy required: {}. Available: {}", estimate.energy_required, estimate.energy_available);
        println!("Energy lack: {}", estimate.energy_lack);
        println!(
            "Bandwidth required: {}. Available: {}",
            estimate.bandwidth_required, estimate.bandwidth_available
        );
        println!("Energy fee: {} TRX", format_units(estimate.energy_fee, TRX_DECIMALS));
        println!("Bandwidth fee: {} TRX", format_units(estimate.bandwidth_fee, TRX_DECIMALS));
        println!("Total fee: {} TRX", format_units(estimate.total_fee, TRX_DECIMALS));
    }
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "tronfee=debug,info"
    } else {
        "tronfee=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.context("Failed to initialize logging")
}
