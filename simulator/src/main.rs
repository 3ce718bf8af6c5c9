//! DepositLedger Simulator
//!
//! Drives an in-memory deposit ledger through scripted scenarios or a
//! random multi-user workload.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use depositledger_common::{to_datetime, Address};
use depositledger_ledger::LedgerConfig;

mod controller;
mod metrics;
mod scenario;
mod users;

use controller::{display_amount, SimulationController};
use scenario::Scenario;

/// DepositLedger Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "DepositLedger test and simulation environment")]
struct Args {
    /// Number of simulated users to create
    #[arg(short, long, default_value = "3")]
    users: usize,

    /// Built-in scenario name or path to a JSON scenario
    #[arg(short, long)]
    scenario: Option<String>,

    /// Operations per second per user in continuous mode
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Run duration in seconds (0 = infinite)
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Override the annual interest rate in basis points
    #[arg(long)]
    rate_bps: Option<u32>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the balance store as JSON when done
    #[arg(long)]
    dump_state: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = LedgerConfig::from_env()?;
    if let Some(bps) = args.rate_bps {
        config.annual_rate_bps = bps;
    }
    if config.token_address.is_zero() {
        config.token_address = Address::derive("MockToken");
    }
    config.validate()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting DepositLedger Simulator");
    info!("Users: {}", args.users);
    info!("Token: {}", config.token_address);
    info!("Rate: {}", config.interest_rate()?);

    let mut controller = SimulationController::new(&config, args.users, args.speed, args.seed)?;
    controller.initialize()?;

    info!("Simulator initialized with {} users", args.users);

    if let Some(scenario_name) = &args.scenario {
        let scenario = Scenario::load(scenario_name)?;
        controller.run_scenario(&scenario)?;
    } else {
        info!("Press Ctrl+C to stop");

        let duration = if args.duration > 0 {
            Some(std::time::Duration::from_secs(args.duration))
        } else {
            None
        };

        controller.run(duration).await?;
    }

    let metrics = controller.get_metrics();
    info!("Simulation complete");
    info!("Total operations: {}", metrics.total_operations);
    info!("Successful: {}", metrics.successful_operations);
    info!("Rejected: {}", metrics.rejected_operations);
    info!("Success rate: {:.1}%", metrics.success_rate() * 100.0);
    let ledger_time = controller.ledger_time();
    match to_datetime(ledger_time) {
        Some(at) => info!("Ledger time: {} ({})", at.to_rfc3339(), ledger_time),
        None => info!("Ledger time: {}", ledger_time),
    }
    for (code, count) in metrics.rejections() {
        info!(code, count, "Rejections");
    }

    for report in controller.report()? {
        let asset = report.solvency.asset;
        info!(
            asset = %asset,
            deposited = %display_amount(metrics.deposited(asset), asset),
            withdrawn = %display_amount(metrics.withdrawn(asset), asset),
            custody = %display_amount(report.solvency.custody, asset),
            liabilities = %display_amount(report.solvency.liabilities, asset),
            interest_folded = %display_amount(report.interest_folded, asset),
            net_inflow = report.net_inflow,
            solvent = report.solvency.is_solvent(),
            "Asset summary"
        );
    }

    if args.dump_state {
        println!("{}", controller.dump_state()?);
    }

    Ok(())
}
