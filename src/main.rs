use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bandtrader::cli::AgentConfig;
use bandtrader::engine::TradingAgent;
use bandtrader::gateway::{FillMode, GatewayConfig, GatewayError, PaperGateway};
use bandtrader::logging::FileRecorder;
use bandtrader::market::ScriptedSnapshots;
use bandtrader::resilience::RetryPolicy;
use bandtrader::risk::{PositionSizer, SizingMode};
use bandtrader::scheduler::Scheduler;
use bandtrader::strategy::{AlwaysConfirm, EmaBandEvaluator};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    verbose: String,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the trading agent
    Run {
        /// The symbol to trade (e.g., "BTC-USD")
        #[arg(short, long, default_value = "BTC-USD")]
        symbol: String,

        /// Fraction of cash risked per trade
        #[arg(long, default_value = "0.02")]
        risk_fraction: Decimal,

        /// Entry sizing strategy: flat-risk or risk-to-stop
        #[arg(long, default_value = "flat-risk")]
        sizing: SizingMode,

        /// Seconds between reconciliation passes
        #[arg(long, default_value_t = 10)]
        reconcile_interval: u64,

        /// Evaluate at wall-clock multiples of this many seconds
        #[arg(long, default_value_t = 60)]
        evaluate_period: u64,

        /// Append-only trade log file
        #[arg(long, default_value = "trade.log")]
        trade_log: PathBuf,

        /// Connect to a live broker instead of the simulated paper gateway
        #[arg(long, default_value_t = false)]
        live: bool,

        /// JSON file with scripted indicator snapshots (paper mode)
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Starting cash for the paper gateway
        #[arg(long, default_value = "10000")]
        paper_cash: Decimal,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.verbose)),
        )
        .init();

    match cli.command {
        Commands::Run {
            symbol,
            risk_fraction,
            sizing,
            reconcile_interval,
            evaluate_period,
            trade_log,
            live,
            snapshots,
            paper_cash,
        } => {
            let config = AgentConfig {
                symbol,
                risk_fraction,
                sizing,
                reconcile_interval_secs: reconcile_interval,
                evaluate_period_secs: evaluate_period,
                trade_log,
            };
            config.validate()?;
            run_agent(config, live, snapshots, paper_cash).await?;
        }
    }

    Ok(())
}

async fn run_agent(
    config: AgentConfig,
    live: bool,
    snapshots: Option<PathBuf>,
    paper_cash: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    if live {
        // No live broker connector is wired up yet; credentials are still
        // checked so a missing .env surfaces first.
        let _credentials = GatewayConfig::from_env()?;
        return Err(Box::new(GatewayError::Configuration(
            "No live gateway implementation is available; drop --live".to_string(),
        )));
    }

    let snapshot_path = snapshots.ok_or_else(|| {
        GatewayError::Configuration("Paper mode needs --snapshots <file>".to_string())
    })?;
    let provider = ScriptedSnapshots::from_json_file(&snapshot_path)?;

    let gateway = Arc::new(PaperGateway::new(paper_cash, FillMode::Immediate));

    let recorder = Arc::new(FileRecorder::new(config.trade_log.clone()));
    let evaluator = EmaBandEvaluator::new(Box::new(AlwaysConfirm));
    let sizer = PositionSizer::new(config.sizing, config.sizer_config());

    let mut agent = TradingAgent::new(
        config.symbol.clone(),
        gateway,
        Box::new(provider),
        recorder,
        evaluator,
        sizer,
        RetryPolicy::default(),
    );

    agent.initialize().await?;
    info!(symbol = %config.symbol, sizing = %config.sizing, "Agent initialized");

    let scheduler = Scheduler::new(config.schedule());
    scheduler.run(&mut agent).await;

    Ok(())
}
