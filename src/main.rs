//! Payment Operations Monitor - Main Entry Point
//!
//! Pulls simulated transactions, runs the detect → reason → decide → learn
//! cycle on each one, renders the result and prints an incident summary on
//! shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use payment_ops_monitor::{
    config::{AppConfig, OracleProvider, DEFAULT_CONFIG_PATH},
    metrics::MonitorMetrics,
    monitor::{oracle_from_config, Session},
    publisher::DecisionPublisher,
    render::render_cycle,
    simulator::{pace_interval, PaymentSimulator, TransactionFeed},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "payment-ops-monitor", about = "Simulated payment operations monitor")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Seed for the transaction simulator
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured oracle provider
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ProviderArg {
    Ollama,
    Heuristic,
}

impl From<ProviderArg> for OracleProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Ollama => OracleProvider::Ollama,
            ProviderArg::Heuristic => OracleProvider::Heuristic,
        }
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(
        format!("payment_ops_monitor={}", config.logging.level)
            .parse()
            .context("Invalid logging.level")?,
    );

    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from_path(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.feed.seed = Some(seed);
    }
    if let Some(provider) = cli.provider {
        config.oracle.provider = provider.into();
    }

    init_logging(&config)?;
    info!("Starting Payment Operations Monitor");
    info!(
        "Window: {} tx, failure threshold: {:.0}%, latency threshold: {}ms, confidence threshold: {:.2}",
        config.window.capacity,
        config.detection.failure_rate_threshold * 100.0,
        config.detection.latency_threshold_ms,
        config.decision.confidence_threshold
    );

    let metrics = Arc::new(MonitorMetrics::new());
    let oracle = oracle_from_config(&config.oracle);
    info!(
        provider = oracle.name(),
        model = %config.oracle.model,
        timeout_ms = config.oracle.timeout_ms,
        "Root-cause oracle configured"
    );
    let mut session = Session::new(&config, oracle).with_metrics(metrics.clone());

    let mut feed = match config.feed.seed {
        Some(seed) => PaymentSimulator::with_seed(seed),
        None => PaymentSimulator::new(),
    };

    let publisher = if config.nats.enabled {
        match DecisionPublisher::connect(&config.nats.url, &config.nats.decision_subject).await {
            Ok(publisher) => {
                info!(url = %config.nats.url, subject = %publisher.subject(), "Connected to NATS");
                Some(publisher)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to NATS. Decisions will not be published.");
                None
            }
        }
    } else {
        None
    };

    let mut interval = pace_interval(Duration::from_millis(config.feed.pace_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupt received");
                break;
            }
            _ = interval.tick() => {
                let transaction = feed.next_transaction();
                let report = session.run_cycle(transaction).await;
                print!("{}", render_cycle(&report));

                if let Some(publisher) = &publisher {
                    if let Err(e) = publisher.publish(&report).await {
                        error!(cycle = report.cycle, error = %e, "Failed to publish decision");
                    }
                }

                if report.cycle % 100 == 0 {
                    info!(cycles = report.cycle, active = session.interventions().len(), "Processing milestone");
                }
                if cli.cycles.is_some_and(|limit| report.cycle >= limit) {
                    info!(cycles = report.cycle, "Cycle limit reached");
                    break;
                }
            }
        }
    }

    println!("\n{}", session.summary());
    metrics.print_summary();

    Ok(())
}
