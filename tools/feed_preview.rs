//! Simulated Feed Preview
//!
//! Prints the transactions the monitor's simulator would produce, with a
//! per-counterparty failure breakdown, so scenario windows can be checked
//! without running the monitor.

use payment_ops_monitor::simulator::{PaymentSimulator, TransactionFeed};
use payment_ops_monitor::types::Transaction;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("feed_preview=info".parse()?),
        )
        .init();

    info!("Starting Simulated Feed Preview");

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let delay_ms: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
    let seed: Option<u64> = args.get(3).and_then(|s| s.parse().ok());

    info!(count = count, delay_ms = delay_ms, seed = ?seed, "Configuration loaded");

    let mut feed = match seed {
        Some(seed) => PaymentSimulator::with_seed(seed),
        None => PaymentSimulator::new(),
    };
    let mut tally = FailureTally::default();

    for i in 0..count {
        let transaction = feed.next_transaction();
        tally.observe(&transaction);

        if (i + 1) % 10 == 0 || i == 0 || transaction.is_failed() {
            let json = serde_json::to_string_pretty(&transaction)?;
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    info!("Completed! Generated {} transactions", count);
    tally.log();
    Ok(())
}

/// Per-counterparty (total, failed) counts
#[derive(Default)]
struct FailureTally(BTreeMap<String, (u64, u64)>);

impl FailureTally {
    fn observe(&mut self, transaction: &Transaction) {
        let entry = self.0.entry(transaction.counterparty.clone()).or_default();
        entry.0 += 1;
        if transaction.is_failed() {
            entry.1 += 1;
        }
    }

    fn log(&self) {
        for (counterparty, (total, failed)) in &self.0 {
            info!(counterparty = %counterparty, total, failed, "Feed breakdown");
        }
    }
}
