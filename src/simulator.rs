//! Synthetic payment traffic with scripted incidents.
//!
//! Two scenarios are keyed on the running transaction count:
//! an HDFC UPI outage (transactions 16..=49) and an ICICI latency spike
//! (transactions 61..=89). Everything else is healthy background traffic.

use crate::types::transaction::{PaymentMethod, Transaction, TransactionStatus};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

pub const COUNTERPARTIES: [&str; 4] = ["HDFC", "ICICI", "SBI", "AXIS"];

/// Pull-based source of transactions
pub trait TransactionFeed {
    fn next_transaction(&mut self) -> Transaction;
}

/// Ticker that paces the feed.
///
/// A cycle that overruns the pace (a slow oracle call) delays the next tick
/// instead of replaying the missed ones back to back.
pub fn pace_interval(pace: Duration) -> Interval {
    let mut interval = tokio::time::interval(pace);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Random transaction generator with the two scripted incidents
pub struct PaymentSimulator {
    rng: StdRng,
    transaction_count: u64,
}

impl PaymentSimulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            transaction_count: 0,
        }
    }

    /// Reproducible generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            transaction_count: 0,
        }
    }

    pub fn transaction_count(&self) -> u64 {
        self.transaction_count
    }

    fn hdfc_outage_active(&self) -> bool {
        self.transaction_count > 15 && self.transaction_count < 50
    }

    fn icici_spike_active(&self) -> bool {
        self.transaction_count > 60 && self.transaction_count < 90
    }

    fn random_choice<'a, T>(&mut self, choices: &'a [T]) -> &'a T {
        &choices[self.rng.gen_range(0..choices.len())]
    }

    /// Generate the next transaction
    pub fn generate(&mut self) -> Transaction {
        self.transaction_count += 1;

        let counterparty = *self.random_choice(&COUNTERPARTIES);
        let method = *self.random_choice(&PaymentMethod::ALL);
        let amount = (self.rng.gen_range(100.0..5000.0_f64) * 100.0).round() / 100.0;

        let mut status = TransactionStatus::Success;
        let mut error_code = None;
        let mut latency_ms = self.rng.gen_range(50..=400);

        if self.hdfc_outage_active()
            && counterparty == "HDFC"
            && method == PaymentMethod::Upi
            && self.rng.gen_bool(0.8)
        {
            status = TransactionStatus::Failed;
            error_code = Some("ERR_BANK_TIMEOUT".to_string());
            latency_ms = self.rng.gen_range(2000..=5000);
        }

        if self.icici_spike_active() && counterparty == "ICICI" {
            latency_ms = self.rng.gen_range(1500..=4000);
            if self.rng.gen_bool(0.1) {
                status = TransactionStatus::Failed;
                error_code = Some("ERR_LATENCY_TIMEOUT".to_string());
            }
        }

        let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

        Transaction {
            id,
            timestamp: Utc::now(),
            counterparty: counterparty.to_string(),
            method,
            amount,
            status,
            latency_ms,
            error_code,
            retry_count: 0,
        }
    }
}

impl Default for PaymentSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionFeed for PaymentSimulator {
    fn next_transaction(&mut self) -> Transaction {
        self.generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_background_traffic() {
        let mut sim = PaymentSimulator::with_seed(7);
        for _ in 0..15 {
            let tx = sim.generate();
            assert_eq!(tx.status, TransactionStatus::Success);
            assert!((50..=400).contains(&tx.latency_ms));
            assert!((100.0..=5000.0).contains(&tx.amount));
            assert!(COUNTERPARTIES.contains(&tx.counterparty.as_str()));
            assert_eq!(tx.id.len(), 8);
        }
        assert_eq!(sim.transaction_count(), 15);
    }

    #[test]
    fn test_outage_only_hits_hdfc_upi() {
        let mut sim = PaymentSimulator::with_seed(42);
        for _ in 0..15 {
            sim.generate();
        }
        for _ in 16..50 {
            let tx = sim.generate();
            if tx.is_failed() {
                assert_eq!(tx.counterparty, "HDFC");
                assert_eq!(tx.method, PaymentMethod::Upi);
                assert_eq!(tx.error_code.as_deref(), Some("ERR_BANK_TIMEOUT"));
                assert!(tx.latency_ms >= 2000);
            }
        }
    }

    #[test]
    fn test_latency_spike_hits_icici() {
        let mut sim = PaymentSimulator::with_seed(3);
        for _ in 0..60 {
            sim.generate();
        }
        for _ in 61..90 {
            let tx = sim.generate();
            if tx.counterparty == "ICICI" {
                assert!(tx.latency_ms >= 1500);
            } else {
                assert!(tx.latency_ms <= 400);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_survives_slow_cycle() {
        let pace = Duration::from_millis(500);
        let mut interval = pace_interval(pace);
        interval.tick().await;

        // a cycle stuck on the oracle for 20 paces
        tokio::time::sleep(Duration::from_secs(10)).await;
        interval.tick().await;

        let mut last = tokio::time::Instant::now();
        for _ in 0..5 {
            interval.tick().await;
            let now = tokio::time::Instant::now();
            assert!(now - last >= pace, "tick after {:?}", now - last);
            last = now;
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = PaymentSimulator::with_seed(99);
        let mut b = PaymentSimulator::with_seed(99);
        for _ in 0..30 {
            let (x, y) = (a.generate(), b.generate());
            assert_eq!(x.counterparty, y.counterparty);
            assert_eq!(x.latency_ms, y.latency_ms);
            assert_eq!(x.status, y.status);
        }
    }
}
