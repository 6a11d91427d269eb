//! Counters and timing statistics for the monitoring loop.

use crate::types::decision::DecisionStatus;
use crate::types::signal::AnomalyKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the monitor
pub struct MonitorMetrics {
    /// Total cycles run
    pub cycles: AtomicU64,
    /// Total oracle queries sent
    pub oracle_calls: AtomicU64,
    /// Oracle queries that failed, timed out or returned a malformed reply
    pub oracle_failures: AtomicU64,
    /// Signals not sent to the oracle because an intervention is active
    pub oracle_suppressed: AtomicU64,
    /// Interventions removed by an operator or by auto-clear
    pub interventions_cleared: AtomicU64,
    /// Signals by rule
    anomalies_by_kind: RwLock<HashMap<AnomalyKind, u64>>,
    /// Decisions by outcome
    decisions_by_status: RwLock<HashMap<DecisionStatus, u64>>,
    /// Oracle round-trip times (in milliseconds)
    oracle_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            oracle_calls: AtomicU64::new(0),
            oracle_failures: AtomicU64::new(0),
            oracle_suppressed: AtomicU64::new(0),
            interventions_cleared: AtomicU64::new(0),
            anomalies_by_kind: RwLock::new(HashMap::new()),
            decisions_by_status: RwLock::new(HashMap::new()),
            oracle_times: RwLock::new(Vec::with_capacity(256)),
            start_time: Instant::now(),
        }
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anomaly(&self, kind: AnomalyKind) {
        if let Ok(mut by_kind) = self.anomalies_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    /// Record an oracle round trip and whether it produced a hypothesis
    pub fn record_oracle_call(&self, elapsed: Duration, succeeded: bool) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.oracle_failures.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.oracle_times.write() {
            times.push(elapsed.as_millis() as u64);
            // Keep only the last 1000 samples
            if times.len() > 1000 {
                times.drain(0..500);
            }
        }
    }

    pub fn record_oracle_suppressed(&self) {
        self.oracle_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, status: DecisionStatus) {
        if let Ok(mut by_status) = self.decisions_by_status.write() {
            *by_status.entry(status).or_insert(0) += 1;
        }
    }

    pub fn record_cleared(&self) {
        self.interventions_cleared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anomalies(&self, kind: AnomalyKind) -> u64 {
        self.anomalies_by_kind
            .read()
            .map(|by_kind| by_kind.get(&kind).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn decisions(&self, status: DecisionStatus) -> u64 {
        self.decisions_by_status
            .read()
            .map(|by_status| by_status.get(&status).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Oracle round-trip statistics
    pub fn get_oracle_stats(&self) -> OracleStats {
        let Ok(times) = self.oracle_times.read() else {
            return OracleStats::default();
        };
        if times.is_empty() {
            return OracleStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        OracleStats {
            count: count as u64,
            mean_ms: sum / count as u64,
            p50_ms: sorted[count / 2],
            p95_ms: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_ms: sorted[count - 1],
        }
    }

    /// Cycles per second since start
    pub fn get_cycle_rate(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.cycles.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        let cycles = self.cycles.load(Ordering::Relaxed);
        let calls = self.oracle_calls.load(Ordering::Relaxed);
        let failures = self.oracle_failures.load(Ordering::Relaxed);
        let suppressed = self.oracle_suppressed.load(Ordering::Relaxed);
        let cleared = self.interventions_cleared.load(Ordering::Relaxed);
        let oracle = self.get_oracle_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║           PAYMENT OPS MONITOR - METRICS SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Cycles: {:>8}  │  Rate: {:>6.2} cycles/s                    ║",
            cycles,
            self.get_cycle_rate()
        );
        info!(
            "║ Anomalies: failure={:>6} latency={:>6}                      ║",
            self.anomalies(AnomalyKind::HighFailureRate),
            self.anomalies(AnomalyKind::HighLatency)
        );
        info!(
            "║ Oracle: calls={:>5} failures={:>5} suppressed={:>5}           ║",
            calls, failures, suppressed
        );
        info!(
            "║ Oracle time (ms): mean={:>6} p50={:>6} p95={:>6} max={:>6}  ║",
            oracle.mean_ms, oracle.p50_ms, oracle.p95_ms, oracle.max_ms
        );
        info!(
            "║ Decisions: executed={:>4} recommended={:>4} skipped={:>4}        ║",
            self.decisions(DecisionStatus::Executed),
            self.decisions(DecisionStatus::Recommended),
            self.decisions(DecisionStatus::Skipped)
        );
        info!("║ Interventions cleared: {:>6}                                ║", cleared);
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Oracle round-trip statistics
#[derive(Debug, Default, PartialEq)]
pub struct OracleStats {
    pub count: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = MonitorMetrics::new();

        metrics.record_cycle();
        metrics.record_cycle();
        metrics.record_anomaly(AnomalyKind::HighFailureRate);
        metrics.record_oracle_call(Duration::from_millis(120), true);
        metrics.record_oracle_call(Duration::from_millis(300), false);
        metrics.record_decision(DecisionStatus::Executed);

        assert_eq!(metrics.cycles.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.anomalies(AnomalyKind::HighFailureRate), 1);
        assert_eq!(metrics.anomalies(AnomalyKind::HighLatency), 0);
        assert_eq!(metrics.oracle_calls.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.oracle_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.decisions(DecisionStatus::Executed), 1);
    }

    #[test]
    fn test_oracle_stats() {
        let metrics = MonitorMetrics::new();
        assert_eq!(metrics.get_oracle_stats(), OracleStats::default());

        for ms in [100, 200, 300, 400] {
            metrics.record_oracle_call(Duration::from_millis(ms), true);
        }
        let stats = metrics.get_oracle_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_ms, 250);
        assert_eq!(stats.p50_ms, 300);
        assert_eq!(stats.max_ms, 400);
    }
}
