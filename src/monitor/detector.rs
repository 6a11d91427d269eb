//! Rule-based anomaly detection over the transaction window.
//!
//! Rules are evaluated in strict priority order on the full window:
//! the failure-rate rule always wins over the latency rule. Counterparties
//! are visited in ascending name order, and the first one that violates a
//! rule is reported, so a given window always yields the same signal.

use crate::config::DetectionConfig;
use crate::types::signal::{AnomalyKind, AnomalySignal};
use crate::types::transaction::Transaction;
use std::collections::{BTreeMap, BTreeSet};

/// Error code attached to latency signals
pub const SLOW_RESPONSE: &str = "SLOW_RESPONSE";

/// Aggregates for one counterparty over the window
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CounterpartyStats {
    pub total: usize,
    pub failed: usize,
    pub latency_sum_ms: u64,
    pub error_codes: BTreeSet<String>,
}

impl CounterpartyStats {
    pub fn failure_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.failed as f64 / self.total as f64
    }

    pub fn mean_latency_ms(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.latency_sum_ms as f64 / self.total as f64
    }
}

/// Anomaly detector with configurable thresholds
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    failure_rate_threshold: f64,
    latency_threshold_ms: f64,
    latency_placeholder_failure_rate: f64,
}

impl AnomalyDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            failure_rate_threshold: config.failure_rate_threshold,
            latency_threshold_ms: config.latency_threshold_ms,
            latency_placeholder_failure_rate: config.latency_placeholder_failure_rate,
        }
    }

    pub fn failure_rate_threshold(&self) -> f64 {
        self.failure_rate_threshold
    }

    /// Group transactions by counterparty, keyed in ascending name order
    pub fn group_by_counterparty<'a, I>(transactions: I) -> BTreeMap<String, CounterpartyStats>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut groups: BTreeMap<String, CounterpartyStats> = BTreeMap::new();
        for tx in transactions {
            let stats = groups.entry(tx.counterparty.clone()).or_default();
            stats.total += 1;
            stats.latency_sum_ms += tx.latency_ms;
            if tx.is_failed() {
                stats.failed += 1;
                if let Some(code) = &tx.error_code {
                    stats.error_codes.insert(code.clone());
                }
            }
        }
        groups
    }

    /// Scan the window and return at most one signal
    pub fn detect<'a, I>(&self, window: I) -> Option<AnomalySignal>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let groups = Self::group_by_counterparty(window);
        if groups.is_empty() {
            return None;
        }

        if let Some((entity, stats)) = groups
            .iter()
            .find(|(_, stats)| stats.failure_rate() > self.failure_rate_threshold)
        {
            return Some(AnomalySignal {
                kind: AnomalyKind::HighFailureRate,
                entity: entity.clone(),
                failure_rate: stats.failure_rate(),
                recent_errors: stats.error_codes.clone(),
                mean_latency_ms: stats.mean_latency_ms(),
            });
        }

        groups
            .iter()
            .find(|(_, stats)| stats.mean_latency_ms() > self.latency_threshold_ms)
            .map(|(entity, stats)| AnomalySignal {
                kind: AnomalyKind::HighLatency,
                entity: entity.clone(),
                failure_rate: self.latency_placeholder_failure_rate,
                recent_errors: BTreeSet::from([SLOW_RESPONSE.to_string()]),
                mean_latency_ms: stats.mean_latency_ms(),
            })
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.30,
            latency_threshold_ms: 1000.0,
            latency_placeholder_failure_rate: 0.05,
        }
    }
}
