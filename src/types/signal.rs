//! Anomaly signals raised by the window detector

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Rule that produced the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    HighFailureRate,
    HighLatency,
}

impl AnomalyKind {
    /// Marker text used in timeline entries; adjacent duplicates are suppressed on it.
    pub fn timeline_marker(&self) -> &'static str {
        match self {
            AnomalyKind::HighFailureRate => "High Failure Rate",
            AnomalyKind::HighLatency => "High Latency",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::HighFailureRate => "high_failure_rate",
            AnomalyKind::HighLatency => "high_latency",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A rule violation detected over the current window.
///
/// Recomputed on every ingest and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySignal {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Counterparty the violation was observed on
    pub entity: String,
    /// Failure proportion in [0, 1]; a fixed placeholder for latency signals
    pub failure_rate: f64,
    /// Distinct error codes seen on the entity's failures
    pub recent_errors: BTreeSet<String>,
    /// Mean latency of the entity's transactions in the window
    pub mean_latency_ms: f64,
}

impl AnomalySignal {
    /// Detection line for the incident timeline
    pub fn timeline_text(&self) -> String {
        match self.kind {
            AnomalyKind::HighFailureRate => format!(
                "DETECTED: {} ({:.0}%) on {}",
                self.kind.timeline_marker(),
                self.failure_rate * 100.0,
                self.entity
            ),
            AnomalyKind::HighLatency => format!(
                "DETECTED: {} ({}ms) on {}",
                self.kind.timeline_marker(),
                self.mean_latency_ms as u64,
                self.entity
            ),
        }
    }
}
