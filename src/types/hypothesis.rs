//! Root-cause hypotheses returned by the oracle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remediation the oracle may suggest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intervention {
    Reroute,
    AlertOps,
}

impl Intervention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intervention::Reroute => "REROUTE",
            Intervention::AlertOps => "ALERT_OPS",
        }
    }

    /// Options considered and rejected when this intervention is chosen.
    ///
    /// Fixed audit trail, not the result of evaluating the alternatives.
    pub fn rejected_alternatives(&self) -> Vec<String> {
        let alternatives: &[&str] = match self {
            Intervention::Reroute => &[
                "RETRY_BACKOFF (Rejected: High Risk)",
                "DO_NOTHING (Rejected: Failures > 30%)",
            ],
            Intervention::AlertOps => &[
                "REROUTE (Rejected: Low Confidence)",
                "AUTO_FIX (Rejected: Unsafe)",
            ],
        };
        alternatives.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Oracle diagnosis for a signal, annotated with the affected entity and
/// the failure rate observed when the signal fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub root_cause: String,
    pub suggested_intervention: Intervention,
    /// Oracle confidence in [0, 1]
    pub confidence_score: f64,
    pub reasoning: String,
    pub affected_entity: String,
    pub baseline_failure_rate: f64,
}
