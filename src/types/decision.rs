//! Decision records and active interventions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionStatus {
    /// Guardrail rejected the hypothesis
    Skipped,
    /// Autonomous action taken
    Executed,
    /// Manual action recommended to operators
    Recommended,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Skipped => "SKIPPED",
            DecisionStatus::Executed => "EXECUTED",
            DecisionStatus::Recommended => "RECOMMENDED",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Auditable decision produced for a hypothesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub action: String,
    pub reason: String,
    /// Rejected alternatives, in presentation order
    pub alternatives: Vec<String>,
    /// Guardrail note shown with the decision
    pub guardrails: String,
    /// Oracle confidence; absent when the decision was skipped
    pub confidence: Option<f64>,
}

impl Decision {
    /// Whether the decision calls for operator attention
    pub fn is_actionable(&self) -> bool {
        matches!(
            self.status,
            DecisionStatus::Executed | DecisionStatus::Recommended
        )
    }
}

/// Remediation currently in effect for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveIntervention {
    /// Action label, e.g. `REROUTED_TO_SBI`
    pub action: String,
    /// Failure rate snapshot taken when the intervention started
    pub baseline_failure_rate: f64,
    pub timestamp: DateTime<Utc>,
    /// Consecutive assessments with a healthy failure rate
    #[serde(default)]
    pub healthy_streak: u32,
}

impl ActiveIntervention {
    pub fn new(action: impl Into<String>, baseline_failure_rate: f64) -> Self {
        Self {
            action: action.into(),
            baseline_failure_rate,
            timestamp: Utc::now(),
            healthy_streak: 0,
        }
    }
}
