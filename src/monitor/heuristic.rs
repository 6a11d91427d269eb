//! Offline oracle that diagnoses from the signal alone.
//!
//! Answers through the same text contract as a remote model (a fenced JSON
//! reply) so the decode path is identical whichever provider is configured.

use super::oracle::{OracleError, OracleRequest, RootCauseOracle};
use crate::types::hypothesis::Intervention;
use crate::types::signal::{AnomalyKind, AnomalySignal};
use async_trait::async_trait;
use serde_json::json;

/// Rule-of-thumb diagnosis: failures are rerouted, slowness is escalated
#[derive(Debug, Clone, Default)]
pub struct HeuristicOracle;

impl HeuristicOracle {
    pub fn new() -> Self {
        Self
    }

    fn diagnose(signal: &AnomalySignal) -> (String, Intervention, f64, String) {
        let errors = signal
            .recent_errors
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        match signal.kind {
            AnomalyKind::HighFailureRate => (
                format!("{} failing with {}", signal.entity, errors),
                Intervention::Reroute,
                0.9,
                format!(
                    "{:.0}% of {} transactions failed in the window; errors are isolated to one counterparty",
                    signal.failure_rate * 100.0,
                    signal.entity
                ),
            ),
            AnomalyKind::HighLatency => (
                format!("{} responding slowly", signal.entity),
                Intervention::AlertOps,
                0.8,
                format!(
                    "Mean latency {:.0}ms with few failures; degradation needs operator review",
                    signal.mean_latency_ms
                ),
            ),
        }
    }
}

#[async_trait]
impl RootCauseOracle for HeuristicOracle {
    async fn complete(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        let (root_cause, intervention, confidence, reasoning) = Self::diagnose(request.signal);
        let body = json!({
            "root_cause": root_cause,
            "suggested_intervention": intervention,
            "confidence_score": confidence,
            "reasoning": reasoning,
        });
        Ok(format!("```json\n{}\n```", body))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
