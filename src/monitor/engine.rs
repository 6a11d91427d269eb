//! Guardrailed decision engine and the active-intervention registry.
//!
//! Every hypothesis ends in exactly one of three outcomes:
//! - confidence below the threshold: `SKIPPED`, no state change
//! - `REROUTE`: `EXECUTED`, an intervention is recorded for the entity
//! - `ALERT_OPS`: `RECOMMENDED`, manual only, no state change

use super::timeline::Timeline;
use crate::config::DecisionConfig;
use crate::types::decision::{ActiveIntervention, Decision, DecisionStatus};
use crate::types::hypothesis::{Hypothesis, Intervention};
use std::collections::BTreeMap;
use tracing::info;

pub const LOW_CONFIDENCE_REASON: &str = "Confidence too low";
pub const AUTONOMOUS_GUARDRAIL: &str = "PASSED: Autonomous";
pub const MANUAL_GUARDRAIL: &str = "MANUAL: Operator approval required";

/// Applies guardrails to hypotheses and owns the intervention state
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    confidence_threshold: f64,
    reroute_target: String,
    interventions: BTreeMap<String, ActiveIntervention>,
}

impl DecisionEngine {
    pub fn new(config: &DecisionConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            reroute_target: config.reroute_target.clone(),
            interventions: BTreeMap::new(),
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Counterparty that rerouted traffic is sent to
    pub fn reroute_target(&self) -> &str {
        &self.reroute_target
    }

    /// Guardrail note shown when confidence is insufficient
    pub fn confidence_guardrail(&self) -> String {
        format!("Check: Conf > {}", self.confidence_threshold)
    }

    /// Decide on a hypothesis, recording an intervention when one is executed
    pub fn decide(&mut self, hypothesis: &Hypothesis, timeline: &mut Timeline) -> Decision {
        let entity = &hypothesis.affected_entity;
        let suggestion = hypothesis.suggested_intervention;
        let alternatives = suggestion.rejected_alternatives();

        if hypothesis.confidence_score < self.confidence_threshold {
            info!(
                entity = %entity,
                confidence = hypothesis.confidence_score,
                threshold = self.confidence_threshold,
                "Decision skipped: confidence below threshold"
            );
            return Decision {
                status: DecisionStatus::Skipped,
                action: "NONE".to_string(),
                reason: LOW_CONFIDENCE_REASON.to_string(),
                alternatives,
                guardrails: self.confidence_guardrail(),
                confidence: None,
            };
        }

        match suggestion {
            Intervention::Reroute => {
                let intervention = ActiveIntervention::new(
                    format!("REROUTED_TO_{}", self.reroute_target),
                    hypothesis.baseline_failure_rate,
                );
                self.interventions.insert(entity.clone(), intervention);
                timeline.append(format!("ACT: Rerouting {}", entity));
                info!(
                    entity = %entity,
                    target = %self.reroute_target,
                    confidence = hypothesis.confidence_score,
                    "Reroute executed"
                );

                Decision {
                    status: DecisionStatus::Executed,
                    action: format!("REROUTE {}", entity),
                    reason: hypothesis.reasoning.clone(),
                    alternatives,
                    guardrails: AUTONOMOUS_GUARDRAIL.to_string(),
                    confidence: Some(hypothesis.confidence_score),
                }
            }
            Intervention::AlertOps => {
                timeline.append(format!("REC: Alert Ops for {}", entity));
                info!(
                    entity = %entity,
                    confidence = hypothesis.confidence_score,
                    "Operator alert recommended"
                );

                Decision {
                    status: DecisionStatus::Recommended,
                    action: format!("ALERT OPS: {}", entity),
                    reason: hypothesis.reasoning.clone(),
                    alternatives,
                    guardrails: MANUAL_GUARDRAIL.to_string(),
                    confidence: Some(hypothesis.confidence_score),
                }
            }
        }
    }

    pub fn is_active(&self, entity: &str) -> bool {
        self.interventions.contains_key(entity)
    }

    pub fn interventions(&self) -> &BTreeMap<String, ActiveIntervention> {
        &self.interventions
    }

    pub(crate) fn interventions_mut(&mut self) -> &mut BTreeMap<String, ActiveIntervention> {
        &mut self.interventions
    }

    /// Remove the intervention for an entity
    pub fn clear(&mut self, entity: &str) -> Option<ActiveIntervention> {
        self.interventions.remove(entity)
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.70,
            reroute_target: "SBI".to_string(),
            interventions: BTreeMap::new(),
        }
    }
}
