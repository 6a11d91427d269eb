//! Post-intervention impact measurement

use super::window::TransactionWindow;
use crate::config::{ImpactConfig, ImpactScope};
use crate::types::decision::ActiveIntervention;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Impact of one active intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEntry {
    /// Baseline failure rate, e.g. "80%"
    pub baseline_failure: String,
    /// Failure rate over the recent slice, e.g. "10%"
    pub current_failure: String,
    /// e.g. "70% Improvement"
    pub impact: String,
    pub baseline_rate: f64,
    pub current_rate: f64,
    /// baseline − current; negative when things got worse
    pub improvement: f64,
}

impl ImpactEntry {
    pub fn new(baseline_rate: f64, current_rate: f64) -> Self {
        let improvement = baseline_rate - current_rate;
        Self {
            baseline_failure: format_percent(baseline_rate),
            current_failure: format_percent(current_rate),
            impact: format!("{} Improvement", format_percent(improvement)),
            baseline_rate,
            current_rate,
            improvement,
        }
    }
}

/// Entity → impact, for every intervention that could be measured
pub type ImpactReport = BTreeMap<String, ImpactEntry>;

fn format_percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Compares recent failure rates against intervention baselines
#[derive(Debug, Clone)]
pub struct ImpactTracker {
    recent_slice: usize,
    scope: ImpactScope,
}

impl ImpactTracker {
    pub fn new(config: &ImpactConfig) -> Self {
        Self {
            recent_slice: config.recent_slice.max(1),
            scope: config.scope,
        }
    }

    pub fn scope(&self) -> ImpactScope {
        self.scope
    }

    /// Failure rate over the recent slice for `entity`, or `None` if the slice is empty
    fn current_failure_rate(&self, window: &TransactionWindow, entity: &str) -> Option<f64> {
        let (total, failed) = match self.scope {
            ImpactScope::Window => window
                .recent(self.recent_slice)
                .fold((0usize, 0usize), |(total, failed), tx| {
                    (total + 1, failed + usize::from(tx.is_failed()))
                }),
            ImpactScope::Entity => window
                .iter()
                .rev()
                .filter(|tx| tx.counterparty == entity)
                .take(self.recent_slice)
                .fold((0usize, 0usize), |(total, failed), tx| {
                    (total + 1, failed + usize::from(tx.is_failed()))
                }),
        };

        if total == 0 {
            None
        } else {
            Some(failed as f64 / total as f64)
        }
    }

    /// Measure every active intervention; `None` when there are none
    pub fn assess(
        &self,
        window: &TransactionWindow,
        interventions: &BTreeMap<String, ActiveIntervention>,
    ) -> Option<ImpactReport> {
        if interventions.is_empty() {
            return None;
        }

        let report = interventions
            .iter()
            .filter_map(|(entity, intervention)| {
                self.current_failure_rate(window, entity).map(|current| {
                    (
                        entity.clone(),
                        ImpactEntry::new(intervention.baseline_failure_rate, current),
                    )
                })
            })
            .collect();

        Some(report)
    }
}

impl Default for ImpactTracker {
    fn default() -> Self {
        Self {
            recent_slice: 10,
            scope: ImpactScope::Window,
        }
    }
}
