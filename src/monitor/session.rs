//! Monitoring session: one owned aggregate for all per-run state.
//!
//! A cycle is feed → routing → window update → detect → (signal) oracle →
//! (hypothesis) decide → impact. Everything that survives between cycles
//! (window, interventions, timeline) lives here and is touched only by the
//! cycle that owns the session.

use super::detector::AnomalyDetector;
use super::engine::DecisionEngine;
use super::impact::{ImpactReport, ImpactTracker};
use super::oracle::{OracleClient, RootCauseOracle};
use super::timeline::{Timeline, TimelineEntry};
use super::window::TransactionWindow;
use crate::config::AppConfig;
use crate::metrics::MonitorMetrics;
use crate::types::decision::{ActiveIntervention, Decision};
use crate::types::hypothesis::Hypothesis;
use crate::types::signal::AnomalySignal;
use crate::types::transaction::{Transaction, TransactionStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Latency assigned to traffic served by the reroute target
pub const REROUTED_LATENCY_MS: u64 = 120;

/// Everything a presentation layer needs from one cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    /// The transaction as ingested, after routing
    pub transaction: Transaction,
    pub signal: Option<AnomalySignal>,
    pub decision: Option<Decision>,
    pub impact: Option<ImpactReport>,
    /// Most recent timeline entries, oldest first
    pub timeline: Vec<TimelineEntry>,
}

/// Shutdown report
#[derive(Debug, Clone, Serialize)]
pub struct IncidentSummary {
    /// Timeline entries recorded over the session
    pub events: usize,
    /// Entities with an intervention still in effect
    pub active_interventions: Vec<String>,
    pub timeline: Vec<String>,
}

impl fmt::Display for IncidentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== INCIDENT SUMMARY ===")?;
        writeln!(f, "Events: {}", self.events)?;
        writeln!(f, "State: [{}]", self.active_interventions.join(", "))?;
        write!(f, "Timeline:")?;
        for line in &self.timeline {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

pub struct Session {
    window: TransactionWindow,
    detector: AnomalyDetector,
    oracle: OracleClient,
    engine: DecisionEngine,
    impact: ImpactTracker,
    timeline: Timeline,
    metrics: Arc<MonitorMetrics>,
    auto_clear_after: Option<u32>,
    render_tail: usize,
    cycle: u64,
}

impl Session {
    pub fn new(config: &AppConfig, oracle: Box<dyn RootCauseOracle>) -> Self {
        Self {
            window: TransactionWindow::new(config.window.capacity),
            detector: AnomalyDetector::new(&config.detection),
            oracle: OracleClient::new(oracle, Duration::from_millis(config.oracle.timeout_ms)),
            engine: DecisionEngine::new(&config.decision),
            impact: ImpactTracker::new(&config.impact),
            timeline: Timeline::new(config.timeline.max_entries),
            metrics: Arc::new(MonitorMetrics::new()),
            auto_clear_after: config.impact.auto_clear_after,
            render_tail: config.timeline.render_tail,
            cycle: 0,
        }
    }

    /// Share an externally owned metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MonitorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Apply active reroutes to an incoming transaction.
    ///
    /// Traffic for a rerouted counterparty is served by the reroute target.
    /// The target's own traffic is never rewritten.
    pub fn route(&self, transaction: Transaction) -> Transaction {
        if !self.engine.is_active(&transaction.counterparty)
            || transaction.counterparty == self.engine.reroute_target()
        {
            return transaction;
        }
        debug!(
            transaction_id = %transaction.id,
            from = %transaction.counterparty,
            to = %self.engine.reroute_target(),
            "Transaction rerouted"
        );
        Transaction {
            counterparty: self.engine.reroute_target().to_string(),
            status: TransactionStatus::Success,
            latency_ms: REROUTED_LATENCY_MS,
            error_code: None,
            ..transaction
        }
    }

    /// Add a transaction to the window and run detection
    pub fn ingest(&mut self, transaction: Transaction) -> Option<AnomalySignal> {
        self.window.ingest(transaction);
        let signal = self.detector.detect(&self.window)?;

        self.metrics.record_anomaly(signal.kind);
        let marker = signal.kind.timeline_marker();
        if self.timeline.append_detection(marker, signal.timeline_text()) {
            info!(
                entity = %signal.entity,
                kind = %signal.kind,
                failure_rate = signal.failure_rate,
                "Anomaly detected"
            );
        }
        Some(signal)
    }

    /// Ask the oracle for a hypothesis, unless the entity is already being handled
    pub async fn diagnose(&mut self, signal: &AnomalySignal) -> Option<Hypothesis> {
        if self.engine.is_active(&signal.entity) {
            self.metrics.record_oracle_suppressed();
            debug!(entity = %signal.entity, "Intervention active, diagnosis suppressed");
            return None;
        }

        info!(entity = %signal.entity, provider = self.oracle.provider_name(), "Analyzing anomaly");
        let diagnosis = self.oracle.diagnose(signal).await;
        self.metrics
            .record_oracle_call(diagnosis.elapsed, diagnosis.outcome.is_ok());

        let hypothesis = diagnosis.outcome.ok()?;
        self.timeline
            .append(format!("REASONED: {}", hypothesis.root_cause));
        Some(hypothesis)
    }

    pub fn decide(&mut self, hypothesis: &Hypothesis) -> Decision {
        let decision = self.engine.decide(hypothesis, &mut self.timeline);
        self.metrics.record_decision(decision.status);
        decision
    }

    /// Measure active interventions and apply auto-clearing if configured
    pub fn assess(&mut self) -> Option<ImpactReport> {
        let report = self.impact.assess(&self.window, self.engine.interventions())?;

        if let Some(required) = self.auto_clear_after {
            let healthy_limit = self.detector.failure_rate_threshold();
            let mut recovered = Vec::new();

            for (entity, entry) in &report {
                if let Some(intervention) = self.engine.interventions_mut().get_mut(entity) {
                    if entry.current_rate <= healthy_limit {
                        intervention.healthy_streak += 1;
                    } else {
                        intervention.healthy_streak = 0;
                    }
                    if intervention.healthy_streak >= required {
                        recovered.push(entity.clone());
                    }
                }
            }

            for entity in recovered {
                info!(entity = %entity, cycles = required, "Intervention auto-cleared after sustained recovery");
                self.clear_intervention(&entity);
            }
        }

        Some(report)
    }

    /// Run one full cycle for a transaction pulled from the feed
    pub async fn run_cycle(&mut self, transaction: Transaction) -> CycleReport {
        self.cycle += 1;
        self.metrics.record_cycle();

        let transaction = self.route(transaction);
        let signal = self.ingest(transaction.clone());

        let mut decision = None;
        if let Some(signal) = &signal {
            if let Some(hypothesis) = self.diagnose(signal).await {
                decision = Some(self.decide(&hypothesis));
            }
        }
        let impact = self.assess();

        CycleReport {
            cycle: self.cycle,
            transaction,
            signal,
            decision,
            impact,
            timeline: self.timeline.recent(self.render_tail),
        }
    }

    /// Operator action: lift the intervention on an entity
    pub fn clear_intervention(&mut self, entity: &str) -> Option<ActiveIntervention> {
        let cleared = self.engine.clear(entity)?;
        self.timeline
            .append(format!("CLEARED: Intervention on {}", entity));
        self.metrics.record_cleared();
        Some(cleared)
    }

    pub fn summary(&self) -> IncidentSummary {
        IncidentSummary {
            events: self.timeline.total_recorded(),
            active_interventions: self.engine.interventions().keys().cloned().collect(),
            timeline: self.timeline.entries().map(|e| e.to_string()).collect(),
        }
    }

    pub fn window(&self) -> &TransactionWindow {
        &self.window
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn interventions(&self) -> &BTreeMap<String, ActiveIntervention> {
        self.engine.interventions()
    }

    pub fn metrics(&self) -> &Arc<MonitorMetrics> {
        &self.metrics
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::monitor::heuristic::HeuristicOracle;
    use crate::monitor::oracle::tests::MockOracle;
    use crate::monitor::oracle::OracleError;
    use crate::types::decision::DecisionStatus;
    use crate::types::signal::AnomalyKind;
    use crate::types::transaction::PaymentMethod;
    use std::sync::atomic::Ordering;

    const REROUTE_REPLY: &str = r#"```json
{"root_cause": "HDFC UPI gateway timeouts", "suggested_intervention": "REROUTE", "confidence_score": 0.9, "reasoning": "Timeouts isolated to HDFC"}
```"#;

    fn hdfc_failure() -> Transaction {
        Transaction::new("f", "HDFC", PaymentMethod::Upi)
            .failed("ERR_BANK_TIMEOUT")
            .with_latency(3000)
    }

    fn ok(bank: &str) -> Transaction {
        Transaction::new("s", bank, PaymentMethod::CreditCard).with_latency(150)
    }

    #[tokio::test]
    async fn test_end_to_end_reroute() {
        let oracle = MockOracle::replying(REROUTE_REPLY);
        let requests = oracle.requests.clone();
        let mut session = Session::new(&AppConfig::default(), Box::new(oracle));

        // first failure already exceeds 30% for HDFC
        let report = session.run_cycle(hdfc_failure()).await;

        let signal = report.signal.unwrap();
        assert_eq!(signal.kind, AnomalyKind::HighFailureRate);
        let decision = report.decision.unwrap();
        assert_eq!(decision.status, DecisionStatus::Executed);
        assert_eq!(decision.action, "REROUTE HDFC");
        assert!(session.interventions().contains_key("HDFC"));
        assert_eq!(requests.lock().unwrap().len(), 1);

        let texts: Vec<&str> = session.timeline().entries().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "DETECTED: High Failure Rate (100%) on HDFC",
                "REASONED: HDFC UPI gateway timeouts",
                "ACT: Rerouting HDFC",
            ]
        );
    }

    #[tokio::test]
    async fn test_active_intervention_suppresses_oracle() {
        let oracle = MockOracle::replying(REROUTE_REPLY);
        let requests = oracle.requests.clone();
        let mut session = Session::new(&AppConfig::default(), Box::new(oracle));

        session.run_cycle(hdfc_failure()).await;

        // signal for HDFC persists from the window, but no new oracle query
        let signal = session.ingest(hdfc_failure()).unwrap();
        assert_eq!(signal.entity, "HDFC");
        assert!(session.diagnose(&signal).await.is_none());
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert_eq!(session.metrics().oracle_suppressed.load(Ordering::Relaxed), 1);

        // once cleared, the oracle is consulted again
        session.clear_intervention("HDFC").unwrap();
        assert!(session.diagnose(&signal).await.is_none()); // mock has no reply left
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_routing_rewrites_rerouted_counterparty() {
        let oracle = MockOracle::replying(REROUTE_REPLY);
        let mut session = Session::new(&AppConfig::default(), Box::new(oracle));
        session.run_cycle(hdfc_failure()).await;

        let report = session.run_cycle(hdfc_failure()).await;
        assert_eq!(report.transaction.counterparty, "SBI");
        assert_eq!(report.transaction.status, TransactionStatus::Success);
        assert_eq!(report.transaction.latency_ms, REROUTED_LATENCY_MS);
        assert!(report.transaction.error_code.is_none());

        let untouched = session.route(ok("AXIS"));
        assert_eq!(untouched.counterparty, "AXIS");
    }

    #[tokio::test]
    async fn test_reroute_target_traffic_is_not_rewritten() {
        let reply = r#"{"root_cause": "SBI core banking degraded", "suggested_intervention": "REROUTE", "confidence_score": 0.9, "reasoning": "Failures isolated to SBI"}"#;
        let mut session = Session::new(&AppConfig::default(), Box::new(MockOracle::replying(reply)));
        let sbi_failure = || {
            Transaction::new("f", "SBI", PaymentMethod::Upi)
                .failed("ERR_BANK_TIMEOUT")
                .with_latency(3000)
        };

        let report = session.run_cycle(sbi_failure()).await;
        assert_eq!(report.decision.unwrap().status, DecisionStatus::Executed);
        assert!(session.interventions().contains_key("SBI"));

        let report = session.run_cycle(sbi_failure()).await;
        assert_eq!(report.transaction.status, TransactionStatus::Failed);
        assert_eq!(report.transaction.latency_ms, 3000);
        assert_eq!(report.transaction.error_code.as_deref(), Some("ERR_BANK_TIMEOUT"));
    }

    #[tokio::test]
    async fn test_oracle_failure_yields_no_decision() {
        let oracle = MockOracle::new(vec![
            Err(OracleError::Unavailable("connection refused".to_string())),
            Ok("not json at all".to_string()),
        ]);
        let mut session = Session::new(&AppConfig::default(), Box::new(oracle));

        let first = session.run_cycle(hdfc_failure()).await;
        let second = session.run_cycle(hdfc_failure()).await;

        assert!(first.signal.is_some() && first.decision.is_none());
        assert!(second.signal.is_some() && second.decision.is_none());
        assert!(session.interventions().is_empty());
        assert_eq!(session.metrics().oracle_failures.load(Ordering::Relaxed), 2);
        // only the single deduplicated detection made it into the timeline
        assert_eq!(session.timeline().len(), 1);
    }

    #[tokio::test]
    async fn test_low_confidence_skips() {
        let reply = r#"{"root_cause": "unclear", "suggested_intervention": "REROUTE", "confidence_score": 0.4, "reasoning": "weak evidence"}"#;
        let mut session = Session::new(&AppConfig::default(), Box::new(MockOracle::replying(reply)));

        let report = session.run_cycle(hdfc_failure()).await;
        let decision = report.decision.unwrap();
        assert_eq!(decision.status, DecisionStatus::Skipped);
        assert!(session.interventions().is_empty());
        assert!(report.impact.is_none());
    }

    #[tokio::test]
    async fn test_hdfc_outage_scenario() {
        let mut session = Session::new(&AppConfig::default(), Box::new(HeuristicOracle::new()));
        let mut last = None;
        for i in 0..20 {
            let tx = if i < 18 { hdfc_failure() } else { ok("HDFC").with_latency(3000) };
            last = session.ingest(tx);
        }

        let signal = last.unwrap();
        assert_eq!(signal.kind, AnomalyKind::HighFailureRate);
        assert!((signal.failure_rate - 0.90).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_impact_reported_after_reroute() {
        let mut session = Session::new(&AppConfig::default(), Box::new(HeuristicOracle::new()));
        for _ in 0..4 {
            session.ingest(ok("HDFC"));
        }
        // 1 failure in 5 is below threshold; the next tips HDFC over 30%
        session.ingest(hdfc_failure());
        let report = session.run_cycle(hdfc_failure()).await;
        assert_eq!(report.decision.unwrap().status, DecisionStatus::Executed);
        let baseline = session.interventions()["HDFC"].baseline_failure_rate;
        assert!((baseline - 2.0 / 6.0).abs() < 1e-9);

        for _ in 0..10 {
            session.run_cycle(ok("ICICI")).await;
        }
        let report = session.run_cycle(ok("ICICI")).await;
        let impact = report.impact.unwrap();
        assert_eq!(impact["HDFC"].current_failure, "0%");
        assert_eq!(impact["HDFC"].impact, "33% Improvement");
    }

    #[tokio::test]
    async fn test_auto_clear_after_sustained_recovery() {
        let mut config = AppConfig::default();
        config.impact.auto_clear_after = Some(3);
        let mut session = Session::new(&config, Box::new(HeuristicOracle::new()));

        session.run_cycle(hdfc_failure()).await;
        assert!(session.interventions().contains_key("HDFC"));

        // the slice still holds the first failure: 1/2 > 30%, streak stays 0
        session.run_cycle(ok("SBI")).await;
        assert!(session.interventions().contains_key("HDFC"));

        // 1/3 is still above 30%; then 1/4, 1/5, 1/6 are three healthy assessments
        for _ in 0..3 {
            session.run_cycle(ok("SBI")).await;
        }
        assert_eq!(session.interventions()["HDFC"].healthy_streak, 2);

        session.run_cycle(ok("SBI")).await;
        assert!(session.interventions().is_empty());
        assert!(session
            .timeline()
            .entries()
            .any(|e| e.text == "CLEARED: Intervention on HDFC"));
    }

    #[tokio::test]
    async fn test_summary() {
        let mut session = Session::new(&AppConfig::default(), Box::new(HeuristicOracle::new()));
        session.run_cycle(hdfc_failure()).await;

        let summary = session.summary();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.active_interventions, vec!["HDFC".to_string()]);

        let rendered = summary.to_string();
        assert!(rendered.starts_with("=== INCIDENT SUMMARY ===\nEvents: 3\nState: [HDFC]\nTimeline:\n"));
        assert!(rendered.contains("ACT: Rerouting HDFC"));
    }
}
