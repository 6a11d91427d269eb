//! Plain-text rendering of cycle reports

use crate::monitor::session::CycleReport;
use crate::types::decision::Decision;
use crate::types::transaction::TransactionStatus;
use std::fmt::Write;

const CONFIDENCE_BAR_WIDTH: usize = 40;

fn confidence_bar(confidence: f64) -> String {
    let filled = ((confidence.clamp(0.0, 1.0)) * CONFIDENCE_BAR_WIDTH as f64) as usize;
    format!(
        "[{}{}] {:.0}%",
        "|".repeat(filled),
        ".".repeat(CONFIDENCE_BAR_WIDTH - filled),
        confidence * 100.0
    )
}

fn render_decision(out: &mut String, decision: &Decision) {
    let _ = writeln!(out, "  ⚠ INTERVENTION {} ⚠", decision.status);
    let _ = writeln!(out, "  ACTION:     {}", decision.action);
    let _ = writeln!(out, "  REASON:     {}", decision.reason);
    if let Some(confidence) = decision.confidence {
        let _ = writeln!(out, "  CONFIDENCE: {}", confidence_bar(confidence));
    }
    let _ = writeln!(out, "  GUARDRAILS: {}", decision.guardrails);
    for alternative in &decision.alternatives {
        let _ = writeln!(out, "    - {}", alternative);
    }
}

/// Render one cycle as a text block
pub fn render_cycle(report: &CycleReport) -> String {
    let mut out = String::new();
    let tx = &report.transaction;
    let status = match tx.status {
        TransactionStatus::Success => "PASS",
        TransactionStatus::Failed => "FAIL",
    };

    let _ = writeln!(
        out,
        "#{:<5} {} {:<8} {:<6} {:<12} {} {}ms",
        report.cycle,
        tx.timestamp.format("%H:%M:%S"),
        tx.id,
        tx.counterparty,
        tx.method,
        status,
        tx.latency_ms
    );

    if let Some(decision) = report.decision.as_ref().filter(|d| d.is_actionable()) {
        render_decision(&mut out, decision);
    }

    if let Some(impact) = &report.impact {
        for (entity, entry) in impact {
            let _ = writeln!(
                out,
                "  ✔ {} Prev: {} Now: {} ({})",
                entity, entry.baseline_failure, entry.current_failure, entry.impact
            );
        }
    }

    if report.decision.is_some() {
        let _ = writeln!(out, "  INCIDENT TIMELINE");
        for entry in &report.timeline {
            let _ = writeln!(out, "    {}", entry);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::impact::ImpactEntry;
    use crate::types::decision::DecisionStatus;
    use crate::types::transaction::{PaymentMethod, Transaction};
    use std::collections::BTreeMap;

    fn report(decision: Option<Decision>) -> CycleReport {
        CycleReport {
            cycle: 12,
            transaction: Transaction::new("a1b2c3d4", "HDFC", PaymentMethod::Upi)
                .failed("ERR_BANK_TIMEOUT")
                .with_latency(3200),
            signal: None,
            decision,
            impact: Some(BTreeMap::from([(
                "HDFC".to_string(),
                ImpactEntry::new(0.8, 0.1),
            )])),
            timeline: Vec::new(),
        }
    }

    #[test]
    fn test_confidence_bar() {
        assert_eq!(
            confidence_bar(0.5),
            format!("[{}{}] 50%", "|".repeat(20), ".".repeat(20))
        );
    }

    #[test]
    fn test_render_executed_decision() {
        let decision = Decision {
            status: DecisionStatus::Executed,
            action: "REROUTE HDFC".to_string(),
            reason: "Timeouts isolated to HDFC".to_string(),
            alternatives: vec!["RETRY_BACKOFF (Rejected: High Risk)".to_string()],
            guardrails: "PASSED: Autonomous".to_string(),
            confidence: Some(0.9),
        };
        let text = render_cycle(&report(Some(decision)));

        assert!(text.contains("FAIL 3200ms"));
        assert!(text.contains("INTERVENTION EXECUTED"));
        assert!(text.contains("ACTION:     REROUTE HDFC"));
        assert!(text.contains("70% Improvement"));
        assert!(text.contains("INCIDENT TIMELINE"));
    }

    #[test]
    fn test_skipped_decision_has_no_panel() {
        let decision = Decision {
            status: DecisionStatus::Skipped,
            action: "NONE".to_string(),
            reason: "Confidence too low".to_string(),
            alternatives: Vec::new(),
            guardrails: "Check: Conf > 0.7".to_string(),
            confidence: None,
        };
        let text = render_cycle(&report(Some(decision)));
        assert!(!text.contains("INTERVENTION"));
    }
}
