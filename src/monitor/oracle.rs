//! Root-cause oracle boundary.
//!
//! The oracle is an external reasoning service that answers a natural
//! language request with (hopefully) a JSON object. Its reply is untrusted:
//! it may be fenced in a code block, carry a language tag, miss fields or
//! not arrive at all. Everything here turns that into a tagged
//! `Result<Hypothesis, OracleError>` so a bad reply never aborts a cycle.

use crate::types::hypothesis::{Hypothesis, Intervention};
use crate::types::signal::AnomalySignal;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to or decoding the oracle. All variants are transient.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Network, HTTP or transport failure
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// No reply within the configured bound
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
    /// Reply could not be decoded into a hypothesis
    #[error("malformed oracle reply: {0}")]
    Malformed(String),
}

/// A diagnosis request: the rendered prompt plus the signal it was built from
#[derive(Debug, Clone)]
pub struct OracleRequest<'a> {
    pub signal: &'a AnomalySignal,
    pub prompt: String,
}

impl<'a> OracleRequest<'a> {
    pub fn new(signal: &'a AnomalySignal) -> Self {
        Self {
            signal,
            prompt: build_prompt(signal),
        }
    }
}

/// Text completion capability backing the reasoning step
#[async_trait]
pub trait RootCauseOracle: Send + Sync {
    /// Send a request and return the raw reply text
    async fn complete(&self, request: &OracleRequest<'_>) -> Result<String, OracleError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Build the natural-language prompt with the signal inlined as JSON
pub fn build_prompt(signal: &AnomalySignal) -> String {
    let data = serde_json::to_string(signal).unwrap_or_else(|_| format!("{:?}", signal));
    format!(
        r#"You are a Payment Reliability Engineer. Analyze this incident.
Data: {data}
Task: Diagnose root cause and suggest 'REROUTE' or 'ALERT_OPS'.
Output JSON ONLY:
{{
    "root_cause": "brief text",
    "suggested_intervention": "REROUTE" or "ALERT_OPS",
    "confidence_score": 0.0 to 1.0,
    "reasoning": "brief explanation"
}}"#
    )
}

/// Remove a surrounding code fence and a leading `json` language tag
pub fn strip_reply_markers(reply: &str) -> &str {
    let mut content = reply.trim();

    if let Some(stripped) = content.strip_prefix("```") {
        // keep what sits between the first pair of fences
        content = match stripped.find("```") {
            Some(end) => &stripped[..end],
            None => stripped,
        };
        content = content.trim();
    }
    if let Some(stripped) = content.strip_prefix("json") {
        content = stripped.trim();
    }

    content
}

#[derive(Deserialize)]
struct RawHypothesis {
    root_cause: String,
    suggested_intervention: Intervention,
    confidence_score: f64,
    reasoning: String,
}

/// Decode a reply and annotate it with the signal's entity and baseline
pub fn decode_hypothesis(reply: &str, signal: &AnomalySignal) -> Result<Hypothesis, OracleError> {
    let content = strip_reply_markers(reply);
    if content.is_empty() {
        return Err(OracleError::Malformed("empty reply".to_string()));
    }

    let raw: RawHypothesis =
        serde_json::from_str(content).map_err(|e| OracleError::Malformed(e.to_string()))?;

    if !raw.confidence_score.is_finite() || !(0.0..=1.0).contains(&raw.confidence_score) {
        return Err(OracleError::Malformed(format!(
            "confidence_score {} outside [0, 1]",
            raw.confidence_score
        )));
    }

    Ok(Hypothesis {
        root_cause: raw.root_cause,
        suggested_intervention: raw.suggested_intervention,
        confidence_score: raw.confidence_score,
        reasoning: raw.reasoning,
        affected_entity: signal.entity.clone(),
        baseline_failure_rate: signal.failure_rate,
    })
}

/// Result of one diagnosis attempt, with the time spent waiting
#[derive(Debug)]
pub struct Diagnosis {
    pub outcome: Result<Hypothesis, OracleError>,
    pub elapsed: Duration,
}

/// Oracle client with a bounded wait and tolerant reply decoding
pub struct OracleClient {
    oracle: Box<dyn RootCauseOracle>,
    timeout: Duration,
}

impl OracleClient {
    pub fn new(oracle: Box<dyn RootCauseOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.oracle.name()
    }

    /// Query the oracle for a signal. Never panics and never propagates errors.
    pub async fn diagnose(&self, signal: &AnomalySignal) -> Diagnosis {
        let request = OracleRequest::new(signal);
        let start = Instant::now();

        let reply = match tokio::time::timeout(self.timeout, self.oracle.complete(&request)).await
        {
            Ok(reply) => reply,
            Err(_) => Err(OracleError::Timeout(self.timeout)),
        };
        let outcome = reply.and_then(|text| {
            debug!(entity = %signal.entity, reply = %text, "Oracle replied");
            decode_hypothesis(&text, signal)
        });

        if let Err(e) = &outcome {
            warn!(
                entity = %signal.entity,
                provider = self.oracle.name(),
                error = %e,
                "Oracle diagnosis failed"
            );
        }

        Diagnosis {
            outcome,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::signal::AnomalyKind;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// Oracle that pops canned replies and records every request
    pub(crate) struct MockOracle {
        replies: Mutex<Vec<Result<String, OracleError>>>,
        pub(crate) requests: std::sync::Arc<Mutex<Vec<String>>>,
    }

    impl MockOracle {
        pub(crate) fn new(replies: Vec<Result<String, OracleError>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: std::sync::Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub(crate) fn replying(reply: &str) -> Self {
            Self::new(vec![Ok(reply.to_string())])
        }
    }

    #[async_trait]
    impl RootCauseOracle for MockOracle {
        async fn complete(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
            self.requests.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(OracleError::Unavailable("no canned reply".to_string())))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Oracle that never answers
    struct StalledOracle;

    #[async_trait]
    impl RootCauseOracle for StalledOracle {
        async fn complete(&self, _request: &OracleRequest<'_>) -> Result<String, OracleError> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    pub(crate) fn hdfc_signal() -> AnomalySignal {
        AnomalySignal {
            kind: AnomalyKind::HighFailureRate,
            entity: "HDFC".to_string(),
            failure_rate: 0.8,
            recent_errors: BTreeSet::from(["ERR_BANK_TIMEOUT".to_string()]),
            mean_latency_ms: 3100.0,
        }
    }

    const REPLY: &str = r#"{"root_cause": "HDFC UPI switch timing out", "suggested_intervention": "REROUTE", "confidence_score": 0.92, "reasoning": "Timeouts isolated to one bank"}"#;

    #[test]
    fn test_strip_fenced_reply() {
        let fenced = format!("```json\n{}\n```", REPLY);
        assert_eq!(strip_reply_markers(&fenced), REPLY);

        let bare_fence = format!("```\n{}\n```", REPLY);
        assert_eq!(strip_reply_markers(&bare_fence), REPLY);

        let tagged = format!("json {}", REPLY);
        assert_eq!(strip_reply_markers(&tagged), REPLY);

        assert_eq!(strip_reply_markers(REPLY), REPLY);
    }

    #[test]
    fn test_decode_annotates_signal() {
        let hypothesis = decode_hypothesis(REPLY, &hdfc_signal()).unwrap();
        assert_eq!(hypothesis.suggested_intervention, Intervention::Reroute);
        assert_eq!(hypothesis.affected_entity, "HDFC");
        assert_eq!(hypothesis.baseline_failure_rate, 0.8);
        assert_eq!(hypothesis.confidence_score, 0.92);
    }

    #[test]
    fn test_decode_rejects_unknown_intervention() {
        let reply = r#"{"root_cause": "x", "suggested_intervention": "RESTART", "confidence_score": 0.9, "reasoning": "y"}"#;
        assert!(matches!(
            decode_hypothesis(reply, &hdfc_signal()),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let reply = r#"{"root_cause": "x", "suggested_intervention": "REROUTE", "reasoning": "y"}"#;
        assert!(matches!(
            decode_hypothesis(reply, &hdfc_signal()),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_out_of_range_confidence() {
        let reply = r#"{"root_cause": "x", "suggested_intervention": "ALERT_OPS", "confidence_score": 1.7, "reasoning": "y"}"#;
        assert!(matches!(
            decode_hypothesis(reply, &hdfc_signal()),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_prose() {
        let reply = "I think the bank is down, you should reroute.";
        assert!(decode_hypothesis(reply, &hdfc_signal()).is_err());
        assert!(decode_hypothesis("   ", &hdfc_signal()).is_err());
    }

    #[test]
    fn test_prompt_inlines_signal() {
        let request = build_prompt(&hdfc_signal());
        assert!(request.contains("\"entity\":\"HDFC\""));
        assert!(request.contains("ERR_BANK_TIMEOUT"));
        assert!(request.contains("REROUTE"));
        assert!(request.contains("ALERT_OPS"));
    }

    #[tokio::test]
    async fn test_client_decodes_fenced_reply() {
        let oracle = MockOracle::replying(&format!("```json\n{}\n```", REPLY));
        let client = OracleClient::new(Box::new(oracle), Duration::from_secs(5));

        let diagnosis = client.diagnose(&hdfc_signal()).await;
        let hypothesis = diagnosis.outcome.unwrap();
        assert_eq!(hypothesis.root_cause, "HDFC UPI switch timing out");
    }

    #[tokio::test]
    async fn test_client_surfaces_unavailable() {
        let oracle = MockOracle::new(vec![Err(OracleError::Unavailable(
            "connection refused".to_string(),
        ))]);
        let client = OracleClient::new(Box::new(oracle), Duration::from_secs(5));

        let diagnosis = client.diagnose(&hdfc_signal()).await;
        assert!(matches!(diagnosis.outcome, Err(OracleError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_times_out() {
        let client = OracleClient::new(Box::new(StalledOracle), Duration::from_secs(30));

        let diagnosis = client.diagnose(&hdfc_signal()).await;
        assert!(matches!(diagnosis.outcome, Err(OracleError::Timeout(_))));
    }
}
