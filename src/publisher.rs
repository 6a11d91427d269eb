//! NATS publisher for decision-bearing cycle reports

use crate::monitor::session::CycleReport;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Publishes cycle reports that carry a decision
#[derive(Clone)]
pub struct DecisionPublisher {
    client: Client,
    subject: String,
}

impl DecisionPublisher {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Connect to NATS and build a publisher
    pub async fn connect(url: &str, subject: &str) -> Result<Self> {
        let client = async_nats::connect(url).await?;
        Ok(Self::new(client, subject))
    }

    /// Publish the report if it carries a decision. Returns whether anything was sent.
    pub async fn publish(&self, report: &CycleReport) -> Result<bool> {
        let (Some(decision), Some(payload)) = (&report.decision, decision_payload(report)?) else {
            return Ok(false);
        };

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            cycle = report.cycle,
            status = %decision.status,
            action = %decision.action,
            subject = %self.subject,
            "Published decision"
        );

        Ok(true)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// JSON body for a report that carries a decision
pub fn decision_payload(report: &CycleReport) -> Result<Option<Vec<u8>>> {
    if report.decision.is_none() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_vec(report)?))
}
