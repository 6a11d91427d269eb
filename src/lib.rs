//! Payment Operations Monitor Library
//!
//! Watches a stream of payment transactions through a sliding window,
//! detects per-counterparty failure and latency anomalies, asks a
//! root-cause oracle for a diagnosis, and applies guardrailed remediation
//! whose impact is tracked against the pre-intervention baseline.

pub mod config;
pub mod metrics;
pub mod monitor;
pub mod publisher;
pub mod render;
pub mod simulator;
pub mod types;

pub use config::AppConfig;
pub use metrics::MonitorMetrics;
pub use monitor::{CycleReport, IncidentSummary, RootCauseOracle, Session};
pub use publisher::DecisionPublisher;
pub use simulator::{PaymentSimulator, TransactionFeed};
pub use types::{AnomalySignal, Decision, DecisionStatus, Hypothesis, Transaction};
