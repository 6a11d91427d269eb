//! Configuration management for the payment operations monitor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, loaded when present
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Which root-cause oracle backs the reasoning step
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    /// Local Ollama chat endpoint
    #[default]
    Ollama,
    /// Offline rule-of-thumb diagnosis, no network
    Heuristic,
}

/// Which transactions the impact tracker measures against
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImpactScope {
    /// Most recent transactions across the whole window
    #[default]
    Window,
    /// Most recent transactions of the intervened entity only
    Entity,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub window: WindowConfig,
    pub detection: DetectionConfig,
    pub decision: DecisionConfig,
    pub oracle: OracleConfig,
    pub impact: ImpactConfig,
    pub timeline: TimelineConfig,
    pub nats: NatsConfig,
    pub logging: LoggingConfig,
}

/// Simulated transaction feed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Delay between cycles in milliseconds
    pub pace_ms: u64,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Number of most recent transactions kept for detection
    pub capacity: usize,
}

/// Detection rule thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Per-counterparty failure proportion above which a signal fires
    pub failure_rate_threshold: f64,
    /// Per-counterparty mean latency above which a signal fires
    pub latency_threshold_ms: f64,
    /// Failure rate reported on latency signals
    pub latency_placeholder_failure_rate: f64,
}

/// Decision guardrails
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionConfig {
    /// Minimum oracle confidence (inclusive) for any action
    pub confidence_threshold: f64,
    /// Counterparty that rerouted traffic is sent to
    pub reroute_target: String,
}

/// Root-cause oracle connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub provider: OracleProvider,
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Model name passed to the chat endpoint
    pub model: String,
    /// Upper bound on a single oracle call in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImpactConfig {
    /// Number of most recent transactions compared against the baseline
    pub recent_slice: usize,
    #[serde(default)]
    pub scope: ImpactScope,
    /// Clear an intervention after this many consecutive healthy assessments
    #[serde(default)]
    pub auto_clear_after: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Cap on retained entries; unbounded when absent
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Number of trailing entries included in each cycle report
    pub render_tail: usize,
}

/// NATS publishing of decisions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NatsConfig {
    pub enabled: bool,
    /// NATS server URL
    pub url: String,
    /// Subject for outgoing cycle reports that carry a decision
    pub decision_subject: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default file, if it exists
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration layered as defaults, then file, then `PAYOPS__*` env vars
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                Config::try_from(&AppConfig::default())
                    .context("Failed to serialize default configuration")?,
            )
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("PAYOPS").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.window.capacity == 0 {
            anyhow::bail!("window.capacity must be at least 1");
        }
        if self.impact.recent_slice == 0 {
            anyhow::bail!("impact.recent_slice must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.detection.failure_rate_threshold) {
            anyhow::bail!(
                "detection.failure_rate_threshold must be within [0, 1], got {}",
                self.detection.failure_rate_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.decision.confidence_threshold) {
            anyhow::bail!(
                "decision.confidence_threshold must be within [0, 1], got {}",
                self.decision.confidence_threshold
            );
        }
        if self.oracle.timeout_ms == 0 {
            anyhow::bail!("oracle.timeout_ms must be positive");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                pace_ms: 500,
                seed: None,
            },
            window: WindowConfig { capacity: 50 },
            detection: DetectionConfig {
                failure_rate_threshold: 0.30,
                latency_threshold_ms: 1000.0,
                latency_placeholder_failure_rate: 0.05,
            },
            decision: DecisionConfig {
                confidence_threshold: 0.70,
                reroute_target: "SBI".to_string(),
            },
            oracle: OracleConfig {
                provider: OracleProvider::Ollama,
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout_ms: 30_000,
            },
            impact: ImpactConfig {
                recent_slice: 10,
                scope: ImpactScope::Window,
                auto_clear_after: None,
            },
            timeline: TimelineConfig {
                max_entries: None,
                render_tail: 7,
            },
            nats: NatsConfig {
                enabled: false,
                url: "nats://localhost:4222".to_string(),
                decision_subject: "payops.decisions".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
