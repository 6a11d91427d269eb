//! Detection, reasoning, decision and impact components

pub mod detector;
pub mod engine;
pub mod heuristic;
pub mod impact;
pub mod ollama;
pub mod oracle;
pub mod session;
pub mod timeline;
pub mod window;

pub use detector::AnomalyDetector;
pub use engine::DecisionEngine;
pub use heuristic::HeuristicOracle;
pub use impact::{ImpactEntry, ImpactReport, ImpactTracker};
pub use ollama::OllamaOracle;
pub use oracle::{OracleClient, OracleError, OracleRequest, RootCauseOracle};
pub use session::{CycleReport, IncidentSummary, Session};
pub use timeline::{Timeline, TimelineEntry};
pub use window::TransactionWindow;

use crate::config::{OracleConfig, OracleProvider};

/// Build the oracle selected in configuration
pub fn oracle_from_config(config: &OracleConfig) -> Box<dyn RootCauseOracle> {
    match config.provider {
        OracleProvider::Ollama => Box::new(OllamaOracle::new(config)),
        OracleProvider::Heuristic => Box::new(HeuristicOracle::new()),
    }
}
