//! Type definitions for the payment operations monitor

pub mod decision;
pub mod hypothesis;
pub mod signal;
pub mod transaction;

pub use decision::{ActiveIntervention, Decision, DecisionStatus};
pub use hypothesis::{Hypothesis, Intervention};
pub use signal::{AnomalyKind, AnomalySignal};
pub use transaction::{PaymentMethod, Transaction, TransactionStatus};
