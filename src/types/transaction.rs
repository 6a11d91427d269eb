//! Transaction records produced by the payment feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement outcome of a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Payment rail used for the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Upi,
    CreditCard,
    NetBanking,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Upi,
        PaymentMethod::CreditCard,
        PaymentMethod::NetBanking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::NetBanking => "NET_BANKING",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A payment routed through a downstream counterparty.
///
/// Records are immutable once produced by the feed; the monitor only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Short transaction identifier
    #[serde(rename = "transaction_id")]
    pub id: String,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Downstream bank the payment was routed through
    #[serde(rename = "bank")]
    pub counterparty: String,

    /// Payment rail
    pub method: PaymentMethod,

    /// Amount in major currency units
    pub amount: f64,

    /// Settlement outcome
    pub status: TransactionStatus,

    /// End-to-end latency in milliseconds
    pub latency_ms: u64,

    /// Error code reported by the counterparty on failure
    #[serde(default)]
    pub error_code: Option<String>,

    /// Number of retries already attempted
    #[serde(default)]
    pub retry_count: u32,
}

impl Transaction {
    /// Create a successful transaction with the required fields
    pub fn new(id: impl Into<String>, counterparty: impl Into<String>, method: PaymentMethod) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            counterparty: counterparty.into(),
            method,
            amount: 0.0,
            status: TransactionStatus::Success,
            latency_ms: 0,
            error_code: None,
            retry_count: 0,
        }
    }

    /// Mark the transaction as failed with the given error code
    pub fn failed(mut self, error_code: impl Into<String>) -> Self {
        self.status = TransactionStatus::Failed;
        self.error_code = Some(error_code.into());
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}
