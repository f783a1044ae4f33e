//! Observability module for correlation and plan-level logging

use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

use crate::types::{Address, Sun};

/// Correlation ID for tracking one planning pass across components
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structured logger for transfer planning events
///
/// Every event carries the plan's correlation id so that estimation, rental
/// and report lines of one pass can be grouped.
#[derive(Debug, Clone)]
pub struct PlanLogger {
    correlation_id: CorrelationId,
}

impl PlanLogger {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Span entered for the whole pass; nested events inherit its fields
    pub fn span(&self, sender: &Address, recipient: &Address) -> Span {
        tracing::info_span!(
            "plan",
            correlation_id = %self.correlation_id,
            sender = %sender,
            recipient = %recipient
        )
    }

    pub fn log_balance_check(&self, balance: u64, amount: u64, passed: bool) {
        if passed {
            tracing::info!(
                correlation_id = %self.correlation_id,
                balance,
                amount,
                "Sender balance check passed"
            );
        } else {
            tracing::warn!(
                correlation_id = %self.correlation_id,
                balance,
                amount,
                "Sender balance check failed"
            );
        }
    }

    pub fn log_recipient(&self, native: Option<u64>, token: u64, risky: bool, history: usize) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            native_balance = ?native,
            token_balance = token,
            risky,
            history,
            "Recipient checked"
        );
    }

    pub fn log_estimate(&self, energy_lack: u64, total_fee: Sun) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            energy_lack,
            total_fee,
            "Fees estimated"
        );
    }

    pub fn log_outcome(&self, outcome: &str) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            outcome = %outcome,
            "Plan finished"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            message = %message,
            "Warning"
        );
    }
}

impl Default for PlanLogger {
    fn default() -> Self {
        Self::new(CorrelationId::new())
    }
}
