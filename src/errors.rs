//! Error types for the planning pipeline
//!
//! [`PlannerError`] is what estimation, rental and planning calls return.
//! The first five variants are the domain outcomes a caller branches on; the
//! rest wrap collaborator failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::chain::ChainError;
use crate::rental::{RentalError, RentalOutcome};

/// Why the coordinator stopped waiting for rented energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonReason {
    /// The caller's cancel signal fired
    Cancelled,
    /// The configured maximum wait elapsed
    TimedOut,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonReason::Cancelled => f.write_str("cancelled"),
            AbandonReason::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Dry run failed for a reason other than the new-account revert
    #[error("Simulation failed: {source}")]
    SimulationFailed {
        #[source]
        source: ChainError,
    },

    /// Account does not exist on-chain and could not be treated as empty
    #[error("Address not found: {address}")]
    AddressNotFound { address: String },

    /// The rental market returned no order identifier
    #[error("Rental provider rejected order for {energy} energy")]
    ProviderRejected { energy: u64 },

    /// Polling stopped before the rented energy arrived; the order may still fill
    #[error("Stopped waiting for energy on order {order_id} ({reason}): observed {observed_energy} of {requested_energy}")]
    EnergyWaitAbandoned {
        order_id: String,
        reason: AbandonReason,
        observed_energy: u64,
        requested_energy: u64,
        /// Quote, order and state history up to the point the wait stopped
        rental: Box<RentalOutcome>,
    },

    /// Sender balance does not cover the transfer amount
    #[error("Insufficient funds: balance {balance} does not cover amount {amount}")]
    InsufficientFunds { balance: u64, amount: u64 },

    #[error("Chain error: {0}")]
    Chain(ChainError),

    #[error("Rental market error: {0}")]
    Rental(#[from] RentalError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation; indicates a bug
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ChainError> for PlannerError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::AccountNotFound { address } => PlannerError::AddressNotFound { address },
            other => PlannerError::Chain(other),
        }
    }
}

impl PlannerError {
    /// Check if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::SimulationFailed { source } => source.is_retryable(),
            PlannerError::Chain(err) => err.is_retryable(),
            PlannerError::Rental(err) => err.is_retryable(),

            PlannerError::AddressNotFound { .. } => false,
            PlannerError::ProviderRejected { .. } => false,
            // the order is external state; re-polling is the caller's call
            PlannerError::EnergyWaitAbandoned { .. } => false,
            PlannerError::InsufficientFunds { .. } => false,
            PlannerError::Configuration(_) => false,
            PlannerError::Internal(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            PlannerError::SimulationFailed { .. } => "simulation",
            PlannerError::AddressNotFound { .. } => "address_not_found",
            PlannerError::ProviderRejected { .. } => "provider_rejected",
            PlannerError::EnergyWaitAbandoned { .. } => "energy_wait_abandoned",
            PlannerError::InsufficientFunds { .. } => "insufficient_funds",
            PlannerError::Chain(_) => "chain",
            PlannerError::Rental(_) => "rental",
            PlannerError::Configuration(_) => "config",
            PlannerError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::RentalState;
    use std::time::Duration;

    #[test]
    fn test_account_not_found_maps_to_address_not_found() {
        let err: PlannerError = ChainError::AccountNotFound {
            address: "TA4Wt1DUCqz6YegbnsmqsWC5uUfbdBqPxm".to_string(),
        }
        .into();
        assert!(matches!(err, PlannerError::AddressNotFound { .. }));
        assert_eq!(err.category(), "address_not_found");

        let err: PlannerError = ChainError::Decode("bad".to_string()).into();
        assert!(matches!(err, PlannerError::Chain(ChainError::Decode(_))));
    }

    #[test]
    fn test_retryability() {
        let transient = PlannerError::SimulationFailed {
            source: ChainError::Timeout {
                endpoint: "node".to_string(),
                timeout_ms: 1000,
            },
        };
        assert!(transient.is_retryable());

        assert!(!PlannerError::ProviderRejected { energy: 32_000 }.is_retryable());
        assert!(!PlannerError::InsufficientFunds { balance: 50, amount: 50 }.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PlannerError::EnergyWaitAbandoned {
            order_id: "ord-1".to_string(),
            reason: AbandonReason::TimedOut,
            observed_energy: 1_000,
            requested_energy: 32_000,
            rental: Box::new(RentalOutcome {
                state: RentalState::TimedOut,
                history: vec![RentalState::PollingForEnergy, RentalState::TimedOut],
                quote: None,
                order: None,
                waited: Duration::from_secs(60),
                observed_energy: 1_000,
            }),
        };
        assert_eq!(
            err.to_string(),
            "Stopped waiting for energy on order ord-1 (timed out): observed 1000 of 32000"
        );
    }
}
