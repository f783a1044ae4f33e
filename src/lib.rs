//! tronfee - TRON resource and fee planning library
//!
//! Estimates the energy and bandwidth a TRC20 transfer will consume, prices
//! them in sun, rents energy from a third-party market when the sender lacks
//! it, and sequences the pre-transfer checks into a go/no-go plan.

pub mod chain;
pub mod config;
pub mod errors;
pub mod estimator;
pub mod metrics;
pub mod observability;
pub mod planner;
pub mod rental;
pub mod tron;
pub mod types;

// Re-export commonly used types
pub use chain::{ChainError, ChainResourceProvider, ProviderRegistry};
pub use config::Config;
pub use errors::{AbandonReason, PlannerError};
pub use estimator::{EstimateRequest, EstimationResult, FeeEstimator};
pub use planner::{PlanOptions, PlanOutcome, TransferPlan, TransferPlanner, TransferRequest};
pub use rental::{EnergyRentalCoordinator, EnergyRentalMarket, RentalError};
pub use types::{AccountResourceSnapshot, Address, NetworkId, Token};

#[cfg(test)]
mod tests {
    mod fee_estimator_tests;
    mod fee_property_tests;
    mod registry_tests;
    mod rental_coordinator_tests;
    mod test_helpers;
    mod transfer_planner_tests;
}
