//! TRON resource and fee estimation
//!
//! The estimator is split into focused modules:
//! - **simulator**: energy from a constant-contract dry run
//! - **sizer**: signed wire size of a sample transaction (bandwidth)
//! - **fees**: fee schedule and the immutable [`EstimationResult`]
//!
//! [`FeeEstimator::estimate`] runs them in order: simulate, read a fresh
//! resource snapshot, measure the sample transaction, then price energy and
//! bandwidth.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub mod fees;
pub mod simulator;
pub mod sizer;

pub use fees::{BandwidthMeasure, EstimationResult, FeeSchedule};
pub use simulator::ResourceSimulator;
pub use sizer::{SizingError, TransactionSizer};

use crate::chain::{ChainError, ChainResourceProvider, ContractCall};
use crate::config::FeeConfig;
use crate::errors::PlannerError;
use crate::metrics::metrics;
use crate::tron::abi::{self, Trc20Method};
use crate::types::{AccountResourceSnapshot, Address};

/// What to estimate: a TRC20 `(address, uint256)` call from `owner`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    pub owner: Address,
    pub contract: Address,
    pub method: Trc20Method,
    pub recipient: Address,
    /// Token amount in smallest units
    pub amount: u64,
}

#[derive(Clone)]
pub struct FeeEstimator {
    provider: Arc<dyn ChainResourceProvider>,
    simulator: ResourceSimulator,
    sizer: TransactionSizer,
    schedule: FeeSchedule,
}

impl FeeEstimator {
    pub fn new(provider: Arc<dyn ChainResourceProvider>, config: &FeeConfig) -> Self {
        Self {
            simulator: ResourceSimulator::new(Arc::clone(&provider), config.new_account_energy),
            provider,
            sizer: TransactionSizer::new(),
            schedule: FeeSchedule::from_config(config),
        }
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub async fn estimate(&self, request: &EstimateRequest) -> Result<EstimationResult, PlannerError> {
        let started = Instant::now();
        let result = self.run(request).await;

        let m = metrics();
        m.estimation_latency.observe(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => m.estimations_total.inc(),
            Err(err) => {
                m.estimation_failures_total.inc();
                warn!(owner = %request.owner, error = %err, category = err.category(), "Estimation failed");
            }
        }
        result
    }

    async fn run(&self, request: &EstimateRequest) -> Result<EstimationResult, PlannerError> {
        let call = abi::trc20_call(
            request.method,
            &request.owner,
            &request.contract,
            &request.recipient,
            request.amount,
        )?;

        let energy_required = self.simulator.simulate(&call).await?;
        let (snapshot, owner_found) = self.fresh_snapshot(&request.owner).await?;
        let bandwidth = self.measure_bandwidth(&call).await?;

        let result = EstimationResult::compute(
            &self.schedule,
            energy_required,
            &snapshot,
            bandwidth,
            owner_found,
        );
        info!(
            owner = %request.owner,
            energy_required = result.energy_required,
            energy_available = result.energy_available,
            energy_lack = result.energy_lack,
            bandwidth_required = result.bandwidth_required,
            bandwidth_available = result.bandwidth_available,
            total_fee = result.total_fee,
            "Estimation complete"
        );
        Ok(result)
    }

    /// A missing account has no resources; anything else propagates
    async fn fresh_snapshot(
        &self,
        owner: &Address,
    ) -> Result<(AccountResourceSnapshot, bool), PlannerError> {
        match self.provider.read_account_resources(owner).await {
            Ok(snapshot) => Ok((snapshot, true)),
            Err(ChainError::AccountNotFound { .. }) => {
                warn!(owner = %owner, "Owner account not found, treating resources as zero");
                Ok((AccountResourceSnapshot::empty(), false))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Only missing or unreadable data falls back to the default fee
    async fn measure_bandwidth(&self, call: &ContractCall) -> Result<BandwidthMeasure, PlannerError> {
        let sample = match self.provider.build_sample_transaction(call).await {
            Ok(sample) => sample,
            Err(err @ (ChainError::AccountNotFound { .. } | ChainError::Decode(_))) => {
                warn!(error = %err, "Sample transaction unavailable, using default bandwidth fee");
                metrics().bandwidth_fee_fallbacks.inc();
                return Ok(BandwidthMeasure::Unavailable);
            }
            Err(err) => return Err(err.into()),
        };

        match self.sizer.size_of(&sample) {
            Ok(bytes) => Ok(BandwidthMeasure::Measured(bytes)),
            Err(err) => {
                warn!(error = %err, "Sample transaction unmeasurable, using default bandwidth fee");
                metrics().bandwidth_fee_fallbacks.inc();
                Ok(BandwidthMeasure::Unavailable)
            }
        }
    }
}
