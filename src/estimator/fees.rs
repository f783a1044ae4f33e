//! Fee schedule and estimation result
//!
//! All fee math is integer arithmetic in sun and always rounds up: an
//! underestimated fee fails on-chain, an overestimated one only leaves a
//! small surplus. The fee limit factor is held in basis points so that
//! `ceil(x * 1.1)` is exact instead of inheriting binary float error.

use serde::{Deserialize, Serialize};

use crate::config::FeeConfig;
use crate::types::{AccountResourceSnapshot, Sun};

/// Basis points in 1.0
pub const FACTOR_SCALE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Sun per missing energy unit
    pub energy_unit_price: Sun,
    /// Sun per bandwidth byte
    pub bandwidth_unit_price: Sun,
    /// Extra bytes added to measured sizes
    pub bandwidth_slack: u64,
    /// Fee limit factor in basis points (1.1 == 11_000)
    pub fee_limit_factor_bps: u64,
    /// Bandwidth fee used when the size cannot be measured
    pub default_bandwidth_fee: Sun,
}

impl FeeSchedule {
    pub fn from_config(config: &FeeConfig) -> Self {
        Self {
            energy_unit_price: config.energy_unit_price,
            bandwidth_unit_price: config.bandwidth_unit_price,
            bandwidth_slack: config.bandwidth_slack,
            fee_limit_factor_bps: (config.fee_limit_factor * FACTOR_SCALE as f64).round() as u64,
            default_bandwidth_fee: config.default_bandwidth_fee,
        }
    }

    /// `ceil(amount * fee_limit_factor)`
    pub fn apply_fee_limit_factor(&self, amount: Sun) -> Sun {
        let scaled = amount as u128 * self.fee_limit_factor_bps as u128;
        let rounded = scaled.div_ceil(FACTOR_SCALE as u128);
        u64::try_from(rounded).unwrap_or(u64::MAX)
    }

    /// Sun burned for the energy the account cannot cover itself
    pub fn energy_fee(&self, energy_required: u64, energy_available: u64) -> Sun {
        energy_required
            .saturating_sub(energy_available)
            .saturating_mul(self.energy_unit_price)
    }

    /// Zero when the account's bandwidth covers the transaction
    pub fn bandwidth_fee(&self, bandwidth_required: u64, bandwidth_available: u64) -> Sun {
        if bandwidth_available >= bandwidth_required {
            return 0;
        }
        let bytes = bandwidth_required.saturating_add(self.bandwidth_slack);
        self.apply_fee_limit_factor(bytes.saturating_mul(self.bandwidth_unit_price))
    }

    pub fn total_fee(&self, energy_fee: Sun, bandwidth_fee: Sun) -> Sun {
        self.apply_fee_limit_factor(energy_fee.saturating_add(bandwidth_fee))
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::from_config(&FeeConfig::default())
    }
}

/// Measured bandwidth need of the sample transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthMeasure {
    Measured(u64),
    /// Size could not be measured; the default fee applies
    Unavailable,
}

/// Immutable outcome of one estimation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub energy_required: u64,
    pub energy_available: u64,
    /// `max(energy_required - energy_available, 0)`
    pub energy_lack: u64,
    /// Signed difference, negative when the account has spare energy
    pub energy_shortfall: i64,
    pub energy_fee: Sun,
    pub bandwidth_required: u64,
    pub bandwidth_available: u64,
    pub bandwidth_fee: Sun,
    /// True when `bandwidth_fee` is the configured default
    pub bandwidth_fee_estimated: bool,
    pub total_fee: Sun,
    /// False when the owner account does not exist on-chain
    pub owner_found: bool,
}

impl EstimationResult {
    /// Combine simulated energy, a fresh snapshot and the measured size
    pub fn compute(
        schedule: &FeeSchedule,
        energy_required: u64,
        snapshot: &AccountResourceSnapshot,
        bandwidth: BandwidthMeasure,
        owner_found: bool,
    ) -> Self {
        let energy_available = snapshot.available_energy();
        let energy_fee = schedule.energy_fee(energy_required, energy_available);
        let bandwidth_available = snapshot.available_bandwidth();

        let (bandwidth_required, bandwidth_fee, bandwidth_fee_estimated) = match bandwidth {
            BandwidthMeasure::Measured(bytes) => {
                (bytes, schedule.bandwidth_fee(bytes, bandwidth_available), false)
            }
            BandwidthMeasure::Unavailable => (0, schedule.default_bandwidth_fee, true),
        };

        Self {
            energy_required,
            energy_available,
            energy_lack: energy_required.saturating_sub(energy_available),
            energy_shortfall: snapshot.energy_shortfall(energy_required),
            energy_fee,
            bandwidth_required,
            bandwidth_available,
            bandwidth_fee,
            bandwidth_fee_estimated,
            total_fee: schedule.total_fee(energy_fee, bandwidth_fee),
            owner_found,
        }
    }

    /// The sender cannot cover the energy and a rental is worth considering
    pub fn needs_rental(&self) -> bool {
        self.energy_lack > 0
    }

    pub fn bandwidth_shortfall(&self) -> bool {
        !self.bandwidth_fee_estimated && self.bandwidth_required > self.bandwidth_available
    }
}
