use std::sync::Arc;
use tracing::{debug, warn};

use crate::chain::{ChainResourceProvider, ContractCall};
use crate::errors::PlannerError;
use crate::metrics::metrics;

/// Energy estimate from a constant (read-only) contract call
///
/// A TRC20 transfer to an address that has never held the token reverts in
/// the dry run even though the real transfer succeeds; that revert yields
/// the configured new-account energy instead of an error.
#[derive(Clone)]
pub struct ResourceSimulator {
    provider: Arc<dyn ChainResourceProvider>,
    fallback_energy: u64,
}

impl ResourceSimulator {
    pub fn new(provider: Arc<dyn ChainResourceProvider>, fallback_energy: u64) -> Self {
        Self {
            provider,
            fallback_energy,
        }
    }

    pub fn fallback_energy(&self) -> u64 {
        self.fallback_energy
    }

    pub async fn simulate(&self, call: &ContractCall) -> Result<u64, PlannerError> {
        match self.provider.simulate_contract_call(call).await {
            Ok(energy_used) => {
                debug!(
                    contract = %call.contract,
                    method = %call.method_signature,
                    energy_used,
                    "Dry run completed"
                );
                Ok(energy_used)
            }
            Err(err) if err.is_new_account_revert() => {
                warn!(
                    contract = %call.contract,
                    fallback_energy = self.fallback_energy,
                    "Dry run reverted, assuming new-account transfer cost"
                );
                metrics().simulation_fallbacks.inc();
                Ok(self.fallback_energy)
            }
            Err(source) => Err(PlannerError::SimulationFailed { source }),
        }
    }
}
