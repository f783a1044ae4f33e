//! Energy rental workflow
//!
//! Quote, confirm, order, then poll the owner's energy until it covers the
//! requirement. The wait is bounded by `max_wait` and can be abandoned
//! through a [`CancelSignal`]; abandoning never touches the placed order.
//! A cancel that fires before the order is placed ends the run as declined,
//! so no order is created.
//!
//! One coordinator run per owner address at a time is a caller
//! responsibility; nothing here locks on the address.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::cancel::CancelSignal;
use super::market::{EnergyRentalMarket, RentalQuote};
use super::order::{RentalApproval, RentalOrder, RentalState, RentalStatus, StateTrace};
use crate::chain::{ChainError, ChainResourceProvider};
use crate::config::RentalConfig;
use crate::errors::{AbandonReason, PlannerError};
use crate::estimator::EstimationResult;
use crate::metrics::metrics;
use crate::types::Address;

/// How a coordinator run ended when it did not fail
#[derive(Debug, Clone, Serialize)]
pub struct RentalOutcome {
    /// Final state: `NoShortfall`, `UserDeclined` or `Fulfilled`, or
    /// `TimedOut`/`PollingForEnergy` inside an abandoned wait
    pub state: RentalState,
    /// Every state visited, in order
    pub history: Vec<RentalState>,
    pub quote: Option<RentalQuote>,
    pub order: Option<RentalOrder>,
    /// Time spent polling for energy
    pub waited: Duration,
    /// Available energy at the last successful read
    pub observed_energy: u64,
}

impl RentalOutcome {
    fn finished(trace: StateTrace) -> Self {
        Self {
            state: trace.current(),
            history: trace.into_states(),
            quote: None,
            order: None,
            waited: Duration::ZERO,
            observed_energy: 0,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state == RentalState::Fulfilled
    }
}

enum WaitResult {
    Arrived { observed: u64 },
    Abandoned { reason: AbandonReason, observed: u64 },
}

#[derive(Clone)]
pub struct EnergyRentalCoordinator {
    provider: Arc<dyn ChainResourceProvider>,
    market: Arc<dyn EnergyRentalMarket>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl EnergyRentalCoordinator {
    pub fn new(
        provider: Arc<dyn ChainResourceProvider>,
        market: Arc<dyn EnergyRentalMarket>,
        config: &RentalConfig,
    ) -> Self {
        Self {
            provider,
            market,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Rent `estimate.energy_required` energy for `owner` if it has a shortfall
    pub async fn acquire(
        &self,
        owner: &Address,
        estimate: &EstimationResult,
        approval: &dyn RentalApproval,
        mut cancel: CancelSignal,
    ) -> Result<RentalOutcome, PlannerError> {
        if !estimate.needs_rental() {
            debug!(owner = %owner, "Energy covered, no rental needed");
            return Ok(RentalOutcome::finished(StateTrace::start(RentalState::NoShortfall)));
        }

        let energy = estimate.energy_required;
        let mut trace = StateTrace::start(RentalState::QuotePending);

        let quote = self
            .market
            .get_energy_rental_quote(energy)
            .await
            .inspect_err(|e| {
                metrics().rental_failures_total.inc();
                warn!(owner = %owner, energy, error = %e, "Rental quote failed");
            })?;
        self.advance(&mut trace, RentalState::AwaitingUserConfirmation)?;
        info!(owner = %owner, energy, price = quote.price, period = %quote.period, "Rental quoted");

        let approved = tokio::select! {
            biased;

            _ = cancel.cancelled() => false,
            approved = approval.approve(&quote) => approved && !cancel.is_cancelled(),
        };
        if !approved {
            self.advance(&mut trace, RentalState::UserDeclined)?;
            if cancel.is_cancelled() {
                info!(owner = %owner, "Cancelled before ordering, no rental placed");
            } else {
                info!(owner = %owner, "Rental declined");
            }
            let mut outcome = RentalOutcome::finished(trace);
            outcome.quote = Some(quote);
            return Ok(outcome);
        }

        self.advance(&mut trace, RentalState::OrderPlaced)?;
        let placed = self
            .market
            .place_energy_rental_order(owner, energy)
            .await
            .inspect_err(|e| {
                metrics().rental_failures_total.inc();
                warn!(owner = %owner, energy, error = %e, "Rental order failed");
            })?;
        let Some(order_id) = placed else {
            self.advance(&mut trace, RentalState::ProviderFailed)?;
            metrics().rental_failures_total.inc();
            warn!(owner = %owner, energy, "Rental provider returned no order id");
            return Err(PlannerError::ProviderRejected { energy });
        };
        metrics().rental_orders_total.inc();
        let mut order = RentalOrder::new(order_id, energy, owner.clone());

        self.advance(&mut trace, RentalState::PollingForEnergy)?;
        info!(
            owner = %owner,
            order_id = %order.order_id,
            poll_interval_secs = self.poll_interval.as_secs(),
            max_wait_secs = self.max_wait.as_secs(),
            "Waiting for rented energy"
        );

        let started = Instant::now();
        metrics().active_rentals.inc();
        let result = self.wait_for_energy(owner, energy, &mut cancel).await;
        metrics().active_rentals.dec();
        let waited = started.elapsed();

        match result {
            WaitResult::Arrived { observed } => {
                self.advance(&mut trace, RentalState::Fulfilled)?;
                order.status = RentalStatus::Fulfilled;
                metrics().rental_wait.observe(waited.as_secs_f64());
                info!(
                    owner = %owner,
                    order_id = %order.order_id,
                    observed_energy = observed,
                    waited_secs = waited.as_secs(),
                    "Rented energy arrived"
                );
                Ok(RentalOutcome {
                    state: trace.current(),
                    history: trace.into_states(),
                    quote: Some(quote),
                    order: Some(order),
                    waited,
                    observed_energy: observed,
                })
            }
            WaitResult::Abandoned { reason, observed } => {
                if reason == AbandonReason::TimedOut {
                    self.advance(&mut trace, RentalState::TimedOut)?;
                    order.status = RentalStatus::Failed;
                }
                metrics().rental_failures_total.inc();
                warn!(
                    owner = %owner,
                    order_id = %order.order_id,
                    reason = %reason,
                    observed_energy = observed,
                    requested_energy = energy,
                    "Stopped waiting for rented energy, order left in place"
                );
                Err(PlannerError::EnergyWaitAbandoned {
                    order_id: order.order_id.clone(),
                    reason,
                    observed_energy: observed,
                    requested_energy: energy,
                    rental: Box::new(RentalOutcome {
                        state: trace.current(),
                        history: trace.into_states(),
                        quote: Some(quote),
                        order: Some(order),
                        waited,
                        observed_energy: observed,
                    }),
                })
            }
        }
    }

    /// Sleep-then-recheck until energy arrives, time runs out or the caller cancels
    async fn wait_for_energy(
        &self,
        owner: &Address,
        required: u64,
        cancel: &mut CancelSignal,
    ) -> WaitResult {
        let started = Instant::now();
        let mut observed = 0;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return WaitResult::Abandoned { reason: AbandonReason::Cancelled, observed };
                }

                _ = sleep(self.poll_interval) => {}
            }

            metrics().rental_polls_total.inc();
            let read = tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    return WaitResult::Abandoned { reason: AbandonReason::Cancelled, observed };
                }

                read = self.provider.read_account_resources(owner) => read,
            };
            match read {
                Ok(snapshot) => observed = snapshot.available_energy(),
                Err(ChainError::AccountNotFound { .. }) => observed = 0,
                Err(err) => {
                    warn!(owner = %owner, error = %err, "Energy check failed, retrying next interval");
                }
            }
            debug!(owner = %owner, observed_energy = observed, required, "Energy check");

            if observed >= required {
                return WaitResult::Arrived { observed };
            }
            if started.elapsed() >= self.max_wait {
                return WaitResult::Abandoned { reason: AbandonReason::TimedOut, observed };
            }
        }
    }

    fn advance(&self, trace: &mut StateTrace, next: RentalState) -> Result<(), PlannerError> {
        let from = trace.current();
        if trace.advance(next) {
            debug!(from = %from, to = %next, "Rental state transition");
            Ok(())
        } else {
            Err(PlannerError::Internal(format!(
                "illegal rental transition {from} -> {next}"
            )))
        }
    }
}
