//! Transfer planning
//!
//! [`TransferPlanner::plan`] sequences the read-only checks (sender balance,
//! recipient balances, history and risk), estimates fees and, when the sender
//! lacks energy and the pass is not a dry run, drives the rental workflow.
//! The result is always a [`TransferPlan`] whose [`PlanOutcome`] tells the
//! caller whether to go ahead and, if not, why.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{warn, Instrument};

pub mod history;
pub mod report;

pub use history::{recent_transfers, HistoryEntry, RecipientActivity, TokenTransfer, TransferHistorySource};
pub use report::payment_link;

use crate::chain::{ChainError, ChainResourceProvider};
use crate::config::PlannerConfig;
use crate::errors::{AbandonReason, PlannerError};
use crate::estimator::{EstimateRequest, EstimationResult, FeeEstimator};
use crate::metrics::metrics;
use crate::observability::{CorrelationId, PlanLogger};
use crate::rental::{
    AutoApprove, CancelSignal, EnergyRentalCoordinator, RentalApproval, RentalOutcome, RentalState,
};
use crate::tron::Trc20Method;
use crate::types::{Address, NetworkId, Token};

/// A token transfer to plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: Address,
    pub recipient: Address,
    pub token: Token,
    /// Amount in the token's smallest units
    pub amount: u64,
}

/// Per-pass options
#[derive(Clone)]
pub struct PlanOptions {
    /// Run every check and estimate but never place an order
    pub dry_run: bool,
    pub approval: Arc<dyn RentalApproval>,
    pub cancel: CancelSignal,
}

impl PlanOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            approval: Arc::new(AutoApprove),
            cancel: CancelSignal::never(),
        }
    }

    pub fn live(approval: Arc<dyn RentalApproval>, cancel: CancelSignal) -> Self {
        Self {
            dry_run: false,
            approval,
            cancel,
        }
    }
}

/// Informational findings that do not stop the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum PlanFlag {
    SenderAccountNotFound,
    RecipientAccountNotFound,
    RecipientRisky,
    NoTransferHistory,
    HistoryUnavailable { reason: String },
    BandwidthShortfall,
    /// Bandwidth could not be measured; the default fee was used
    BandwidthFeeEstimated,
}

/// Why a plan stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    InsufficientFunds {
        balance: u64,
        amount: u64,
    },
    SimulationFailed {
        message: String,
    },
    AddressNotFound {
        address: String,
    },
    ProviderRejected {
        energy: u64,
    },
    /// The order may still be filled later
    EnergyWaitAbandoned {
        order_id: String,
        abandoned: AbandonReason,
        observed_energy: u64,
        requested_energy: u64,
    },
    RentalDeclined,
}

impl AbortReason {
    /// Domain errors that end a plan; infrastructure errors return `None`
    pub fn from_error(err: &PlannerError) -> Option<Self> {
        match err {
            PlannerError::SimulationFailed { source } => Some(AbortReason::SimulationFailed {
                message: source.to_string(),
            }),
            PlannerError::AddressNotFound { address } => Some(AbortReason::AddressNotFound {
                address: address.clone(),
            }),
            PlannerError::ProviderRejected { energy } => {
                Some(AbortReason::ProviderRejected { energy: *energy })
            }
            PlannerError::EnergyWaitAbandoned {
                order_id,
                reason,
                observed_energy,
                requested_energy,
                ..
            } => Some(AbortReason::EnergyWaitAbandoned {
                order_id: order_id.clone(),
                abandoned: *reason,
                observed_energy: *observed_energy,
                requested_energy: *requested_energy,
            }),
            PlannerError::InsufficientFunds { balance, amount } => {
                Some(AbortReason::InsufficientFunds {
                    balance: *balance,
                    amount: *amount,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::InsufficientFunds { balance, amount } => {
                write!(f, "insufficient funds: balance {balance} does not cover {amount}")
            }
            AbortReason::SimulationFailed { message } => write!(f, "simulation failed: {message}"),
            AbortReason::AddressNotFound { address } => write!(f, "address not found: {address}"),
            AbortReason::ProviderRejected { energy } => {
                write!(f, "rental provider rejected the order for {energy} energy")
            }
            AbortReason::EnergyWaitAbandoned {
                order_id,
                abandoned,
                observed_energy,
                requested_energy,
            } => write!(
                f,
                "energy wait {abandoned} on order {order_id} ({observed_energy} of {requested_energy})"
            ),
            AbortReason::RentalDeclined => f.write_str("energy rental declined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// All checks passed and the sender has the energy it needs
    Go { payment_link: Option<String> },
    /// Checks and estimation ran; nothing was ordered
    DryRun,
    Aborted { reason: AbortReason },
}

impl PlanOutcome {
    pub fn is_go(&self) -> bool {
        matches!(self, PlanOutcome::Go { .. })
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            PlanOutcome::Aborted { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanOutcome::Go { .. } => "go",
            PlanOutcome::DryRun => "dry_run",
            PlanOutcome::Aborted { .. } => "aborted",
        }
    }
}

/// Result of one planning pass; rebuilt every time, never cached
#[derive(Debug, Clone, Serialize)]
pub struct TransferPlan {
    pub correlation_id: CorrelationId,
    pub network: NetworkId,
    pub sender: Address,
    pub recipient: Address,
    pub token: Token,
    pub amount: u64,
    pub sender_balance: u64,
    /// `None` when the recipient account is not activated
    pub recipient_native_balance: Option<u64>,
    pub recipient_token_balance: Option<u64>,
    pub risky: bool,
    pub history: Vec<HistoryEntry>,
    pub estimate: Option<EstimationResult>,
    pub rental: Option<RentalOutcome>,
    pub flags: Vec<PlanFlag>,
    pub outcome: PlanOutcome,
    pub planned_at: DateTime<Utc>,
}

impl TransferPlan {
    fn new(network: NetworkId, request: &TransferRequest, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            network,
            sender: request.sender.clone(),
            recipient: request.recipient.clone(),
            token: request.token.clone(),
            amount: request.amount,
            sender_balance: 0,
            recipient_native_balance: None,
            recipient_token_balance: None,
            risky: false,
            history: Vec::new(),
            estimate: None,
            rental: None,
            flags: Vec::new(),
            outcome: PlanOutcome::DryRun,
            planned_at: Utc::now(),
        }
    }

    pub fn has_flag(&self, flag: &PlanFlag) -> bool {
        self.flags.contains(flag)
    }

    fn flag(&mut self, flag: PlanFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }
}

#[derive(Clone)]
pub struct TransferPlanner {
    provider: Arc<dyn ChainResourceProvider>,
    history: Arc<dyn TransferHistorySource>,
    estimator: FeeEstimator,
    coordinator: EnergyRentalCoordinator,
    config: PlannerConfig,
}

impl TransferPlanner {
    pub fn new(
        provider: Arc<dyn ChainResourceProvider>,
        history: Arc<dyn TransferHistorySource>,
        estimator: FeeEstimator,
        coordinator: EnergyRentalCoordinator,
        config: PlannerConfig,
    ) -> Self {
        Self {
            provider,
            history,
            estimator,
            coordinator,
            config,
        }
    }

    /// `balance > amount`, or `>=` when strictness is disabled
    pub fn balance_sufficient(&self, balance: u64, amount: u64) -> bool {
        if self.config.require_strictly_greater {
            balance > amount
        } else {
            balance >= amount
        }
    }

    /// Run one planning pass
    ///
    /// Domain failures (the ones a caller branches on) come back as an
    /// [`PlanOutcome::Aborted`] plan. Transport and decoding failures of the
    /// collaborators are returned as `Err`.
    pub async fn plan(
        &self,
        request: &TransferRequest,
        options: PlanOptions,
    ) -> Result<TransferPlan, PlannerError> {
        let logger = PlanLogger::default();
        let span = logger.span(&request.sender, &request.recipient);
        metrics().plans_total.inc();

        let result = self.run(request, options, &logger).instrument(span).await;
        match &result {
            Ok(plan) => {
                if !plan.outcome.is_go() && plan.outcome != PlanOutcome::DryRun {
                    metrics().plans_aborted.inc();
                }
                logger.log_outcome(plan.outcome.label());
            }
            Err(err) => logger.warn(&format!("plan failed: {err}")),
        }
        result
    }

    async fn run(
        &self,
        request: &TransferRequest,
        options: PlanOptions,
        logger: &PlanLogger,
    ) -> Result<TransferPlan, PlannerError> {
        let mut plan = TransferPlan::new(
            self.provider.network(),
            request,
            logger.correlation_id().clone(),
        );

        // sender balance first; a failure here costs no estimation
        plan.sender_balance = match self.provider.token_balance(&request.sender, &request.token).await {
            Ok(balance) => balance,
            Err(ChainError::AccountNotFound { .. }) => {
                plan.flag(PlanFlag::SenderAccountNotFound);
                0
            }
            Err(err) => return Err(err.into()),
        };
        let passed = self.balance_sufficient(plan.sender_balance, request.amount);
        logger.log_balance_check(plan.sender_balance, request.amount, passed);
        if !passed {
            plan.outcome = PlanOutcome::Aborted {
                reason: AbortReason::InsufficientFunds {
                    balance: plan.sender_balance,
                    amount: request.amount,
                },
            };
            return Ok(plan);
        }

        self.check_recipient(request, &mut plan).await?;
        logger.log_recipient(
            plan.recipient_native_balance,
            plan.recipient_token_balance.unwrap_or(0),
            plan.risky,
            plan.history.len(),
        );

        let estimate_request = EstimateRequest {
            owner: request.sender.clone(),
            contract: request.token.address.clone(),
            method: Trc20Method::Transfer,
            recipient: request.recipient.clone(),
            amount: request.amount,
        };
        let estimate = match self.estimator.estimate(&estimate_request).await {
            Ok(estimate) => estimate,
            Err(err) => return abort_or_fail(plan, err),
        };
        logger.log_estimate(estimate.energy_lack, estimate.total_fee);
        if !estimate.owner_found {
            plan.flag(PlanFlag::SenderAccountNotFound);
        }
        if estimate.bandwidth_fee_estimated {
            plan.flag(PlanFlag::BandwidthFeeEstimated);
        }
        if estimate.bandwidth_shortfall() {
            plan.flag(PlanFlag::BandwidthShortfall);
        }
        plan.estimate = Some(estimate);

        if options.dry_run {
            plan.outcome = PlanOutcome::DryRun;
            return Ok(plan);
        }

        let rental = match self
            .coordinator
            .acquire(&request.sender, &estimate, options.approval.as_ref(), options.cancel)
            .await
        {
            Ok(rental) => rental,
            Err(err) => return abort_or_fail(plan, err),
        };

        plan.outcome = if rental.state == RentalState::UserDeclined {
            PlanOutcome::Aborted {
                reason: AbortReason::RentalDeclined,
            }
        } else {
            let network = plan.network.network();
            PlanOutcome::Go {
                payment_link: payment_link(network, Some(&request.token), &request.recipient, request.amount),
            }
        };
        plan.rental = Some(rental);
        Ok(plan)
    }

    /// Recipient balances, history and risk; history failures only flag
    async fn check_recipient(
        &self,
        request: &TransferRequest,
        plan: &mut TransferPlan,
    ) -> Result<(), PlannerError> {
        plan.recipient_native_balance = match self.provider.native_balance(&request.recipient).await {
            Ok(balance) => Some(balance),
            Err(ChainError::AccountNotFound { .. }) => {
                plan.flag(PlanFlag::RecipientAccountNotFound);
                None
            }
            Err(err) => return Err(err.into()),
        };

        plan.recipient_token_balance = match self
            .provider
            .token_balance(&request.recipient, &request.token)
            .await
        {
            Ok(balance) => Some(balance),
            Err(ChainError::AccountNotFound { .. }) => Some(0),
            Err(err) => return Err(err.into()),
        };

        match self
            .history
            .recipient_activity(&request.sender, &request.recipient, &request.token)
            .await
        {
            Ok(activity) => {
                plan.risky = activity.risky;
                plan.history = recent_transfers(
                    &activity.transfers,
                    &request.recipient,
                    self.config.history_limit,
                    plan.planned_at,
                );
                if plan.risky {
                    plan.flag(PlanFlag::RecipientRisky);
                }
                if plan.history.is_empty() {
                    plan.flag(PlanFlag::NoTransferHistory);
                }
            }
            Err(err) => {
                warn!(recipient = %request.recipient, error = %err, "Transfer history unavailable");
                plan.flag(PlanFlag::HistoryUnavailable {
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn abort_or_fail(mut plan: TransferPlan, err: PlannerError) -> Result<TransferPlan, PlannerError> {
    match AbortReason::from_error(&err) {
        Some(reason) => {
            if let PlannerError::EnergyWaitAbandoned { rental, .. } = err {
                plan.rental = Some(*rental);
            }
            plan.outcome = PlanOutcome::Aborted { reason };
            Ok(plan)
        }
        None => Err(err),
    }
}
