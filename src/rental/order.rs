//! Rental order and the coordinator state graph
//!
//! ```text
//! NoShortfall
//! QuotePending -> AwaitingUserConfirmation -> OrderPlaced -> PollingForEnergy
//!                         |                        |              |
//!                    UserDeclined            ProviderFailed   Fulfilled | TimedOut
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::market::RentalQuote;
use crate::types::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    Pending,
    Fulfilled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentalState {
    NoShortfall,
    QuotePending,
    AwaitingUserConfirmation,
    OrderPlaced,
    PollingForEnergy,
    Fulfilled,
    TimedOut,
    UserDeclined,
    ProviderFailed,
}

impl RentalState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RentalState::NoShortfall
                | RentalState::Fulfilled
                | RentalState::TimedOut
                | RentalState::UserDeclined
                | RentalState::ProviderFailed
        )
    }

    /// Edges of the state graph
    pub fn can_transition_to(&self, next: RentalState) -> bool {
        use RentalState::*;
        matches!(
            (self, next),
            (QuotePending, AwaitingUserConfirmation)
                | (QuotePending, ProviderFailed)
                | (AwaitingUserConfirmation, OrderPlaced)
                | (AwaitingUserConfirmation, UserDeclined)
                | (OrderPlaced, PollingForEnergy)
                | (OrderPlaced, ProviderFailed)
                | (PollingForEnergy, Fulfilled)
                | (PollingForEnergy, TimedOut)
        )
    }
}

impl fmt::Display for RentalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RentalState::NoShortfall => "no shortfall",
            RentalState::QuotePending => "quote pending",
            RentalState::AwaitingUserConfirmation => "awaiting confirmation",
            RentalState::OrderPlaced => "order placed",
            RentalState::PollingForEnergy => "polling for energy",
            RentalState::Fulfilled => "fulfilled",
            RentalState::TimedOut => "timed out",
            RentalState::UserDeclined => "declined",
            RentalState::ProviderFailed => "provider failed",
        };
        f.write_str(name)
    }
}

/// Ordered record of visited states, rejecting edges outside the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTrace {
    states: Vec<RentalState>,
}

impl StateTrace {
    pub fn start(initial: RentalState) -> Self {
        Self {
            states: vec![initial],
        }
    }

    pub fn current(&self) -> RentalState {
        // never empty, seeded in start()
        self.states[self.states.len() - 1]
    }

    /// Returns false and leaves the trace untouched for an illegal edge
    pub fn advance(&mut self, next: RentalState) -> bool {
        if !self.current().can_transition_to(next) {
            return false;
        }
        self.states.push(next);
        true
    }

    pub fn states(&self) -> &[RentalState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<RentalState> {
        self.states
    }
}

/// An order placed with the market, owned by one coordinator run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalOrder {
    pub order_id: String,
    pub requested_energy: u64,
    pub target_address: Address,
    pub status: RentalStatus,
}

impl RentalOrder {
    pub fn new(order_id: String, requested_energy: u64, target_address: Address) -> Self {
        Self {
            order_id,
            requested_energy,
            target_address,
            status: RentalStatus::Pending,
        }
    }
}

/// Decides whether a quoted rental should be placed
#[async_trait]
pub trait RentalApproval: Send + Sync {
    async fn approve(&self, quote: &RentalQuote) -> bool;
}

/// Accepts every quote (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl RentalApproval for AutoApprove {
    async fn approve(&self, _quote: &RentalQuote) -> bool {
        true
    }
}
