//! Chain collaborator capabilities
//!
//! The estimator, rental coordinator and planner never talk to a node
//! directly. They go through [`ChainResourceProvider`], implemented once per
//! chain family and selected at runtime through the [`ProviderRegistry`].

use async_trait::async_trait;

use crate::types::{AccountResourceSnapshot, Address, NetworkId, Token};

pub mod errors;
pub mod registry;

pub use errors::ChainError;
pub use registry::ProviderRegistry;

/// A contract method invocation, ABI-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub owner: Address,
    pub contract: Address,
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub method_signature: String,
    /// ABI-encoded arguments without the selector
    pub params: Vec<u8>,
}

/// An unsigned transaction plus the number of signatures it will carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTransaction {
    /// Serialized `raw_data` payload
    pub raw_data: Vec<u8>,
    pub signature_count: usize,
}

/// Resource and balance capability of one chain
///
/// All methods are single round-trips with no internal retry; callers may
/// wrap them in their own retry policy.
#[async_trait]
pub trait ChainResourceProvider: Send + Sync {
    fn network(&self) -> NetworkId;

    /// Fails with [`ChainError::AccountNotFound`] for unactivated accounts
    async fn read_account_resources(
        &self,
        address: &Address,
    ) -> Result<AccountResourceSnapshot, ChainError>;

    /// Dry-run a call against current state and return the energy it used
    ///
    /// Fails with [`ChainError::ContractReverted`] when the VM reverts.
    async fn simulate_contract_call(&self, call: &ContractCall) -> Result<u64, ChainError>;

    /// Build the transaction `call` would produce, for size measurement only
    async fn build_sample_transaction(
        &self,
        call: &ContractCall,
    ) -> Result<SampleTransaction, ChainError>;

    /// Native coin balance in smallest units
    async fn native_balance(&self, address: &Address) -> Result<u64, ChainError>;

    /// Token balance in the token's smallest units
    async fn token_balance(&self, address: &Address, token: &Token) -> Result<u64, ChainError>;
}
