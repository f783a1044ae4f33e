//! Error taxonomy for chain collaborators
//!
//! Every provider call (resource reads, dry runs, sample transactions,
//! balance lookups) fails with a [`ChainError`]. The variants carry enough
//! context to decide locally whether a failure can be recovered (new
//! accounts, known reverts) or has to be surfaced.

use thiserror::Error;

/// Revert message reported by the TVM when a constant call hits `REVERT`
pub const REVERT_OPCODE_MESSAGE: &str = "REVERT opcode executed";

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Network-level failure (connection refused, TLS, DNS)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    #[error("Timeout after {timeout_ms}ms (endpoint: {endpoint})")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// The node answered with an error status or an error payload
    #[error("RPC response error: {message} (endpoint: {endpoint}, code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<u16>,
    },

    /// The account has never been activated on-chain
    #[error("Account not found: {address}")]
    AccountNotFound { address: String },

    /// A constant call reverted inside the VM
    #[error("Contract reverted: {message} (contract: {contract})")]
    ContractReverted { contract: String, message: String },

    /// The response could not be interpreted
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No provider is registered for the requested network
    #[error("Unsupported network: {0}")]
    Unsupported(String),
}

impl ChainError {
    /// Check if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainError::Transport { .. } => true,
            ChainError::Timeout { .. } => true,
            ChainError::RpcResponse { code, .. } => {
                // 429 and 5xx are worth another attempt
                matches!(code, Some(c) if *c == 429 || (500..600).contains(c))
            }

            ChainError::AccountNotFound { .. } => false,
            ChainError::ContractReverted { .. } => false,
            ChainError::Decode(_) => false,
            ChainError::InvalidAddress(_) => false,
            ChainError::Unsupported(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            ChainError::Transport { .. } => "transport",
            ChainError::Timeout { .. } => "timeout",
            ChainError::RpcResponse { .. } => "rpc",
            ChainError::AccountNotFound { .. } => "not_found",
            ChainError::ContractReverted { .. } => "revert",
            ChainError::Decode(_) => "decode",
            ChainError::InvalidAddress(_) => "address",
            ChainError::Unsupported(_) => "unsupported",
        }
    }

    /// True for the revert a token transfer to a brand-new address produces
    pub fn is_new_account_revert(&self) -> bool {
        matches!(self, ChainError::ContractReverted { message, .. } if message.contains(REVERT_OPCODE_MESSAGE))
    }

    /// Classify a reqwest failure for the given endpoint
    pub fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ChainError::Timeout {
                endpoint: endpoint.to_string(),
                timeout_ms,
            }
        } else if err.is_decode() {
            ChainError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ChainError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
                code: Some(status.as_u16()),
            }
        } else {
            ChainError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}
