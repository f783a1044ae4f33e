//! TRON network collaborators
//!
//! - **abi**: base58check addresses and TRC20 argument encoding
//! - **client**: TronGrid HTTP API, the TRON [`ChainResourceProvider`](crate::chain::ChainResourceProvider)
//! - **tronscan**: explorer history and risk flags

pub mod abi;
pub mod client;
pub mod tronscan;

pub use abi::Trc20Method;
pub use client::TronGridClient;
pub use tronscan::TronscanClient;
