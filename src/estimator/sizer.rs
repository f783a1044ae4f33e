//! Transaction wire-size measurement
//!
//! Bandwidth is charged on the protobuf size of the signed transaction with
//! its `ret` field cleared, plus a fixed allowance for the execution result:
//!
//! ```text
//! Transaction {
//!     raw_data  = 1;  // length-delimited
//!     signature = 2;  // repeated, 65 bytes each
//! }
//! size = |raw_data field| + n * |signature field| + MAX_RESULT_SIZE_IN_TX
//! ```

use thiserror::Error;

use crate::chain::SampleTransaction;

/// Recoverable secp256k1 signature length
pub const SIGNATURE_LEN: u64 = 65;

/// Allowance the network adds for the transaction result
pub const MAX_RESULT_SIZE_IN_TX: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("sample transaction has an empty raw_data payload")]
    EmptyPayload,

    #[error("sample transaction carries no signatures")]
    MissingSignature,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionSizer;

impl TransactionSizer {
    pub fn new() -> Self {
        Self
    }

    /// Bytes the signed transaction will be charged for
    pub fn size_of(&self, tx: &SampleTransaction) -> Result<u64, SizingError> {
        if tx.raw_data.is_empty() {
            return Err(SizingError::EmptyPayload);
        }
        if tx.signature_count == 0 {
            return Err(SizingError::MissingSignature);
        }

        let raw = length_delimited_field(tx.raw_data.len() as u64);
        let signatures = tx.signature_count as u64 * length_delimited_field(SIGNATURE_LEN);
        Ok(raw + signatures + MAX_RESULT_SIZE_IN_TX)
    }
}

/// tag byte + varint length prefix + payload
fn length_delimited_field(payload_len: u64) -> u64 {
    1 + varint_len(payload_len) + payload_len
}

fn varint_len(mut value: u64) -> u64 {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}
