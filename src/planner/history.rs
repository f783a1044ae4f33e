//! Recipient activity: past transfers and explorer risk flags

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainError;
use crate::types::{Address, Token};

/// One token transfer as reported by an explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub transaction_id: String,
    pub from_address: Address,
    pub to_address: Address,
    /// Amount in the token's smallest units
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

/// Explorer view of a sender/recipient pair for one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientActivity {
    pub transfers: Vec<TokenTransfer>,
    /// Explorer marked the recipient as risky
    pub risky: bool,
}

/// A past transfer annotated with its age
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub transfer: TokenTransfer,
    /// Seconds between the transfer and the planning pass
    pub elapsed_secs: i64,
}

impl HistoryEntry {
    pub fn elapsed_days(&self) -> i64 {
        self.elapsed_secs / 86_400
    }
}

/// Source of transfer history and reputation data
#[async_trait]
pub trait TransferHistorySource: Send + Sync {
    async fn recipient_activity(
        &self,
        from: &Address,
        to: &Address,
        token: &Token,
    ) -> Result<RecipientActivity, ChainError>;
}

/// Keep the most recent transfers that actually went to `recipient`
pub fn recent_transfers(
    transfers: &[TokenTransfer],
    recipient: &Address,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    let mut matching: Vec<&TokenTransfer> = transfers
        .iter()
        .filter(|t| &t.to_address == recipient)
        .collect();
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    matching
        .into_iter()
        .take(limit)
        .map(|t| HistoryEntry {
            transfer: t.clone(),
            elapsed_secs: (now - t.timestamp).num_seconds().max(0),
        })
        .collect()
}
