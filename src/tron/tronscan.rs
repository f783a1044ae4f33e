//! Tronscan explorer client (transfer history and risk flags)

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::chain::ChainError;
use crate::config::TronscanConfig;
use crate::planner::history::{RecipientActivity, TokenTransfer, TransferHistorySource};
use crate::types::{Address, Token};

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Transfers fetched per lookup; the planner keeps only the newest few
const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct TronscanClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct TransfersResponse {
    #[serde(default)]
    token_transfers: Vec<RawTransfer>,
    #[serde(rename = "normalAddressInfo", default)]
    normal_address_info: HashMap<String, AddressInfo>,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    transaction_id: String,
    from_address: String,
    to_address: String,
    /// Decimal string in smallest units
    quant: String,
    /// Milliseconds since the epoch
    block_ts: i64,
}

#[derive(Debug, Default, Deserialize)]
struct AddressInfo {
    #[serde(default)]
    risk: bool,
}

impl RawTransfer {
    fn into_transfer(self) -> Result<TokenTransfer, ChainError> {
        let amount = self
            .quant
            .parse::<u64>()
            .map_err(|e| ChainError::Decode(format!("transfer {}: quant: {e}", self.transaction_id)))?;
        let timestamp: DateTime<Utc> = Utc
            .timestamp_millis_opt(self.block_ts)
            .single()
            .ok_or_else(|| ChainError::Decode(format!("transfer {}: block_ts out of range", self.transaction_id)))?;

        Ok(TokenTransfer {
            transaction_id: self.transaction_id,
            from_address: Address::new(self.from_address),
            to_address: Address::new(self.to_address),
            amount,
            timestamp,
        })
    }
}

impl TronscanClient {
    pub fn new(config: &TronscanConfig) -> Result<Self, ChainError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ChainError::Decode(format!("invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ChainError::Transport {
                endpoint: config.endpoint.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_secs * 1000,
        })
    }
}

#[async_trait]
impl TransferHistorySource for TronscanClient {
    async fn recipient_activity(
        &self,
        from: &Address,
        to: &Address,
        token: &Token,
    ) -> Result<RecipientActivity, ChainError> {
        let url = format!("{}/api/token_trc20/transfers", self.endpoint);
        let limit = PAGE_SIZE.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("fromAddress", from.as_str()),
                ("toAddress", to.as_str()),
                ("contract_address", token.address.as_str()),
                ("limit", limit.as_str()),
                ("start", "0"),
            ])
            .send()
            .await
            .map_err(|e| ChainError::from_reqwest(e, &self.endpoint, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChainError::RpcResponse {
                endpoint: self.endpoint.clone(),
                message,
                code: Some(status.as_u16()),
            });
        }

        let body: TransfersResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(format!("token_trc20/transfers: {e}")))?;

        let risky = body
            .normal_address_info
            .get(to.as_str())
            .map(|info| info.risk)
            .unwrap_or(false);
        let transfers = body
            .token_transfers
            .into_iter()
            .map(RawTransfer::into_transfer)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            from = %from,
            to = %to,
            transfers = transfers.len(),
            risky,
            "Fetched recipient activity"
        );
        Ok(RecipientActivity { transfers, risky })
    }
}
