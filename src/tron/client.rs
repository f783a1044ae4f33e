//! TronGrid full-node HTTP client
//!
//! Implements [`ChainResourceProvider`] against the `/wallet/*` endpoints of
//! a java-tron HTTP API (TronGrid or a self-hosted node). All requests use
//! `visible = true` so addresses travel as base58check strings.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use super::abi::{self, decode_node_message};
use crate::chain::errors::REVERT_OPCODE_MESSAGE;
use crate::chain::{ChainError, ChainResourceProvider, ContractCall, SampleTransaction};
use crate::config::TronConfig;
use crate::metrics::metrics;
use crate::types::{AccountResourceSnapshot, Address, NetworkId, Token};

/// Fee limit attached to sample transactions (30 TRX)
pub const SAMPLE_FEE_LIMIT: u64 = 30_000_000;

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

#[derive(Debug, Clone)]
pub struct TronGridClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct AccountResourceResponse {
    #[serde(rename = "EnergyLimit", default)]
    energy_limit: u64,
    #[serde(rename = "EnergyUsed", default)]
    energy_used: u64,
    #[serde(rename = "freeNetLimit", default)]
    free_net_limit: u64,
    #[serde(rename = "freeNetUsed", default)]
    free_net_used: u64,
    #[serde(rename = "NetLimit", default)]
    net_limit: u64,
    #[serde(rename = "NetUsed", default)]
    net_used: u64,
}

#[derive(Debug, Default, Deserialize)]
struct TriggerResult {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TxRet {
    #[serde(default)]
    ret: Option<String>,
    #[serde(rename = "contractRet", default)]
    contract_ret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TriggerTransaction {
    #[serde(default)]
    ret: Vec<TxRet>,
    #[serde(default)]
    raw_data_hex: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TriggerResponse {
    #[serde(default)]
    result: TriggerResult,
    #[serde(default)]
    energy_used: u64,
    #[serde(default)]
    constant_result: Vec<String>,
    #[serde(default)]
    transaction: Option<TriggerTransaction>,
}

impl TronGridClient {
    pub fn new(config: &TronConfig) -> Result<Self, ChainError> {
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

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ChainError> {
        let url = format!("{}/{}", self.endpoint, path);
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::from_reqwest(e, &self.endpoint, self.timeout_ms))?;
        metrics()
            .rpc_latency
            .observe(started.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChainError::RpcResponse {
                endpoint: self.endpoint.clone(),
                message,
                code: Some(status.as_u16()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChainError::Decode(format!("{path}: {e}")))
    }

    async fn trigger_constant(&self, call: &ContractCall) -> Result<TriggerResponse, ChainError> {
        let body = json!({
            "owner_address": call.owner.as_str(),
            "contract_address": call.contract.as_str(),
            "function_selector": call.method_signature,
            "parameter": hex::encode(&call.params),
            "visible": true,
        });
        let response: TriggerResponse = self.post("wallet/triggerconstantcontract", body).await?;
        self.check_trigger(call, &response)?;
        Ok(response)
    }

    /// Map node-side failures of a trigger call onto [`ChainError`]
    fn check_trigger(&self, call: &ContractCall, response: &TriggerResponse) -> Result<(), ChainError> {
        let message = response.result.message.as_deref().map(decode_node_message);

        let vm_failure = response
            .transaction
            .iter()
            .flat_map(|tx| tx.ret.iter())
            .find_map(|r| {
                if r.ret.as_deref() == Some("FAILED") {
                    Some(r.contract_ret.clone().unwrap_or_else(|| "REVERT".to_string()))
                } else {
                    r.contract_ret.clone().filter(|c| c != "SUCCESS")
                }
            });

        if let Some(contract_ret) = vm_failure {
            let message = message.unwrap_or_else(|| {
                if contract_ret == "REVERT" {
                    REVERT_OPCODE_MESSAGE.to_string()
                } else {
                    contract_ret
                }
            });
            return Err(ChainError::ContractReverted {
                contract: call.contract.to_string(),
                message,
            });
        }

        if !response.result.result {
            let message = message
                .or_else(|| response.result.code.clone())
                .unwrap_or_else(|| "unknown trigger failure".to_string());
            if message.contains("REVERT") {
                return Err(ChainError::ContractReverted {
                    contract: call.contract.to_string(),
                    message,
                });
            }
            if message.contains("does not exist") {
                return Err(ChainError::AccountNotFound {
                    address: call.owner.to_string(),
                });
            }
            return Err(ChainError::RpcResponse {
                endpoint: self.endpoint.clone(),
                message,
                code: None,
            });
        }

        Ok(())
    }

    /// Fetch an account object, mapping the empty reply to `AccountNotFound`
    async fn get_account_object(&self, path: &str, address: &Address) -> Result<Value, ChainError> {
        abi::validate_address(address)?;
        let body = json!({ "address": address.as_str(), "visible": true });
        let value: Value = self.post(path, body).await?;
        match value.as_object() {
            Some(obj) if obj.is_empty() => Err(ChainError::AccountNotFound {
                address: address.to_string(),
            }),
            Some(_) => Ok(value),
            None => Err(ChainError::Decode(format!("{path}: expected a JSON object"))),
        }
    }
}

#[async_trait]
impl ChainResourceProvider for TronGridClient {
    fn network(&self) -> NetworkId {
        NetworkId::Tron
    }

    async fn read_account_resources(
        &self,
        address: &Address,
    ) -> Result<AccountResourceSnapshot, ChainError> {
        let value = self
            .get_account_object("wallet/getaccountresource", address)
            .await?;
        let resources: AccountResourceResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::Decode(format!("getaccountresource: {e}")))?;

        let snapshot = AccountResourceSnapshot {
            energy_limit: resources.energy_limit,
            energy_used: resources.energy_used,
            free_bandwidth_limit: resources.free_net_limit,
            free_bandwidth_used: resources.free_net_used,
            staked_bandwidth_limit: resources.net_limit,
            staked_bandwidth_used: resources.net_used,
        };
        debug!(
            address = %address,
            available_energy = snapshot.available_energy(),
            available_bandwidth = snapshot.available_bandwidth(),
            "Read account resources"
        );
        Ok(snapshot)
    }

    async fn simulate_contract_call(&self, call: &ContractCall) -> Result<u64, ChainError> {
        let response = self.trigger_constant(call).await?;
        debug!(
            contract = %call.contract,
            method = %call.method_signature,
            energy_used = response.energy_used,
            "Constant call simulated"
        );
        Ok(response.energy_used)
    }

    async fn build_sample_transaction(
        &self,
        call: &ContractCall,
    ) -> Result<SampleTransaction, ChainError> {
        let body = json!({
            "owner_address": call.owner.as_str(),
            "contract_address": call.contract.as_str(),
            "function_selector": call.method_signature,
            "parameter": hex::encode(&call.params),
            "fee_limit": SAMPLE_FEE_LIMIT,
            "call_value": 0,
            "visible": true,
        });
        let response: TriggerResponse = self.post("wallet/triggersmartcontract", body).await?;
        self.check_trigger(call, &response)?;

        let raw_hex = response
            .transaction
            .and_then(|tx| tx.raw_data_hex)
            .ok_or_else(|| ChainError::Decode("triggersmartcontract: missing raw_data_hex".to_string()))?;
        let raw_data = hex::decode(&raw_hex)
            .map_err(|e| ChainError::Decode(format!("raw_data_hex: {e}")))?;

        Ok(SampleTransaction {
            raw_data,
            signature_count: 1,
        })
    }

    async fn native_balance(&self, address: &Address) -> Result<u64, ChainError> {
        let value = self.get_account_object("wallet/getaccount", address).await?;
        match value.get("balance") {
            None => Ok(0),
            Some(balance) => balance
                .as_u64()
                .ok_or_else(|| ChainError::Decode(format!("getaccount: invalid balance {balance}"))),
        }
    }

    async fn token_balance(&self, address: &Address, token: &Token) -> Result<u64, ChainError> {
        let call = ContractCall {
            owner: address.clone(),
            contract: token.address.clone(),
            method_signature: "balanceOf(address)".to_string(),
            params: abi::address_word(address)?.to_vec(),
        };
        let response = self.trigger_constant(&call).await?;
        let word = response
            .constant_result
            .first()
            .ok_or_else(|| ChainError::Decode("balanceOf: empty constant_result".to_string()))?;
        abi::decode_uint_word(word)
    }
}
