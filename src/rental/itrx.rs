//! ITRX energy rental market client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::market::{EnergyRentalMarket, RentalQuote};
use super::RentalError;
use crate::config::RentalConfig;
use crate::types::Address;

const API_KEY_HEADER: &str = "API-KEY";

#[derive(Debug, Clone)]
pub struct ItrxClient {
    http: reqwest::Client,
    endpoint: String,
    period: String,
}

/// Common envelope; a non-zero `errno` is an API-level failure
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    errno: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct PriceBody {
    #[serde(default)]
    total_price: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OrderBody {
    #[serde(default)]
    serial: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    energy_amount: u64,
    period: &'a str,
    receive_address: &'a str,
}

impl ItrxClient {
    pub fn new(config: &RentalConfig) -> Result<Self, RentalError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| RentalError::Decode(format!("invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RentalError::Transport {
                endpoint: config.endpoint.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            period: config.period.clone(),
        })
    }

    async fn read<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, RentalError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RentalError::Api {
                code: Some(i64::from(status.as_u16())),
                message,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| RentalError::Decode(format!("{what}: {e}")))?;
        if envelope.errno != 0 {
            return Err(RentalError::Api {
                code: Some(envelope.errno),
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope.body)
    }
}

#[async_trait]
impl EnergyRentalMarket for ItrxClient {
    async fn get_energy_rental_quote(&self, energy: u64) -> Result<RentalQuote, RentalError> {
        let url = format!("{}/api/v1/frontend/order/price", self.endpoint);
        let amount = energy.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("energy_amount", amount.as_str()), ("period", self.period.as_str())])
            .send()
            .await
            .map_err(|e| RentalError::from_reqwest(e, &self.endpoint))?;

        let body: PriceBody = self.read(response, "order/price").await?;
        let price = body
            .total_price
            .ok_or_else(|| RentalError::Decode("order/price: missing total_price".to_string()))?;

        debug!(energy, price, period = %self.period, "Received rental quote");
        Ok(RentalQuote {
            energy,
            price,
            period: self.period.clone(),
        })
    }

    async fn place_energy_rental_order(
        &self,
        address: &Address,
        energy: u64,
    ) -> Result<Option<String>, RentalError> {
        let url = format!("{}/api/v1/frontend/order", self.endpoint);
        let request = OrderRequest {
            energy_amount: energy,
            period: &self.period,
            receive_address: address.as_str(),
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RentalError::from_reqwest(e, &self.endpoint))?;

        let body: OrderBody = self.read(response, "order").await?;
        let order_id = body.serial.filter(|s| !s.trim().is_empty());

        info!(address = %address, energy, order_id = ?order_id, "Rental order submitted");
        Ok(order_id)
    }
}
