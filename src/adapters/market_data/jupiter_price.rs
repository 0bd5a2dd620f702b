use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::market_data::{MarketDataError, PriceOracle};

/// Reference price client for the Jupiter price API
#[derive(Debug, Clone)]
pub struct JupiterPriceClient {
    http: Client,
    price_url: String,
}

impl JupiterPriceClient {
    pub fn new(price_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        Ok(Self {
            http,
            price_url: price_url.into(),
        })
    }

    /// Get price for a single token in the reference unit (USD)
    pub async fn get_price(&self, mint: &str) -> Result<f64, MarketDataError> {
        let response = self
            .http
            .get(&self.price_url)
            .query(&[("ids", mint)])
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: PriceResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        body.price_of(mint)
    }
}

#[async_trait]
impl PriceOracle for JupiterPriceClient {
    async fn reference_price(&self, mint: &str) -> Result<f64, MarketDataError> {
        self.get_price(mint).await
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<PriceData>>,
}

impl PriceResponse {
    fn price_of(&self, mint: &str) -> Result<f64, MarketDataError> {
        let price = self
            .data
            .get(mint)
            .and_then(|entry| entry.as_ref())
            .and_then(|entry| entry.price.as_ref())
            .and_then(PriceValue::as_f64)
            .ok_or_else(|| MarketDataError::NoPriceData(mint.to_string()))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(MarketDataError::NoPriceData(mint.to_string()));
        }
        Ok(price)
    }
}

#[derive(Debug, Deserialize)]
struct PriceData {
    #[serde(default)]
    price: Option<PriceValue>,
}

/// Older API versions return a number, newer ones a decimal string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => s.parse().ok(),
        }
    }
}
