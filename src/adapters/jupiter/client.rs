//! Jupiter API Client
//!
//! HTTP client for the Jupiter quote and swap endpoints. Every call is a
//! single request; retrying is the caller's decision. A 400 from the quote
//! endpoint means the pool is not routable yet and is surfaced as
//! `NotTradable`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::quote::QuoteResponse;
use super::swap::{SwapRequest, SwapResponse};
use crate::ports::execution::{
    BuiltTransaction, ExecutionError, QuoteParams, QuoteProvider, SwapBuildParams, SwapBuilder,
    SwapQuote,
};

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Full quote endpoint URL
    pub quote_url: String,
    /// Full swap endpoint URL
    pub swap_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Log quote and swap payloads at debug level
    pub verbose_log: bool,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            quote_url: "https://quote-api.jup.ag/v6/quote".to_string(),
            swap_url: "https://quote-api.jup.ag/v6/swap".to_string(),
            timeout: Duration::from_secs(10),
            verbose_log: false,
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    /// Create a new Jupiter client with custom configuration
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, params: &QuoteParams) -> Result<SwapQuote, ExecutionError> {
        let slippage_bps = params.slippage_bps.to_string();
        let req = self.http.get(&self.config.quote_url).query(&[
            ("inputMint", params.input_mint.as_str()),
            ("outputMint", params.output_mint.as_str()),
            ("amount", params.amount.as_str()),
            ("slippageBps", slippage_bps.as_str()),
        ]);

        let response = send(req).await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::NotTradable(body));
        }

        let raw: serde_json::Value = self.handle_response(response).await?;
        if self.config.verbose_log {
            tracing::debug!("Quote response: {}", raw);
        }
        QuoteResponse::into_swap_quote(raw)
    }

    /// Build the swap transaction for a quote
    pub async fn get_swap_transaction(
        &self,
        request: &SwapRequest,
    ) -> Result<SwapResponse, ExecutionError> {
        if self.config.verbose_log {
            tracing::debug!(
                "Swap request: {}",
                serde_json::to_string(request).unwrap_or_default()
            );
        }

        let response = send(self.http.post(&self.config.swap_url).json(request)).await?;
        let swap: SwapResponse = self.handle_response(response).await?;
        if let Some(simulation_error) = swap.simulation_error.as_ref().filter(|v| !v.is_null()) {
            return Err(ExecutionError::ApiError(format!(
                "Swap simulation failed: {}",
                simulation_error
            )));
        }
        if swap.swap_transaction.is_empty() {
            return Err(ExecutionError::MalformedResponse(
                "swap response without transaction".into(),
            ));
        }
        Ok(swap)
    }

    /// Handle API response and deserialize
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExecutionError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Check for slippage error
            if error_text.contains("SlippageToleranceExceeded") || error_text.contains("6001") {
                return Err(ExecutionError::SlippageExceeded);
            }

            return Err(ExecutionError::ApiError(format!(
                "API error {}: {}",
                status,
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ExecutionError> {
    request
        .send()
        .await
        .map_err(|e| ExecutionError::ApiError(e.to_string()))
}

#[async_trait]
impl QuoteProvider for JupiterClient {
    async fn quote(&self, params: &QuoteParams) -> Result<SwapQuote, ExecutionError> {
        self.get_quote(params).await
    }
}

#[async_trait]
impl SwapBuilder for JupiterClient {
    async fn build_swap(
        &self,
        quote: &SwapQuote,
        params: &SwapBuildParams,
    ) -> Result<BuiltTransaction, ExecutionError> {
        let request = SwapRequest::new(quote, params);
        let response = self.get_swap_transaction(&request).await?;
        tracing::info!("Swap quote serialized");
        Ok(response.into_built())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::serve;
    use crate::domain::WSOL_MINT;
    use crate::ports::execution::PriorityFee;

    fn client_for(base: &str) -> JupiterClient {
        JupiterClient::with_config(JupiterConfig {
            quote_url: format!("{}/quote", base),
            swap_url: format!("{}/swap", base),
            timeout: Duration::from_secs(5),
            verbose_log: true,
        })
        .unwrap()
    }

    fn params() -> QuoteParams {
        QuoteParams {
            input_mint: WSOL_MINT.to_string(),
            output_mint: "Token111".to_string(),
            amount: "10000000".parse().unwrap(),
            slippage_bps: 200,
        }
    }

    fn quote_body() -> String {
        serde_json::json!({
            "inputMint": WSOL_MINT,
            "outputMint": "Token111",
            "inAmount": "10000000",
            "outAmount": "5000",
            "routePlan": []
        })
        .to_string()
    }

    #[test]
    fn test_jupiter_config_default() {
        let config = JupiterConfig::default();
        assert!(config.quote_url.ends_with("/quote"));
        assert!(config.swap_url.ends_with("/swap"));
    }

    #[tokio::test]
    async fn test_quote_sends_documented_query() {
        let server = serve(vec![(200, quote_body())]).await;
        let quote = client_for(&server.url).quote(&params()).await.unwrap();
        assert_eq!(quote.out_amount, "5000");

        let requests = server.requests.lock().unwrap().clone();
        let line = &requests[0].request_line;
        assert!(line.starts_with("GET /quote?"));
        assert!(line.contains(&format!("inputMint={}", WSOL_MINT)));
        assert!(line.contains("outputMint=Token111"));
        assert!(line.contains("amount=10000000"));
        assert!(line.contains("slippageBps=200"));
    }

    #[tokio::test]
    async fn test_bad_request_is_not_tradable() {
        let server = serve(vec![(400, r#"{"error":"TOKEN_NOT_TRADABLE"}"#.to_string())]).await;
        let err = client_for(&server.url).quote(&params()).await.unwrap_err();
        assert!(err.is_not_tradable());
    }

    #[tokio::test]
    async fn test_server_error_propagates_after_one_request() {
        let server = serve(vec![(500, "{}".to_string()), (200, quote_body())]).await;
        let err = client_for(&server.url).quote(&params()).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ApiError(ref msg) if msg.contains("500")));
        assert!(!err.is_not_tradable());
        assert_eq!(server.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_after_one_request() {
        let server = serve(vec![(429, "{}".to_string()), (200, quote_body())]).await;
        let err = client_for(&server.url).quote(&params()).await.unwrap_err();
        assert_eq!(err, ExecutionError::RateLimited);
        assert_eq!(server.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_build_swap_posts_body() {
        let swap_body = serde_json::json!({
            "swapTransaction": "3Bxs4h24hBtQy9rw",
            "lastValidBlockHeight": 100,
            "simulationError": null
        })
        .to_string();
        let server = serve(vec![(200, quote_body()), (200, swap_body)]).await;
        let client = client_for(&server.url);

        let quote = client.quote(&params()).await.unwrap();
        let build = SwapBuildParams {
            user_public_key: "Wallet111".to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_slippage_max_bps: 300,
            priority_fee: PriorityFee { max_lamports: 1_000_000, level: "veryHigh".to_string() },
        };
        let built = client.build_swap(&quote, &build).await.unwrap();
        assert_eq!(built.encoded, "3Bxs4h24hBtQy9rw");

        let requests = server.requests.lock().unwrap().clone();
        assert!(requests[1].request_line.starts_with("POST /swap"));
        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(body["userPublicKey"], "Wallet111");
        assert_eq!(body["quoteResponse"]["outAmount"], "5000");
    }

    #[tokio::test]
    async fn test_simulation_error_rejected() {
        let swap_body = serde_json::json!({
            "swapTransaction": "abc",
            "simulationError": {"errorCode": "INSUFFICIENT_FUNDS"}
        })
        .to_string();
        let server = serve(vec![(200, swap_body)]).await;
        let client = client_for(&server.url);
        let quote = QuoteResponse::into_swap_quote(serde_json::from_str(&quote_body()).unwrap())
            .unwrap();
        let build = SwapBuildParams {
            user_public_key: "Wallet111".to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_slippage_max_bps: 300,
            priority_fee: PriorityFee { max_lamports: 1, level: "high".to_string() },
        };

        let err = client.build_swap(&quote, &build).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ApiError(msg) if msg.contains("simulation")));
    }
}
