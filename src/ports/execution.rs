//! Execution port: swap quotes and unsigned swap transactions

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SwapAmount;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),

    /// The aggregator answered 400: the pool is not routable yet
    #[error("Token not tradable yet: {0}")]
    NotTradable(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,
}

impl ExecutionError {
    pub fn is_not_tradable(&self) -> bool {
        matches!(self, ExecutionError::NotTradable(_))
    }
}

/// Quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    /// Base units, never converted to floating point
    pub amount: SwapAmount,
    pub slippage_bps: u16,
}

/// A quote as returned by the aggregator.
///
/// `raw` is the untouched response body; the swap builder sends it back
/// verbatim as `quoteResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    /// DEX labels along the route
    pub route: Vec<String>,
    pub raw: serde_json::Value,
}

/// Priority fee cap and level for the swap builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityFee {
    pub max_lamports: u64,
    /// e.g. `veryHigh`
    pub level: String,
}

/// Everything the swap builder needs besides the quote
#[derive(Debug, Clone, PartialEq)]
pub struct SwapBuildParams {
    pub user_public_key: String,
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_slippage_max_bps: u16,
    pub priority_fee: PriorityFee,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("Swap transaction is neither base58 nor base64")]
pub struct PayloadDecodeError;

/// Serialized, unsigned transaction returned by the swap builder
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTransaction {
    pub encoded: String,
    pub last_valid_block_height: Option<u64>,
}

impl BuiltTransaction {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
            last_valid_block_height: None,
        }
    }

    /// Raw transaction bytes; base58 is tried first, then base64
    pub fn decode(&self) -> Result<Vec<u8>, PayloadDecodeError> {
        if let Ok(bytes) = bs58::decode(&self.encoded).into_vec() {
            return Ok(bytes);
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.encoded)
            .map_err(|_| PayloadDecodeError)
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Single quote attempt; a 400 answer maps to `NotTradable`
    async fn quote(&self, params: &QuoteParams) -> Result<SwapQuote, ExecutionError>;
}

#[async_trait]
pub trait SwapBuilder: Send + Sync {
    async fn build_swap(
        &self,
        quote: &SwapQuote,
        params: &SwapBuildParams,
    ) -> Result<BuiltTransaction, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_prefers_base58() {
        let bytes = vec![1u8, 2, 3, 250];
        let built = BuiltTransaction::new(bs58::encode(&bytes).into_string());
        assert_eq!(built.decode().unwrap(), bytes);
    }

    #[test]
    fn test_decode_falls_back_to_base64() {
        let bytes = vec![0u8, 0, 1, 255, 42];
        // '+' and '=' are outside the base58 alphabet
        let encoded = base64::engine::general_purpose::STANDARD.encode([251u8, 255, 0]);
        assert!(encoded.contains('+') || encoded.contains('/') || encoded.contains('='));
        assert_eq!(BuiltTransaction::new(encoded).decode().unwrap(), vec![251, 255, 0]);

        let padded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        assert_eq!(BuiltTransaction::new(padded).decode().unwrap(), bytes);
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(BuiltTransaction::new("!!not-a-payload!!").decode(), Err(PayloadDecodeError));
    }

    #[test]
    fn test_not_tradable_classification() {
        assert!(ExecutionError::NotTradable("400".into()).is_not_tradable());
        assert!(!ExecutionError::RateLimited.is_not_tradable());
    }
}
