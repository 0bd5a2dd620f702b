//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter swap API.

use serde::{Deserialize, Serialize};

use crate::ports::execution::{BuiltTransaction, SwapBuildParams, SwapQuote};

/// Request body for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// The full quote response from the quote endpoint
    pub quote_response: serde_json::Value,
    /// User's public key (wallet address)
    pub user_public_key: String,
    pub wrap_and_unwrap_sol: bool,
    pub dynamic_slippage: DynamicSlippage,
    pub prioritization_fee_lamports: PrioritizationFee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSlippage {
    pub max_bps: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizationFee {
    pub priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityLevelWithMaxLamports {
    pub max_lamports: u64,
    pub priority_level: String,
}

impl SwapRequest {
    pub fn new(quote: &SwapQuote, params: &SwapBuildParams) -> Self {
        Self {
            quote_response: quote.raw.clone(),
            user_public_key: params.user_public_key.clone(),
            wrap_and_unwrap_sol: params.wrap_and_unwrap_sol,
            dynamic_slippage: DynamicSlippage {
                max_bps: params.dynamic_slippage_max_bps,
            },
            prioritization_fee_lamports: PrioritizationFee {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: params.priority_fee.max_lamports,
                    priority_level: params.priority_fee.level.clone(),
                },
            },
        }
    }
}

/// Response from Jupiter swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Serialized transaction, base58 or base64
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    #[serde(default)]
    pub last_valid_block_height: Option<u64>,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
    /// Set when the builder's simulation failed
    #[serde(default)]
    pub simulation_error: Option<serde_json::Value>,
}

impl SwapResponse {
    /// Check if transaction is still valid based on current block height
    pub fn is_valid_at_height(&self, current_height: u64) -> bool {
        self.last_valid_block_height
            .map_or(true, |last| current_height <= last)
    }

    pub fn into_built(self) -> BuiltTransaction {
        BuiltTransaction {
            encoded: self.swap_transaction,
            last_valid_block_height: self.last_valid_block_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::execution::PriorityFee;

    fn quote() -> SwapQuote {
        SwapQuote {
            input_mint: "SOL".to_string(),
            output_mint: "TOKEN".to_string(),
            in_amount: "10000000".to_string(),
            out_amount: "42".to_string(),
            route: vec![],
            raw: serde_json::json!({"inAmount": "10000000", "outAmount": "42", "contextSlot": 7}),
        }
    }

    fn params() -> SwapBuildParams {
        SwapBuildParams {
            user_public_key: "wallet123".to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_slippage_max_bps: 300,
            priority_fee: PriorityFee {
                max_lamports: 1_000_000,
                level: "veryHigh".to_string(),
            },
        }
    }

    #[test]
    fn test_swap_request_wire_shape() {
        let json = serde_json::to_value(SwapRequest::new(&quote(), &params())).unwrap();

        assert_eq!(json["userPublicKey"], "wallet123");
        assert_eq!(json["wrapAndUnwrapSol"], true);
        assert_eq!(json["dynamicSlippage"]["maxBps"], 300);
        assert_eq!(
            json["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["maxLamports"],
            1_000_000
        );
        assert_eq!(
            json["prioritizationFeeLamports"]["priorityLevelWithMaxLamports"]["priorityLevel"],
            "veryHigh"
        );
        assert_eq!(json["quoteResponse"]["contextSlot"], 7);
    }

    #[test]
    fn test_swap_response_parsing() {
        let json = r#"{
            "swapTransaction": "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "lastValidBlockHeight": 123456789,
            "prioritizationFeeLamports": 5000,
            "simulationError": null
        }"#;

        let response: SwapResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.last_valid_block_height, Some(123456789));
        assert!(response.simulation_error.is_none());
        assert!(response.is_valid_at_height(123456789));
        assert!(!response.is_valid_at_height(123456790));

        let built = response.into_built();
        assert_eq!(built.last_valid_block_height, Some(123456789));
    }
}
