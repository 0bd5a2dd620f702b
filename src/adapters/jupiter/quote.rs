//! Jupiter Quote Types
//!
//! Response structure of the Jupiter quote API. Only the fields the sniper
//! reads are typed; the full body is kept alongside for the swap request.

use serde::{Deserialize, Serialize};

use crate::ports::execution::{ExecutionError, SwapQuote};

/// Response from Jupiter quote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage (otherAmountThreshold)
    #[serde(default)]
    pub other_amount_threshold: String,
    /// Slippage in basis points
    #[serde(default)]
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    /// Route plan with swap details
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
}

impl QuoteResponse {
    /// Get price impact as f64 percentage
    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }

    /// Parse a raw body, keeping it for the swap request
    pub fn into_swap_quote(raw: serde_json::Value) -> Result<SwapQuote, ExecutionError> {
        let typed: QuoteResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ExecutionError::MalformedResponse(format!("quote: {}", e)))?;

        Ok(SwapQuote {
            route: typed
                .route_plan
                .iter()
                .map(|step| step.swap_info.label.clone())
                .collect(),
            input_mint: typed.input_mint,
            output_mint: typed.output_mint,
            in_amount: typed.in_amount,
            out_amount: typed.out_amount,
            raw,
        })
    }
}

/// A step in the route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    /// Swap information for this step
    pub swap_info: SwapInfo,
    /// Percentage of the trade going through this route
    pub percent: u8,
}

/// Information about a single swap in the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// AMM key (pool identifier)
    pub amm_key: String,
    /// Label for the DEX (e.g., "Raydium", "Orca")
    #[serde(default)]
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: &str = r#"{
        "inputMint": "So11111111111111111111111111111111111111112",
        "inAmount": "10000000",
        "outputMint": "Token1111111111111111111111111111111111111",
        "outAmount": "345678901",
        "otherAmountThreshold": "338765323",
        "swapMode": "ExactIn",
        "slippageBps": 200,
        "priceImpactPct": "0.0123",
        "routePlan": [{
            "swapInfo": {
                "ammKey": "Pool111",
                "label": "Raydium",
                "inputMint": "So11111111111111111111111111111111111111112",
                "outputMint": "Token1111111111111111111111111111111111111",
                "inAmount": "10000000",
                "outAmount": "345678901",
                "feeAmount": "25000",
                "feeMint": "So11111111111111111111111111111111111111112"
            },
            "percent": 100
        }],
        "contextSlot": 299999999,
        "timeTaken": 0.01
    }"#;

    #[test]
    fn test_into_swap_quote_keeps_raw_body() {
        let raw: serde_json::Value = serde_json::from_str(QUOTE).unwrap();
        let quote = QuoteResponse::into_swap_quote(raw.clone()).unwrap();

        assert_eq!(quote.out_amount, "345678901");
        assert_eq!(quote.route, vec!["Raydium".to_string()]);
        // Unknown fields survive for the swap request
        assert_eq!(quote.raw["contextSlot"], 299999999);
        assert_eq!(quote.raw, raw);
    }

    #[test]
    fn test_price_impact() {
        let typed: QuoteResponse = serde_json::from_str(QUOTE).unwrap();
        assert!((typed.price_impact() - 0.0123).abs() < 1e-9);
    }

    #[test]
    fn test_missing_amounts_is_malformed() {
        let raw = serde_json::json!({"error": "Could not find any route"});
        assert!(matches!(
            QuoteResponse::into_swap_quote(raw),
            Err(ExecutionError::MalformedResponse(_))
        ));
    }
}
