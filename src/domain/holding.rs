//! Holdings and seen-token records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name stored when the token's name could not be looked up
pub const UNKNOWN_TOKEN_NAME: &str = "N/A";

/// A token observed by the risk evaluator, kept for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub mint: String,
    pub name: String,
    pub creator: String,
    /// First time the token was evaluated, unix millis
    pub first_seen_ms: i64,
}

impl TokenRecord {
    pub fn new(
        mint: impl Into<String>,
        name: impl Into<String>,
        creator: impl Into<String>,
        first_seen_ms: i64,
    ) -> Self {
        Self {
            mint: mint.into(),
            name: name.into(),
            creator: creator.into(),
            first_seen_ms,
        }
    }
}

/// An open position, one per token mint.
///
/// Reference values are denominated in the reference (USD) unit; `sol_paid`
/// is in SOL and `sol_fee_paid` in lamports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub mint: String,
    pub token_name: String,
    /// Tokens received, UI amount
    pub balance: f64,
    pub sol_paid: f64,
    pub sol_fee_paid: u64,
    pub sol_paid_reference: f64,
    pub sol_fee_paid_reference: f64,
    pub per_token_reference: f64,
    pub slot: u64,
    /// Block time of the entry transaction
    pub time: DateTime<Utc>,
    /// Program that executed the swap hop, when known
    pub program: Option<String>,
    pub entry_signature: String,
}

impl Holding {
    /// Total cost of entry in the reference unit, fees included
    pub fn cost_basis_reference(&self) -> f64 {
        self.sol_paid_reference + self.sol_fee_paid_reference
    }

    /// Unrealised result against a per-token reference price, in percent
    pub fn unrealized_pnl_pct(&self, current_per_token: f64) -> f64 {
        if self.per_token_reference <= 0.0 {
            return 0.0;
        }
        (current_per_token - self.per_token_reference) / self.per_token_reference * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn holding() -> Holding {
        Holding {
            mint: "Token111".to_string(),
            token_name: "Token".to_string(),
            balance: 1_000_000.0,
            sol_paid: 0.01,
            sol_fee_paid: 5_000,
            sol_paid_reference: 1.5,
            sol_fee_paid_reference: 0.00075,
            per_token_reference: 0.0000015,
            slot: 42,
            time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            program: Some("RAYDIUM".to_string()),
            entry_signature: "sig".to_string(),
        }
    }

    #[test]
    fn test_cost_basis() {
        assert_relative_eq!(holding().cost_basis_reference(), 1.50075, epsilon = 1e-12);
    }

    #[test]
    fn test_unrealized_pnl() {
        let h = holding();
        assert_relative_eq!(h.unrealized_pnl_pct(0.000003), 100.0, epsilon = 1e-9);
        assert_relative_eq!(h.unrealized_pnl_pct(0.00000075), -50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_serde_roundtrip_preserves_time() {
        let h = holding();
        let json = serde_json::to_string(&h).unwrap();
        let back: Holding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
