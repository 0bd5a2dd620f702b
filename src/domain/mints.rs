//! Mint identifiers and swap amounts

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wrapped SOL mint, the quote asset of every sniped pool
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Raydium AMM v4 program that emits pool-creation instructions
pub const RAYDIUM_AMM_V4_PROGRAM_ID: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

/// The two mints of a freshly created pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPair {
    /// The newly launched token
    pub token_mint: String,
    /// The quote asset (wrapped SOL)
    pub sol_mint: String,
}

impl MintPair {
    pub fn new(token_mint: impl Into<String>, sol_mint: impl Into<String>) -> Self {
        Self {
            token_mint: token_mint.into(),
            sol_mint: sol_mint.into(),
        }
    }
}

impl fmt::Display for MintPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_mint, self.sol_mint)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmountError {
    #[error("Amount is not a decimal number: {0}")]
    NotDecimal(String),

    #[error("Amount must be a whole number of base units: {0}")]
    Fractional(String),

    #[error("Amount must be positive: {0}")]
    NotPositive(String),
}

/// Swap amount in base units, carried as a decimal string end to end.
///
/// Never converted to floating point; the original digits are what goes
/// on the wire to the quote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SwapAmount(String);

impl SwapAmount {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The amount as an integer, when it fits in `u64`
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl FromStr for SwapAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| AmountError::NotDecimal(s.to_string()))?;

        if !value.fract().is_zero() {
            return Err(AmountError::Fractional(s.to_string()));
        }
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(s.to_string()));
        }

        Ok(Self(value.trunc().normalize().to_string()))
    }
}

impl TryFrom<String> for SwapAmount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NonZeroU64> for SwapAmount {
    fn from(base_units: NonZeroU64) -> Self {
        Self(base_units.to_string())
    }
}

impl From<SwapAmount> for String {
    fn from(amount: SwapAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for SwapAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
