//! Domain Layer - Core sniping logic
//!
//! Pure types and functions with no I/O. All external interactions happen
//! through the ports layer.
//!
//! - `backoff`: wait policies for retried calls
//! - `mints`: mint identifiers and precision-preserving swap amounts
//! - `transaction`: indexed transaction view and pool-mint extraction
//! - `risk_report`: normalised token-safety report
//! - `risk_rules`: configured thresholds and the ordered rule book
//! - `holding`: open positions and seen-token records
//! - `valuation`: reference-unit cost of a confirmed buy

pub mod backoff;
pub mod holding;
pub mod mints;
pub mod risk_report;
pub mod risk_rules;
pub mod transaction;
pub mod valuation;

pub use backoff::Backoff;
pub use holding::{Holding, TokenRecord, UNKNOWN_TOKEN_NAME};
pub use mints::{AmountError, MintPair, SwapAmount, RAYDIUM_AMM_V4_PROGRAM_ID, WSOL_MINT};
pub use risk_report::{MarketAccounts, RiskFinding, RiskReport, TopHolder};
pub use risk_rules::{duplicate_reason, RiskDecision, RiskRule, RiskRuleSet, RuleBook, RISK_RULES};
pub use transaction::{
    extract_pool_mints, InnerSwap, ParsedInstruction, ParsedTransaction, PoolMintError, SwapEvent,
    TokenTransfer,
};
pub use valuation::{value_swap, SwapValuation, ValuationError};
