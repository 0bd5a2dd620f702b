//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Transaction details, risk reports and reference prices
//! - Swap quoting and building (Jupiter)
//! - Transaction submission and confirmation (Solana RPC)
//! - The holdings ledger

pub mod chain;
pub mod execution;
pub mod ledger;
pub mod market_data;
pub mod mocks;

// Re-export main traits and types
pub use chain::{ChainError, ChainPort};
pub use execution::{
    BuiltTransaction, ExecutionError, PriorityFee, QuoteParams, QuoteProvider, SwapBuildParams,
    SwapBuilder, SwapQuote,
};
pub use ledger::{HoldingsLedger, LedgerError};
pub use market_data::{MarketDataError, PriceOracle, RiskReportSource, TransactionDetailSource};
