//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: quote and swap-transaction API client
//! - Solana: RPC client, wallet management and transaction submission
//! - Market Data: Helius transaction details, RugCheck reports, Jupiter prices
//! - Ledger: JSON-file holdings store
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod jupiter;
pub mod ledger;
pub mod market_data;
pub mod solana;

#[cfg(test)]
mod test_support;

pub use cli::CliApp;
pub use jupiter::JupiterClient;
pub use ledger::FileLedger;
pub use market_data::{HeliusClient, JupiterPriceClient, RugCheckClient};
pub use solana::{SolanaClient, SolanaSubmitter, WalletManager};
