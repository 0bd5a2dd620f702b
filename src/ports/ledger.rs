//! Holdings ledger port
//!
//! Durable store of open positions and previously seen tokens. At most one
//! holding per mint: `upsert_holding` replaces, never duplicates.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Holding, TokenRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait HoldingsLedger: Send + Sync {
    async fn insert_token_record(&self, record: TokenRecord) -> Result<(), LedgerError>;

    /// Records matching `name` or `creator`
    async fn find_token_records(
        &self,
        name: &str,
        creator: &str,
    ) -> Result<Vec<TokenRecord>, LedgerError>;

    async fn find_token_records_by_mint(&self, mint: &str) -> Result<Vec<TokenRecord>, LedgerError>;

    async fn upsert_holding(&self, holding: Holding) -> Result<(), LedgerError>;

    /// Returns whether a holding was present
    async fn remove_holding(&self, mint: &str) -> Result<bool, LedgerError>;

    async fn find_holding_by_mint(&self, mint: &str) -> Result<Option<Holding>, LedgerError>;

    async fn list_holdings(&self) -> Result<Vec<Holding>, LedgerError>;
}
