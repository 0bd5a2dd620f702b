//! Market data ports: indexed transactions, risk reports, reference prices

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ParsedTransaction, RiskReport};

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Indexer answered but does not know the transaction yet
    #[error("Transaction {0} not indexed yet")]
    NotFound(String),

    #[error("No price data for {0}")]
    NoPriceData(String),
}

impl MarketDataError {
    /// Worth another attempt under the transaction-detail backoff
    pub fn is_transient(&self) -> bool {
        match self {
            MarketDataError::Http(_) | MarketDataError::NotFound(_) => true,
            MarketDataError::Status { status, .. } => *status == 429 || *status >= 500,
            MarketDataError::Malformed(_) | MarketDataError::NoPriceData(_) => false,
        }
    }
}

/// Enhanced-transaction indexer
#[async_trait]
pub trait TransactionDetailSource: Send + Sync {
    async fn fetch_transaction(&self, signature: &str) -> Result<ParsedTransaction, MarketDataError>;
}

/// Third-party token-safety report
#[async_trait]
pub trait RiskReportSource: Send + Sync {
    async fn fetch_report(&self, mint: &str) -> Result<RiskReport, MarketDataError>;
}

/// Reference (USD) price of a mint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn reference_price(&self, mint: &str) -> Result<f64, MarketDataError>;
}
