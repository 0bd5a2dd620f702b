//! Pipeline error taxonomy

use std::fmt;

use thiserror::Error;

use crate::domain::{AmountError, PoolMintError, ValuationError};
use crate::ports::{ChainError, ExecutionError, LedgerError, MarketDataError};

/// Pipeline stage an error surfaced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolving,
    Evaluating,
    Quoting,
    Building,
    Submitting,
    Confirming,
    Recording,
    BalanceCheck,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::Evaluating => "evaluating",
            Stage::Quoting => "quoting",
            Stage::Building => "building",
            Stage::Submitting => "submitting",
            Stage::Confirming => "confirming",
            Stage::Recording => "recording",
            Stage::BalanceCheck => "balance check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Transient network failure: {0}")]
    TransientNetwork(String),

    #[error("Token not tradable after {attempts} attempts: {last}")]
    NotTradable { attempts: u32, last: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Pool mints not resolved after {attempts} attempts: {last}")]
    ResolutionFailed { attempts: u32, last: String },

    #[error("Balance mismatch: on-chain {on_chain}, requested {requested}")]
    BalanceMismatch { on_chain: u64, requested: String },

    #[error("Confirmation of {signature} timed out; verify manually")]
    ConfirmationTimeout { signature: String },

    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("Shutdown while confirming {signature}; status unknown, verify manually")]
    ConfirmationUnknown { signature: String },

    #[error("Position {signature} is confirmed on chain but was not recorded: {reason}")]
    PositionNotPersisted { signature: String, reason: String },

    #[error("Ledger write failed: {0}")]
    LedgerWriteFailure(#[from] LedgerError),

    #[error("Cancelled before submission")]
    Cancelled,

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ExecutionError> for TradeError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::NotTradable(last) => TradeError::NotTradable { attempts: 1, last },
            ExecutionError::MalformedResponse(msg) => TradeError::MalformedResponse(msg),
            other => TradeError::TransientNetwork(other.to_string()),
        }
    }
}

impl From<MarketDataError> for TradeError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::Malformed(msg) => TradeError::MalformedResponse(msg),
            other => TradeError::TransientNetwork(other.to_string()),
        }
    }
}

impl From<ChainError> for TradeError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::TransactionFailed { signature, reason } => {
                TradeError::TransactionFailed { signature, reason }
            }
            other => TradeError::Submission(other.to_string()),
        }
    }
}

impl From<PoolMintError> for TradeError {
    fn from(err: PoolMintError) -> Self {
        TradeError::ResolutionFailed {
            attempts: 1,
            last: err.to_string(),
        }
    }
}

impl From<AmountError> for TradeError {
    fn from(err: AmountError) -> Self {
        TradeError::InvalidRequest(err.to_string())
    }
}

/// Terminal pipeline failure with its stage and mint
#[derive(Debug, Error)]
#[error("{stage} failed for {}: {source}", .mint.as_deref().unwrap_or("unknown mint"))]
pub struct PipelineError {
    pub stage: Stage,
    pub mint: Option<String>,
    #[source]
    pub source: TradeError,
}

impl PipelineError {
    pub fn new(stage: Stage, mint: Option<&str>, source: impl Into<TradeError>) -> Self {
        Self {
            stage,
            mint: mint.map(str::to_string),
            source: source.into(),
        }
    }
}

/// Valuation or write failure after a confirmed buy
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Price lookup failed: {0}")]
    Price(MarketDataError),

    #[error("Swap details unavailable: {0}")]
    Details(String),

    #[error("Valuation failed: {0}")]
    Valuation(#[from] ValuationError),
}
