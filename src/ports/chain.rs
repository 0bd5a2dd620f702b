//! Chain port: signing, submission, confirmation and balance reads

use async_trait::async_trait;
use thiserror::Error;

use super::execution::BuiltTransaction;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction decode failed: {0}")]
    Decode(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction {signature} failed on chain: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

#[async_trait]
pub trait ChainPort: Send + Sync {
    /// Base58 address of the trading wallet
    fn wallet_public_key(&self) -> String;

    /// Refresh blockhash, sign and broadcast; returns the signature
    async fn submit(&self, tx: &BuiltTransaction) -> Result<String, ChainError>;

    /// Wait until `signature` reaches confirmed commitment.
    ///
    /// Polls until the transaction confirms or is reported failed; callers
    /// bound the wait.
    async fn confirm(&self, signature: &str) -> Result<(), ChainError>;

    /// Raw token balance (base units) of `owner` for `mint`
    async fn token_balance(&self, owner: &str, mint: &str) -> Result<u64, ChainError>;
}
