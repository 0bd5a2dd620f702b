//! Chain submitter
//!
//! Deserializes the aggregator's unsigned transaction, refreshes its
//! blockhash, signs it with the trading wallet and broadcasts it. Reads and
//! submission may go to different RPC endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::transaction::VersionedTransaction;

use super::rpc::{SolanaClient, SolanaClientError};
use super::wallet::WalletManager;
use crate::ports::chain::{ChainError, ChainPort};
use crate::ports::execution::BuiltTransaction;

/// Interval between two signature-status polls
pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

impl From<SolanaClientError> for ChainError {
    fn from(err: SolanaClientError) -> Self {
        match err {
            SolanaClientError::InvalidPublicKey(msg) | SolanaClientError::InvalidSignature(msg) => {
                ChainError::InvalidAddress(msg)
            }
            other => ChainError::Rpc(other.to_string()),
        }
    }
}

pub struct SolanaSubmitter {
    read_rpc: SolanaClient,
    submit_rpc: SolanaClient,
    wallet: Arc<WalletManager>,
    poll_interval: Duration,
}

impl SolanaSubmitter {
    pub fn new(read_rpc: SolanaClient, submit_rpc: SolanaClient, wallet: Arc<WalletManager>) -> Self {
        Self {
            read_rpc,
            submit_rpc,
            wallet,
            poll_interval: CONFIRM_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Decode and deserialize the payload, then sign it against `blockhash`
    fn prepare(
        &self,
        tx: &BuiltTransaction,
        blockhash: solana_sdk::hash::Hash,
    ) -> Result<VersionedTransaction, ChainError> {
        let bytes = tx.decode().map_err(|e| ChainError::Decode(e.to_string()))?;
        let unsigned: VersionedTransaction =
            bincode::deserialize(&bytes).map_err(|e| ChainError::Decode(e.to_string()))?;

        let mut message = unsigned.message;
        message.set_recent_blockhash(blockhash);

        self.wallet
            .sign_versioned(message)
            .map_err(|e| ChainError::Signing(e.to_string()))
    }
}

#[async_trait]
impl ChainPort for SolanaSubmitter {
    fn wallet_public_key(&self) -> String {
        self.wallet.public_key()
    }

    async fn submit(&self, tx: &BuiltTransaction) -> Result<String, ChainError> {
        let blockhash = self.read_rpc.get_latest_blockhash().await?;
        let signed = self.prepare(tx, blockhash)?;

        let signature = self.submit_rpc.send_transaction(signed).await?;
        tracing::info!("Raw transaction id received: {}", signature);
        Ok(signature)
    }

    async fn confirm(&self, signature: &str) -> Result<(), ChainError> {
        let commitment = CommitmentConfig::confirmed();
        loop {
            if let Some(status) = self.read_rpc.get_signature_status(signature).await? {
                if let Some(err) = status.err.as_ref() {
                    return Err(ChainError::TransactionFailed {
                        signature: signature.to_string(),
                        reason: err.to_string(),
                    });
                }
                if status.satisfies_commitment(commitment) {
                    tracing::info!("Transaction confirmed: {}", signature);
                    return Ok(());
                }
            }
            tracing::debug!("Waiting for confirmation of {}", signature);
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn token_balance(&self, owner: &str, mint: &str) -> Result<u64, ChainError> {
        if mint == spl_token::native_mint::id().to_string() {
            return Ok(self.read_rpc.get_balance(owner).await?);
        }
        Ok(self.read_rpc.get_token_balance_by_owner(owner, mint).await?)
    }
}
