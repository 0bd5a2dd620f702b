//! Solana JSON-RPC client
//!
//! `RpcClient` is blocking; every call runs on the blocking pool so the
//! pipelines never stall the runtime.

use solana_client::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionStatus;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Unexpected account data: {0}")]
    AccountData(String),
}

#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

fn parse_pubkey(value: &str) -> Result<Pubkey, SolanaClientError> {
    Pubkey::from_str(value).map_err(|e| SolanaClientError::InvalidPublicKey(format!("{}: {}", value, e)))
}

/// Raw `tokenAmount.amount` of a jsonParsed SPL token account
pub fn parsed_token_amount(data: &serde_json::Value) -> Option<u64> {
    data["parsed"]["info"]["tokenAmount"]["amount"]
        .as_str()
        .and_then(|amount| amount.parse().ok())
}

impl SolanaClient {
    /// Client at `confirmed` commitment
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()));
        Self { client }
    }

    /// Run a blocking RPC call off the async runtime
    async fn blocking<T, F>(&self, call: F) -> Result<T, SolanaClientError>
    where
        T: Send + 'static,
        F: FnOnce(&RpcClient) -> Result<T, SolanaClientError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || call(&client))
            .await
            .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Native SOL balance, lamports
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = parse_pubkey(pubkey)?;
        self.blocking(move |client| {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
    }

    /// Sum of raw balances over every token account `owner` holds for `mint`
    pub async fn get_token_balance_by_owner(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<u64, SolanaClientError> {
        let owner = parse_pubkey(owner)?;
        let mint = parse_pubkey(mint)?;

        let accounts = self
            .blocking(move |client| {
                client
                    .get_token_accounts_by_owner(&owner, TokenAccountsFilter::Mint(mint))
                    .map_err(|e| SolanaClientError::RpcError(e.to_string()))
            })
            .await?;

        let mut total: u64 = 0;
        for keyed in accounts {
            let data = serde_json::to_value(&keyed.account.data)
                .map_err(|e| SolanaClientError::AccountData(e.to_string()))?;
            let amount = parsed_token_amount(&data).ok_or_else(|| {
                SolanaClientError::AccountData(format!("no token amount for account {}", keyed.pubkey))
            })?;
            total = total.saturating_add(amount);
        }
        Ok(total)
    }

    /// Send a signed versioned transaction to the network
    pub async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<String, SolanaClientError> {
        self.blocking(move |client| {
            client
                .send_transaction(&transaction)
                .map(|sig| sig.to_string())
                .map_err(|e| SolanaClientError::TransactionError(e.to_string()))
        })
        .await
    }

    /// Current status of a signature, `None` while the cluster has not seen it
    pub async fn get_signature_status(
        &self,
        signature_str: &str,
    ) -> Result<Option<TransactionStatus>, SolanaClientError> {
        let signature = Signature::from_str(signature_str)
            .map_err(|e| SolanaClientError::InvalidSignature(e.to_string()))?;

        self.blocking(move |client| {
            client
                .get_signature_statuses(&[signature])
                .map(|response| response.value.into_iter().next().flatten())
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
    }

    /// Blockhash the swap transaction is re-signed against
    pub async fn get_latest_blockhash(&self) -> Result<Hash, SolanaClientError> {
        self.blocking(|client| {
            client
                .get_latest_blockhash()
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
    }
}
