//! Helius enhanced-transaction client
//!
//! Posts a signature to the parsed-transactions endpoint and maps the
//! response to the domain transaction view. Only instructions and the swap
//! event survive the mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{InnerSwap, ParsedInstruction, ParsedTransaction, SwapEvent, TokenTransfer};
use crate::ports::market_data::{MarketDataError, TransactionDetailSource};

#[derive(Debug, Serialize)]
struct TransactionsRequest<'a> {
    transactions: [&'a str; 1],
    commitment: &'a str,
    encoding: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTransaction {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub instructions: Vec<EnhancedInstruction>,
    #[serde(default)]
    pub events: EnhancedEvents,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedInstruction {
    #[serde(default)]
    pub accounts: Vec<String>,
    pub program_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnhancedEvents {
    #[serde(default)]
    pub swap: Option<EnhancedSwap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSwap {
    #[serde(default)]
    pub inner_swaps: Vec<EnhancedInnerSwap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedInnerSwap {
    #[serde(default)]
    pub token_inputs: Vec<EnhancedTransfer>,
    #[serde(default)]
    pub token_outputs: Vec<EnhancedTransfer>,
    #[serde(default)]
    pub program_info: Option<ProgramInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedTransfer {
    pub mint: String,
    /// UI amount
    pub token_amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    #[serde(default)]
    pub source: Option<String>,
}

impl From<EnhancedTransaction> for ParsedTransaction {
    fn from(tx: EnhancedTransaction) -> Self {
        let transfers = |list: Vec<EnhancedTransfer>| -> Vec<TokenTransfer> {
            list.into_iter()
                .map(|t| TokenTransfer {
                    mint: t.mint,
                    amount: t.token_amount,
                })
                .collect()
        };

        let swap = tx.events.swap.map(|swap| SwapEvent {
            inner_swaps: swap
                .inner_swaps
                .into_iter()
                .map(|inner| InnerSwap {
                    token_inputs: transfers(inner.token_inputs),
                    token_outputs: transfers(inner.token_outputs),
                    program: inner.program_info.and_then(|p| p.source),
                })
                .collect(),
        });

        ParsedTransaction {
            signature: tx.signature,
            fee: tx.fee,
            slot: tx.slot,
            timestamp: tx.timestamp,
            source: tx.source,
            instructions: tx
                .instructions
                .into_iter()
                .map(|ix| ParsedInstruction {
                    program_id: ix.program_id,
                    accounts: ix.accounts,
                })
                .collect(),
            swap,
        }
    }
}

/// Client for the enhanced-transactions endpoint
#[derive(Debug, Clone)]
pub struct HeliusClient {
    http: Client,
    transactions_url: String,
}

impl HeliusClient {
    /// `transactions_url` is the full endpoint, api key included
    pub fn new(transactions_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        Ok(Self {
            http,
            transactions_url: transactions_url.into(),
        })
    }
}

#[async_trait]
impl TransactionDetailSource for HeliusClient {
    async fn fetch_transaction(&self, signature: &str) -> Result<ParsedTransaction, MarketDataError> {
        let request = TransactionsRequest {
            transactions: [signature],
            commitment: "finalized",
            encoding: "jsonParsed",
        };

        let response = self
            .http
            .post(&self.transactions_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let transactions: Vec<EnhancedTransaction> = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        transactions
            .into_iter()
            .next()
            .map(ParsedTransaction::from)
            .ok_or_else(|| MarketDataError::NotFound(signature.to_string()))
    }
}
