//! Post-buy accounting
//!
//! Prices a confirmed buy from its indexed swap event and the quote asset's
//! reference price, producing the [`Holding`] to persist.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::RecordingError;
use super::retry::{retry, RetryError, RetryPolicy};
use crate::domain::{value_swap, Holding, UNKNOWN_TOKEN_NAME};
use crate::ports::{HoldingsLedger, MarketDataError, PriceOracle, TransactionDetailSource};

pub struct PositionValuer {
    details: Arc<dyn TransactionDetailSource>,
    prices: Arc<dyn PriceOracle>,
    ledger: Arc<dyn HoldingsLedger>,
    detail_retry: RetryPolicy,
}

impl PositionValuer {
    pub fn new(
        details: Arc<dyn TransactionDetailSource>,
        prices: Arc<dyn PriceOracle>,
        ledger: Arc<dyn HoldingsLedger>,
        detail_retry: RetryPolicy,
    ) -> Self {
        Self {
            details,
            prices,
            ledger,
            detail_retry,
        }
    }

    /// Value the confirmed swap `signature`; `quote_mint` is the asset paid in
    pub async fn value(
        &self,
        signature: &str,
        quote_mint: &str,
        cancel: &CancellationToken,
    ) -> Result<Holding, RecordingError> {
        let tx = retry(
            "fetch swap details",
            &self.detail_retry,
            cancel,
            |_| self.details.fetch_transaction(signature),
            MarketDataError::is_transient,
        )
        .await
        .map_err(|e| match e {
            RetryError::Exhausted { last, .. } | RetryError::Fatal(last) => {
                RecordingError::Details(last.to_string())
            }
            RetryError::Cancelled => RecordingError::Details("cancelled".to_string()),
        })?;

        let price = self
            .prices
            .reference_price(quote_mint)
            .await
            .map_err(RecordingError::Price)?;

        let valuation = value_swap(&tx, price)?;

        let token_name = match self.ledger.find_token_records_by_mint(&valuation.output_mint).await {
            Ok(records) => records
                .into_iter()
                .next()
                .map(|r| r.name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string()),
            Err(e) => {
                tracing::warn!("Token name lookup failed for {}: {}", valuation.output_mint, e);
                UNKNOWN_TOKEN_NAME.to_string()
            }
        };

        tracing::info!(
            "Swap valued: {} {} for {:.6} SOL (${:.4}, fee ${:.6})",
            valuation.tokens_received,
            token_name,
            valuation.sol_paid,
            valuation.sol_paid_reference,
            valuation.sol_fee_paid_reference
        );

        Ok(Holding {
            mint: valuation.output_mint,
            token_name,
            balance: valuation.tokens_received,
            sol_paid: valuation.sol_paid,
            sol_fee_paid: valuation.sol_fee_paid,
            sol_paid_reference: valuation.sol_paid_reference,
            sol_fee_paid_reference: valuation.sol_fee_paid_reference,
            per_token_reference: valuation.per_token_reference,
            slot: valuation.slot,
            time: valuation.time,
            program: valuation.program,
            entry_signature: signature.to_string(),
        })
    }
}
