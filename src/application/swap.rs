//! Swap acquisition: quote, then build
//!
//! Quotes are retried only while the aggregator reports the pool as not yet
//! routable. Building is a single attempt; a stale build is never reused.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::TradeError;
use super::retry::{retry, RetryError, RetryPolicy};
use crate::domain::Backoff;
use crate::ports::{
    BuiltTransaction, ExecutionError, PriorityFee, QuoteParams, QuoteProvider, SwapBuildParams,
    SwapBuilder, SwapQuote,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TradabilityRetry {
    pub max_attempts: u32,
    pub delay: Backoff,
}

pub struct SwapAcquirer {
    quotes: Arc<dyn QuoteProvider>,
    builder: Arc<dyn SwapBuilder>,
    tradability: TradabilityRetry,
    verbose_log: bool,
}

impl SwapAcquirer {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        builder: Arc<dyn SwapBuilder>,
        tradability: TradabilityRetry,
    ) -> Self {
        Self {
            quotes,
            builder,
            tradability,
            verbose_log: false,
        }
    }

    /// Log quote and swap payloads at debug
    pub fn with_verbose_log(mut self, verbose_log: bool) -> Self {
        self.verbose_log = verbose_log;
        self
    }

    pub async fn quote(
        &self,
        params: &QuoteParams,
        cancel: &CancellationToken,
    ) -> Result<SwapQuote, TradeError> {
        let policy = RetryPolicy::new(self.tradability.max_attempts, self.tradability.delay);
        let result = retry(
            "swap quote",
            &policy,
            cancel,
            |_| self.quotes.quote(params),
            ExecutionError::is_not_tradable,
        )
        .await;

        match result {
            Ok(quote) => {
                tracing::info!(
                    "Swap quote received: {} {} -> {} {} via {}",
                    quote.in_amount,
                    quote.input_mint,
                    quote.out_amount,
                    quote.output_mint,
                    quote.route.join(" > ")
                );
                if self.verbose_log {
                    tracing::debug!("Quote payload: {}", quote.raw);
                }
                Ok(quote)
            }
            Err(RetryError::Exhausted { attempts, last }) => Err(TradeError::NotTradable {
                attempts,
                last: last.to_string(),
            }),
            Err(RetryError::Fatal(e)) => Err(e.into()),
            Err(RetryError::Cancelled) => Err(TradeError::Cancelled),
        }
    }

    pub async fn build(
        &self,
        quote: &SwapQuote,
        user_public_key: &str,
        priority_fee: &PriorityFee,
        dynamic_slippage_max_bps: u16,
    ) -> Result<BuiltTransaction, TradeError> {
        let params = SwapBuildParams {
            user_public_key: user_public_key.to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_slippage_max_bps,
            priority_fee: priority_fee.clone(),
        };

        let built = self.builder.build_swap(quote, &params).await?;
        if self.verbose_log {
            tracing::debug!(
                "Swap transaction built ({} chars, valid until {:?})",
                built.encoded.len(),
                built.last_valid_block_height
            );
        }
        tracing::info!("Swap transaction serialized");
        Ok(built)
    }
}
