//! Transaction-detail resolver
//!
//! Turns a pool-creation signature into the pool's [`MintPair`]. The indexer
//! lags the chain, so the first fetch is delayed and misses are retried on
//! the transaction-detail backoff.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::TradeError;
use super::retry::{retry, RetryError, RetryPolicy};
use crate::domain::{extract_pool_mints, Backoff, MintPair, PoolMintError};
use crate::ports::{MarketDataError, TransactionDetailSource};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub program_id: String,
    pub quote_mint: String,
    pub initial_delay: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// One failed resolution attempt
#[derive(Debug)]
enum AttemptError {
    Fetch(MarketDataError),
    Pool(PoolMintError),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            // Unparseable payloads are retried too: a partially indexed
            // transaction can come back truncated.
            AttemptError::Fetch(e) => e.is_transient() || matches!(e, MarketDataError::Malformed(_)),
            AttemptError::Pool(e) => e.is_retryable(),
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Fetch(e) => e.fmt(f),
            AttemptError::Pool(e) => e.fmt(f),
        }
    }
}

pub struct PoolResolver {
    source: Arc<dyn TransactionDetailSource>,
    config: ResolverConfig,
}

impl PoolResolver {
    pub fn new(source: Arc<dyn TransactionDetailSource>, config: ResolverConfig) -> Self {
        Self { source, config }
    }

    pub async fn resolve(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<MintPair, TradeError> {
        tracing::info!(
            "Waiting {:.1}s for {} to be indexed",
            self.config.initial_delay.as_secs_f64(),
            signature
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TradeError::Cancelled),
            _ = tokio::time::sleep(self.config.initial_delay) => {}
        }

        let policy = RetryPolicy::new(self.config.max_attempts, self.config.backoff);
        let result = retry(
            "fetch transaction details",
            &policy,
            cancel,
            |_| async move {
                let tx = self
                    .source
                    .fetch_transaction(signature)
                    .await
                    .map_err(AttemptError::Fetch)?;
                extract_pool_mints(&tx, &self.config.program_id, &self.config.quote_mint)
                    .map_err(AttemptError::Pool)
            },
            AttemptError::is_retryable,
        )
        .await;

        match result {
            Ok(pair) => {
                tracing::info!("Pool resolved: token {} / sol {}", pair.token_mint, pair.sol_mint);
                Ok(pair)
            }
            Err(RetryError::Exhausted { attempts, last }) => Err(TradeError::ResolutionFailed {
                attempts,
                last: last.to_string(),
            }),
            Err(RetryError::Fatal(AttemptError::Pool(e))) => Err(e.into()),
            Err(RetryError::Fatal(AttemptError::Fetch(e))) => Err(e.into()),
            Err(RetryError::Cancelled) => Err(TradeError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParsedInstruction, ParsedTransaction, RAYDIUM_AMM_V4_PROGRAM_ID, WSOL_MINT};
    use crate::ports::mocks::ScriptedDetailSource;
    use tokio::time::Instant;

    fn config() -> ResolverConfig {
        ResolverConfig {
            program_id: RAYDIUM_AMM_V4_PROGRAM_ID.to_string(),
            quote_mint: WSOL_MINT.to_string(),
            initial_delay: Duration::from_secs(3),
            max_attempts: 3,
            backoff: Backoff::transaction_details(),
        }
    }

    fn pool_tx(signature: &str, accounts: Vec<String>) -> ParsedTransaction {
        ParsedTransaction {
            signature: signature.to_string(),
            fee: 5_000,
            slot: 1,
            timestamp: 1_700_000_000,
            source: "RAYDIUM".to_string(),
            instructions: vec![ParsedInstruction {
                program_id: RAYDIUM_AMM_V4_PROGRAM_ID.to_string(),
                accounts,
            }],
            swap: None,
        }
    }

    fn pool_accounts(token: &str) -> Vec<String> {
        let mut accounts: Vec<String> = (0..8).map(|i| format!("Acc{}", i)).collect();
        accounts.push(token.to_string());
        accounts.push(WSOL_MINT.to_string());
        accounts
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_after_indexer_lag() {
        let source = Arc::new(
            ScriptedDetailSource::new()
                .then(Err(MarketDataError::NotFound("PoolSig".into())))
                .with_transaction(pool_tx("PoolSig", pool_accounts("NewToken111"))),
        );
        let resolver = PoolResolver::new(source.clone(), config());
        let started = Instant::now();

        let pair = resolver.resolve("PoolSig", &CancellationToken::new()).await.unwrap();

        assert_eq!(pair, MintPair::new("NewToken111", WSOL_MINT));
        assert_eq!(source.get_calls().len(), 2);
        // initial delay + first backoff step
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_instruction_exhausts_into_resolution_failed() {
        let mut tx = pool_tx("PoolSig", pool_accounts("NewToken111"));
        tx.instructions[0].program_id = "SomeOtherProgram".to_string();
        let source = Arc::new(ScriptedDetailSource::new().with_transaction(tx));
        let resolver = PoolResolver::new(source.clone(), config());

        let err = resolver.resolve("PoolSig", &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, TradeError::ResolutionFailed { attempts: 3, .. }));
        assert_eq!(source.get_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_mint_account_is_not_retried() {
        let mut accounts = pool_accounts("NewToken111");
        accounts[8] = String::new();
        let source = Arc::new(ScriptedDetailSource::new().with_transaction(pool_tx("PoolSig", accounts)));
        let resolver = PoolResolver::new(source.clone(), config());

        let err = resolver.resolve("PoolSig", &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, TradeError::ResolutionFailed { attempts: 1, .. }));
        assert_eq!(source.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_terminal() {
        let source = Arc::new(ScriptedDetailSource::new().then(Err(MarketDataError::Status {
            status: 401,
            body: "bad api key".into(),
        })));
        let resolver = PoolResolver::new(source.clone(), config());

        let err = resolver.resolve("PoolSig", &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, TradeError::TransientNetwork(_)));
        assert_eq!(source.get_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_initial_delay() {
        let source = Arc::new(ScriptedDetailSource::new());
        let resolver = PoolResolver::new(source.clone(), config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = resolver.resolve("PoolSig", &cancel).await.unwrap_err();

        assert!(matches!(err, TradeError::Cancelled));
        assert!(source.get_calls().is_empty());
    }
}
