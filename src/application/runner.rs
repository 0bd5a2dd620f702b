//! Trade runner
//!
//! Runs buy pipelines as independent tasks, at most `concurrency` at a time.
//! The shared cancellation token stops waiting tasks and interrupts retries
//! and confirmation waits of running ones.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::error::{PipelineError, Stage, TradeError};
use super::pipeline::{BuyReport, BuyState, TradePipeline};

pub struct TradeRunner {
    pipeline: Arc<TradePipeline>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl TradeRunner {
    pub fn new(pipeline: Arc<TradePipeline>, concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
        }
    }

    /// Buy from every pool signature; reports come back in input order
    pub async fn run_buys(&self, signatures: Vec<String>) -> Vec<BuyReport> {
        let mut tasks = JoinSet::new();

        for (index, signature) in signatures.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let permits = Arc::clone(&self.permits);
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = permits.acquire_owned() => permit.ok(),
                };
                let report = match permit {
                    Some(_permit) => pipeline.buy(&signature, &cancel).await,
                    None => not_started(signature),
                };
                (index, report)
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(e) => tracing::error!("Buy task aborted: {}", e),
            }
        }

        reports.sort_by_key(|(index, _)| *index);
        reports.into_iter().map(|(_, report)| report).collect()
    }
}

fn not_started(pool_signature: String) -> BuyReport {
    tracing::info!("Shutdown before buy of {} started", pool_signature);
    BuyReport {
        pool_signature,
        states: vec![BuyState::Resolving, BuyState::Failed],
        result: Err(PipelineError::new(Stage::Resolving, None, TradeError::Cancelled)),
    }
}
