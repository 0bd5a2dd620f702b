//! Trade pipeline
//!
//! Buy: resolve the pool mints, evaluate risk, quote, build, submit, confirm,
//! then record the holding. Every state is entered in order and recorded in
//! the [`BuyReport`]; a holding is written only after confirmation.
//!
//! Sell: check the on-chain balance, then quote, build, submit and confirm;
//! the holding is removed only once the sell is confirmed.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::{PipelineError, Stage, TradeError};
use super::locks::MintLocks;
use super::resolver::{PoolResolver, ResolverConfig};
use super::retry::RetryPolicy;
use super::risk_evaluator::RiskEvaluator;
use super::swap::{SwapAcquirer, TradabilityRetry};
use super::valuation::PositionValuer;
use crate::domain::{Holding, MintPair, RiskDecision, RiskRuleSet, SwapAmount};
use crate::ports::{
    BuiltTransaction, ChainPort, HoldingsLedger, PriceOracle, PriorityFee, QuoteParams,
    QuoteProvider, RiskReportSource, SwapBuilder, TransactionDetailSource,
};

/// Trade sizing and execution tuning
#[derive(Debug, Clone, PartialEq)]
pub struct TradeConfig {
    pub buy_amount: SwapAmount,
    pub buy_slippage_bps: u16,
    pub buy_priority_fee: PriorityFee,
    pub sell_slippage_bps: u16,
    pub sell_priority_fee: PriorityFee,
    pub dynamic_slippage_max_bps: u16,
    /// Wait between approval and the first quote
    pub swap_start_delay: Duration,
    pub confirmation_timeout: Duration,
    /// Stop after an approved evaluation
    pub simulation_mode: bool,
}

/// Every tuning value the pipeline components need
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub resolver: ResolverConfig,
    pub rules: Arc<RiskRuleSet>,
    pub tradability: TradabilityRetry,
    pub detail_retry: RetryPolicy,
    pub trade: TradeConfig,
    pub risk_verbose_log: bool,
    pub swap_verbose_log: bool,
}

/// The external services a pipeline talks to
#[derive(Clone)]
pub struct PipelinePorts {
    pub details: Arc<dyn TransactionDetailSource>,
    pub reports: Arc<dyn RiskReportSource>,
    pub prices: Arc<dyn PriceOracle>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub swaps: Arc<dyn SwapBuilder>,
    pub chain: Arc<dyn ChainPort>,
    pub ledger: Arc<dyn HoldingsLedger>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuyState {
    Resolving,
    Evaluating,
    Quoting,
    Building,
    Submitting,
    Confirming,
    Recording,
    Done,
    Rejected,
    Simulated,
    Failed,
}

impl BuyState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuyState::Done | BuyState::Rejected | BuyState::Simulated | BuyState::Failed
        )
    }

    pub fn can_transition_to(self, next: BuyState) -> bool {
        use BuyState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Resolving, Evaluating)
            | (Evaluating, Quoting)
            | (Evaluating, Rejected)
            | (Evaluating, Simulated)
            | (Quoting, Building)
            | (Building, Submitting)
            | (Submitting, Confirming)
            | (Confirming, Recording)
            | (Recording, Done) => true,
            _ => false,
        }
    }

    fn stage(self) -> Stage {
        match self {
            BuyState::Resolving => Stage::Resolving,
            BuyState::Evaluating => Stage::Evaluating,
            BuyState::Quoting => Stage::Quoting,
            BuyState::Building => Stage::Building,
            BuyState::Submitting => Stage::Submitting,
            BuyState::Confirming => Stage::Confirming,
            _ => Stage::Recording,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuyOutcome {
    Rejected { mint: String, reason: String },
    Simulated { pair: MintPair },
    Bought { pair: MintPair, signature: String, holding: Holding },
}

/// Visited states plus the final result of one buy
#[derive(Debug)]
pub struct BuyReport {
    pub pool_signature: String,
    pub states: Vec<BuyState>,
    pub result: Result<BuyOutcome, PipelineError>,
}

/// Outcome of a sell attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SellResult {
    pub success: bool,
    pub message: Option<String>,
    pub transaction_id: Option<String>,
}

impl From<&PipelineError> for SellResult {
    fn from(err: &PipelineError) -> Self {
        let transaction_id = match &err.source {
            TradeError::ConfirmationTimeout { signature }
            | TradeError::ConfirmationUnknown { signature }
            | TradeError::TransactionFailed { signature, .. } => Some(signature.clone()),
            _ => None,
        };
        Self {
            success: false,
            message: Some(err.to_string()),
            transaction_id,
        }
    }
}

struct Trail<'a> {
    pool_signature: &'a str,
    mint: Option<String>,
    states: Vec<BuyState>,
}

impl<'a> Trail<'a> {
    fn new(pool_signature: &'a str) -> Self {
        tracing::info!(signature = %pool_signature, "Buy pipeline started");
        Self {
            pool_signature,
            mint: None,
            states: vec![BuyState::Resolving],
        }
    }

    fn current(&self) -> BuyState {
        self.states.last().copied().unwrap_or(BuyState::Resolving)
    }

    fn enter(&mut self, next: BuyState) {
        let from = self.current();
        debug_assert!(from.can_transition_to(next), "illegal transition {:?} -> {:?}", from, next);
        tracing::info!(
            signature = %self.pool_signature,
            mint = self.mint.as_deref().unwrap_or("-"),
            "{:?} -> {:?}",
            from,
            next
        );
        self.states.push(next);
    }

    fn fail(&mut self, source: impl Into<TradeError>) -> PipelineError {
        let err = PipelineError::new(self.current().stage(), self.mint.as_deref(), source);
        tracing::error!(signature = %self.pool_signature, "Buy failed: {}", err);
        self.enter(BuyState::Failed);
        err
    }
}

pub struct TradePipeline {
    resolver: PoolResolver,
    evaluator: RiskEvaluator,
    swap: SwapAcquirer,
    valuer: PositionValuer,
    chain: Arc<dyn ChainPort>,
    ledger: Arc<dyn HoldingsLedger>,
    locks: MintLocks,
    config: TradeConfig,
}

impl TradePipeline {
    pub fn new(ports: PipelinePorts, settings: PipelineSettings) -> Self {
        let resolver = PoolResolver::new(Arc::clone(&ports.details), settings.resolver);
        let evaluator = RiskEvaluator::new(ports.reports, Arc::clone(&ports.ledger), settings.rules)
            .with_verbose_log(settings.risk_verbose_log);
        let swap = SwapAcquirer::new(ports.quotes, ports.swaps, settings.tradability)
            .with_verbose_log(settings.swap_verbose_log);
        let valuer = PositionValuer::new(
            ports.details,
            ports.prices,
            Arc::clone(&ports.ledger),
            settings.detail_retry,
        );

        Self {
            resolver,
            evaluator,
            swap,
            valuer,
            chain: ports.chain,
            ledger: ports.ledger,
            locks: MintLocks::new(),
            config: settings.trade,
        }
    }

    /// Risk evaluation only
    pub async fn check(&self, mint: &str) -> Result<RiskDecision, PipelineError> {
        self.evaluator
            .evaluate(mint)
            .await
            .map_err(|e| PipelineError::new(Stage::Evaluating, Some(mint), e))
    }

    /// Run the buy pipeline for a pool-creation transaction
    pub async fn buy(&self, pool_signature: &str, cancel: &CancellationToken) -> BuyReport {
        let mut trail = Trail::new(pool_signature);
        let result = self.run_buy(pool_signature, cancel, &mut trail).await;
        BuyReport {
            pool_signature: pool_signature.to_string(),
            states: trail.states,
            result,
        }
    }

    async fn run_buy(
        &self,
        pool_signature: &str,
        cancel: &CancellationToken,
        trail: &mut Trail<'_>,
    ) -> Result<BuyOutcome, PipelineError> {
        let pair = self
            .resolver
            .resolve(pool_signature, cancel)
            .await
            .map_err(|e| trail.fail(e))?;
        trail.mint = Some(pair.token_mint.clone());

        trail.enter(BuyState::Evaluating);
        let decision = self
            .evaluator
            .evaluate(&pair.token_mint)
            .await
            .map_err(|e| trail.fail(e))?;

        if !decision.approved {
            trail.enter(BuyState::Rejected);
            return Ok(BuyOutcome::Rejected {
                mint: pair.token_mint,
                reason: decision.reason.unwrap_or_default(),
            });
        }

        if self.config.simulation_mode {
            tracing::info!("Simulation mode: not buying {}", pair.token_mint);
            trail.enter(BuyState::Simulated);
            return Ok(BuyOutcome::Simulated { pair });
        }

        trail.enter(BuyState::Quoting);
        if !self.config.swap_start_delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(trail.fail(TradeError::Cancelled)),
                _ = tokio::time::sleep(self.config.swap_start_delay) => {}
            }
        }

        let params = QuoteParams {
            input_mint: pair.sol_mint.clone(),
            output_mint: pair.token_mint.clone(),
            amount: self.config.buy_amount.clone(),
            slippage_bps: self.config.buy_slippage_bps,
        };
        let quote = self
            .swap
            .quote(&params, cancel)
            .await
            .map_err(|e| trail.fail(e))?;

        trail.enter(BuyState::Building);
        let built = self
            .swap
            .build(
                &quote,
                &self.chain.wallet_public_key(),
                &self.config.buy_priority_fee,
                self.config.dynamic_slippage_max_bps,
            )
            .await
            .map_err(|e| trail.fail(e))?;

        trail.enter(BuyState::Submitting);
        let signature = self.submit(&built, cancel).await.map_err(|e| trail.fail(e))?;

        trail.enter(BuyState::Confirming);
        self.confirm(&signature, cancel).await.map_err(|e| trail.fail(e))?;

        trail.enter(BuyState::Recording);
        let holding = self
            .record_buy(&pair, &signature)
            .await
            .map_err(|e| trail.fail(e))?;

        trail.enter(BuyState::Done);
        tracing::info!("Bought {} in {}", pair.token_mint, signature);
        Ok(BuyOutcome::Bought {
            pair,
            signature,
            holding,
        })
    }

    /// Value and persist a confirmed buy. Not cancellable: the position
    /// already exists on chain.
    async fn record_buy(&self, pair: &MintPair, signature: &str) -> Result<Holding, TradeError> {
        let not_persisted = |reason: String| TradeError::PositionNotPersisted {
            signature: signature.to_string(),
            reason,
        };

        let _guard = self.locks.acquire(&pair.token_mint).await;

        let holding = self
            .valuer
            .value(signature, &pair.sol_mint, &CancellationToken::new())
            .await
            .map_err(|e| not_persisted(e.to_string()))?;

        if holding.mint != pair.token_mint {
            return Err(not_persisted(format!(
                "swap received {} but the pool token is {}",
                holding.mint, pair.token_mint
            )));
        }

        self.ledger
            .upsert_holding(holding.clone())
            .await
            .map_err(|e| not_persisted(e.to_string()))?;
        Ok(holding)
    }

    /// Sell `amount` base units of `pair.token_mint` for `pair.sol_mint`
    pub async fn sell(
        &self,
        pair: &MintPair,
        amount: &SwapAmount,
        cancel: &CancellationToken,
    ) -> Result<SellResult, PipelineError> {
        let mint = pair.token_mint.as_str();
        let fail = |stage: Stage, source: TradeError| {
            let err = PipelineError::new(stage, Some(mint), source);
            tracing::error!("Sell failed: {}", err);
            err
        };

        let _guard = self.locks.acquire(mint).await;

        let wallet = self.chain.wallet_public_key();
        let balance = self
            .chain
            .token_balance(&wallet, mint)
            .await
            .map_err(|e| fail(Stage::BalanceCheck, e.into()))?;

        if balance == 0 || amount.as_u64() != Some(balance) {
            let mismatch = TradeError::BalanceMismatch {
                on_chain: balance,
                requested: amount.to_string(),
            };
            let removed = self
                .ledger
                .remove_holding(mint)
                .await
                .map_err(|e| fail(Stage::BalanceCheck, e.into()))?;
            tracing::warn!(
                "{} for {}; holding {}",
                mismatch,
                mint,
                if removed { "removed" } else { "already absent" }
            );
            return Ok(SellResult {
                success: false,
                message: Some(format!("Manual intervention required: {}", mismatch)),
                transaction_id: None,
            });
        }

        let params = QuoteParams {
            input_mint: pair.token_mint.clone(),
            output_mint: pair.sol_mint.clone(),
            amount: amount.clone(),
            slippage_bps: self.config.sell_slippage_bps,
        };
        let quote = self
            .swap
            .quote(&params, cancel)
            .await
            .map_err(|e| fail(Stage::Quoting, e))?;

        let built = self
            .swap
            .build(
                &quote,
                &wallet,
                &self.config.sell_priority_fee,
                self.config.dynamic_slippage_max_bps,
            )
            .await
            .map_err(|e| fail(Stage::Building, e))?;

        let signature = self
            .submit(&built, cancel)
            .await
            .map_err(|e| fail(Stage::Submitting, e))?;

        self.confirm(&signature, cancel)
            .await
            .map_err(|e| fail(Stage::Confirming, e))?;

        self.ledger
            .remove_holding(mint)
            .await
            .map_err(|e| fail(Stage::Recording, e.into()))?;

        tracing::info!("Sold {} {} in {}", amount, mint, signature);
        Ok(SellResult {
            success: true,
            message: None,
            transaction_id: Some(signature),
        })
    }

    /// Broadcast once. Cancellation is honoured before the send only, so a
    /// sent transaction always has a signature to report.
    async fn submit(
        &self,
        built: &BuiltTransaction,
        cancel: &CancellationToken,
    ) -> Result<String, TradeError> {
        if cancel.is_cancelled() {
            return Err(TradeError::Cancelled);
        }
        let signature = self.chain.submit(built).await?;
        tracing::info!("Transaction submitted: {}", signature);
        Ok(signature)
    }

    /// Wait for confirmation, bounded by the configured timeout
    async fn confirm(&self, signature: &str, cancel: &CancellationToken) -> Result<(), TradeError> {
        let wait = tokio::time::timeout(self.config.confirmation_timeout, self.chain.confirm(signature));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Shutdown while confirming {}; verify manually", signature);
                Err(TradeError::ConfirmationUnknown {
                    signature: signature.to_string(),
                })
            }
            result = wait => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => {
                    tracing::warn!(
                        "Confirmation of {} timed out after {:?}; it may still land",
                        signature,
                        self.config.confirmation_timeout
                    );
                    Err(TradeError::ConfirmationTimeout {
                        signature: signature.to_string(),
                    })
                }
            },
        }
    }
}
