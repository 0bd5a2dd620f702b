//! In-memory port implementations that record calls and return scripted
//! responses. Used by unit tests and the integration suite.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::chain::{ChainError, ChainPort};
use super::execution::{
    BuiltTransaction, ExecutionError, QuoteParams, QuoteProvider, SwapBuildParams, SwapBuilder,
    SwapQuote,
};
use super::market_data::{MarketDataError, PriceOracle, RiskReportSource, TransactionDetailSource};
use crate::domain::{ParsedTransaction, RiskReport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transaction detail source answering from a script, then a fallback
#[derive(Debug, Default)]
pub struct ScriptedDetailSource {
    calls: Arc<Mutex<Vec<String>>>,
    script: Arc<Mutex<VecDeque<Result<ParsedTransaction, MarketDataError>>>>,
    fallback: Arc<Mutex<HashMap<String, ParsedTransaction>>>,
}

impl ScriptedDetailSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot answer, consumed in order before any fallback
    pub fn then(self, response: Result<ParsedTransaction, MarketDataError>) -> Self {
        lock(&self.script).push_back(response);
        self
    }

    /// Answer returned for `tx.signature` once the script is exhausted
    pub fn with_transaction(self, tx: ParsedTransaction) -> Self {
        lock(&self.fallback).insert(tx.signature.clone(), tx);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl TransactionDetailSource for ScriptedDetailSource {
    async fn fetch_transaction(&self, signature: &str) -> Result<ParsedTransaction, MarketDataError> {
        lock(&self.calls).push(signature.to_string());
        if let Some(response) = lock(&self.script).pop_front() {
            return response;
        }
        lock(&self.fallback)
            .get(signature)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(signature.to_string()))
    }
}

/// Risk reports keyed by mint
#[derive(Debug, Default)]
pub struct StaticReportSource {
    calls: Arc<Mutex<Vec<String>>>,
    reports: Arc<Mutex<HashMap<String, RiskReport>>>,
}

impl StaticReportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(self, report: RiskReport) -> Self {
        lock(&self.reports).insert(report.mint.clone(), report);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RiskReportSource for StaticReportSource {
    async fn fetch_report(&self, mint: &str) -> Result<RiskReport, MarketDataError> {
        lock(&self.calls).push(mint.to_string());
        lock(&self.reports)
            .get(mint)
            .cloned()
            .ok_or_else(|| MarketDataError::Status {
                status: 404,
                body: format!("no report for {}", mint),
            })
    }
}

/// Fixed reference prices keyed by mint
#[derive(Debug, Default)]
pub struct StaticPriceOracle {
    calls: Arc<Mutex<Vec<String>>>,
    prices: Arc<Mutex<HashMap<String, f64>>>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, mint: &str, price: f64) -> Self {
        lock(&self.prices).insert(mint.to_string(), price);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn reference_price(&self, mint: &str) -> Result<f64, MarketDataError> {
        lock(&self.calls).push(mint.to_string());
        lock(&self.prices)
            .get(mint)
            .copied()
            .ok_or_else(|| MarketDataError::NoPriceData(mint.to_string()))
    }
}

/// Quote provider answering from a script, then with a quote that mirrors
/// the request
#[derive(Debug, Default)]
pub struct ScriptedQuoteProvider {
    calls: Arc<Mutex<Vec<QuoteParams>>>,
    script: Arc<Mutex<VecDeque<Result<SwapQuote, ExecutionError>>>>,
}

impl ScriptedQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, response: Result<SwapQuote, ExecutionError>) -> Self {
        lock(&self.script).push_back(response);
        self
    }

    /// Queue `count` not-tradable answers
    pub fn not_tradable_times(self, count: usize) -> Self {
        for _ in 0..count {
            lock(&self.script).push_back(Err(ExecutionError::NotTradable(
                "400 Bad Request: no route".to_string(),
            )));
        }
        self
    }

    pub fn get_calls(&self) -> Vec<QuoteParams> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl QuoteProvider for ScriptedQuoteProvider {
    async fn quote(&self, params: &QuoteParams) -> Result<SwapQuote, ExecutionError> {
        lock(&self.calls).push(params.clone());
        if let Some(response) = lock(&self.script).pop_front() {
            return response;
        }
        Ok(SwapQuote {
            input_mint: params.input_mint.clone(),
            output_mint: params.output_mint.clone(),
            in_amount: params.amount.to_string(),
            out_amount: "1000000".to_string(),
            route: vec!["Raydium".to_string()],
            raw: serde_json::json!({
                "inputMint": params.input_mint,
                "outputMint": params.output_mint,
                "inAmount": params.amount.as_str(),
                "outAmount": "1000000",
            }),
        })
    }
}

/// Swap builder that returns a fixed base58 payload or a fixed error
#[derive(Debug, Default)]
pub struct StubSwapBuilder {
    calls: Arc<Mutex<Vec<(SwapQuote, SwapBuildParams)>>>,
    failure: Arc<Mutex<Option<ExecutionError>>>,
}

impl StubSwapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, error: ExecutionError) -> Self {
        *lock(&self.failure) = Some(error);
        self
    }

    pub fn get_calls(&self) -> Vec<(SwapQuote, SwapBuildParams)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl SwapBuilder for StubSwapBuilder {
    async fn build_swap(
        &self,
        quote: &SwapQuote,
        params: &SwapBuildParams,
    ) -> Result<BuiltTransaction, ExecutionError> {
        lock(&self.calls).push((quote.clone(), params.clone()));
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        Ok(BuiltTransaction::new(bs58::encode([1u8, 2, 3, 4]).into_string()))
    }
}

/// How [`StubChain::confirm`] behaves
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmBehavior {
    Confirmed,
    Failed(String),
    /// Never resolves; exercises timeouts and cancellation
    Hang,
}

/// Chain stub with scripted confirmation and balances
#[derive(Debug)]
pub struct StubChain {
    wallet: String,
    submitted: Arc<Mutex<Vec<BuiltTransaction>>>,
    confirm_calls: Arc<Mutex<Vec<String>>>,
    confirm: Arc<Mutex<ConfirmBehavior>>,
    submit_failure: Arc<Mutex<Option<ChainError>>>,
    balances: Arc<Mutex<HashMap<String, u64>>>,
}

impl Default for StubChain {
    fn default() -> Self {
        Self {
            wallet: "Wa11et1111111111111111111111111111111111111".to_string(),
            submitted: Arc::default(),
            confirm_calls: Arc::default(),
            confirm: Arc::new(Mutex::new(ConfirmBehavior::Confirmed)),
            submit_failure: Arc::default(),
            balances: Arc::default(),
        }
    }
}

impl StubChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirm(self, behavior: ConfirmBehavior) -> Self {
        *lock(&self.confirm) = behavior;
        self
    }

    pub fn with_submit_failure(self, error: ChainError) -> Self {
        *lock(&self.submit_failure) = Some(error);
        self
    }

    pub fn with_balance(self, mint: &str, amount: u64) -> Self {
        lock(&self.balances).insert(mint.to_string(), amount);
        self
    }

    pub fn submitted(&self) -> Vec<BuiltTransaction> {
        lock(&self.submitted).clone()
    }

    pub fn confirm_calls(&self) -> Vec<String> {
        lock(&self.confirm_calls).clone()
    }
}

#[async_trait]
impl ChainPort for StubChain {
    fn wallet_public_key(&self) -> String {
        self.wallet.clone()
    }

    async fn submit(&self, tx: &BuiltTransaction) -> Result<String, ChainError> {
        if let Some(error) = lock(&self.submit_failure).clone() {
            return Err(error);
        }
        let mut submitted = lock(&self.submitted);
        submitted.push(tx.clone());
        Ok(format!("Sig{}", submitted.len()))
    }

    async fn confirm(&self, signature: &str) -> Result<(), ChainError> {
        lock(&self.confirm_calls).push(signature.to_string());
        let behavior = lock(&self.confirm).clone();
        match behavior {
            ConfirmBehavior::Confirmed => Ok(()),
            ConfirmBehavior::Failed(reason) => Err(ChainError::TransactionFailed {
                signature: signature.to_string(),
                reason,
            }),
            ConfirmBehavior::Hang => std::future::pending().await,
        }
    }

    async fn token_balance(&self, _owner: &str, mint: &str) -> Result<u64, ChainError> {
        Ok(lock(&self.balances).get(mint).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_detail_source_order() {
        let source = ScriptedDetailSource::new()
            .then(Err(MarketDataError::Http("timeout".into())));

        assert!(source.fetch_transaction("abc").await.is_err());
        assert!(matches!(
            source.fetch_transaction("abc").await,
            Err(MarketDataError::NotFound(_))
        ));
        assert_eq!(source.get_calls(), vec!["abc".to_string(), "abc".to_string()]);
    }

    #[tokio::test]
    async fn test_stub_chain_signatures() {
        let chain = StubChain::new().with_balance("Mint1", 42);
        let tx = BuiltTransaction::new("abc");

        assert_eq!(chain.submit(&tx).await.unwrap(), "Sig1");
        assert_eq!(chain.submit(&tx).await.unwrap(), "Sig2");
        assert_eq!(chain.token_balance("w", "Mint1").await.unwrap(), 42);
        assert_eq!(chain.token_balance("w", "Other").await.unwrap(), 0);
        assert!(chain.confirm("Sig1").await.is_ok());
    }
}
