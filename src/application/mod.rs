//! Application layer: the buy and sell pipelines and what they are built from

pub mod error;
pub mod locks;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod risk_evaluator;
pub mod runner;
pub mod swap;
pub mod valuation;

pub use error::{PipelineError, RecordingError, Stage, TradeError};
pub use locks::MintLocks;
pub use pipeline::{
    BuyOutcome, BuyReport, BuyState, PipelinePorts, PipelineSettings, SellResult, TradeConfig,
    TradePipeline,
};
pub use resolver::{PoolResolver, ResolverConfig};
pub use retry::{retry, RetryError, RetryPolicy};
pub use risk_evaluator::RiskEvaluator;
pub use runner::TradeRunner;
pub use swap::{SwapAcquirer, TradabilityRetry};
pub use valuation::PositionValuer;
