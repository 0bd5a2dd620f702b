//! Configuration Loader
//!
//! Loads and validates the sniper's TOML tuning file. Every section and
//! field is optional; missing values take the defaults below.

use serde::{Deserialize, Deserializer};
use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::application::{
    PipelineSettings, ResolverConfig, RetryPolicy, TradabilityRetry, TradeConfig,
};
use crate::domain::{Backoff, RiskRuleSet, SwapAmount, RAYDIUM_AMM_V4_PROGRAM_ID, WSOL_MINT};
use crate::ports::PriorityFee;

/// Main configuration structure matching sniper.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub liquidity_pool: LiquidityPoolSection,
    pub tx: TxSection,
    pub swap: SwapSection,
    pub sell: SellSection,
    pub rug_check: RugCheckSection,
}

/// Pool program and quote asset
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LiquidityPoolSection {
    pub program_id: String,
    pub quote_mint: String,
}

impl Default for LiquidityPoolSection {
    fn default() -> Self {
        Self {
            program_id: RAYDIUM_AMM_V4_PROGRAM_ID.to_string(),
            quote_mint: WSOL_MINT.to_string(),
        }
    }
}

/// Transaction fetching and submission timing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TxSection {
    /// Attempts at fetching the pool-creation transaction
    pub fetch_tx_max_retries: u32,
    /// Wait before the first fetch, indexer lag
    pub fetch_tx_initial_delay_ms: u64,
    /// Wait between approval and the first buy quote
    pub swap_tx_initial_delay_ms: u64,
    /// HTTP timeout for every API call
    pub get_timeout_ms: u64,
    /// Buy pipelines running at once
    pub concurrent_transactions: usize,
    /// Wait between swap-detail fetches after a buy
    pub retry_delay_ms: u64,
    pub confirmation_timeout_ms: u64,
}

impl Default for TxSection {
    fn default() -> Self {
        Self {
            fetch_tx_max_retries: 10,
            fetch_tx_initial_delay_ms: 3_000,
            swap_tx_initial_delay_ms: 1_000,
            get_timeout_ms: 10_000,
            concurrent_transactions: 1,
            retry_delay_ms: 500,
            confirmation_timeout_ms: 30_000,
        }
    }
}

/// Buy-side swap configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SwapSection {
    pub verbose_log: bool,
    pub prio_fee_max_lamports: u64,
    /// Jupiter priority level: min, low, medium, high, veryHigh, unsafeMax
    pub prio_level: String,
    /// Buy size in lamports
    pub amount: SwapAmount,
    #[serde(deserialize_with = "deserialize_bps")]
    pub slippage_bps: u16,
    pub dynamic_slippage_max_bps: u16,
    pub token_not_tradable_400_error_retries: u32,
    pub token_not_tradable_400_error_delay_ms: u64,
    pub holdings_path: String,
}

impl Default for SwapSection {
    fn default() -> Self {
        Self {
            verbose_log: false,
            prio_fee_max_lamports: 1_000_000,
            prio_level: "veryHigh".to_string(),
            amount: default_buy_amount(),
            slippage_bps: 200,
            dynamic_slippage_max_bps: 300,
            token_not_tradable_400_error_retries: 5,
            token_not_tradable_400_error_delay_ms: 2_000,
            holdings_path: "data/holdings.json".to_string(),
        }
    }
}

/// Sell-side swap configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SellSection {
    pub prio_fee_max_lamports: u64,
    pub prio_level: String,
    #[serde(deserialize_with = "deserialize_bps")]
    pub slippage_bps: u16,
}

impl Default for SellSection {
    fn default() -> Self {
        Self {
            prio_fee_max_lamports: 1_000_000,
            prio_level: "veryHigh".to_string(),
            slippage_bps: 200,
        }
    }
}

/// Risk rules plus report logging and simulation switches
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RugCheckSection {
    pub verbose_log: bool,
    /// Evaluate only, never buy
    pub simulation_mode: bool,
    #[serde(flatten)]
    pub rules: RiskRuleSet,
}

impl Default for RugCheckSection {
    fn default() -> Self {
        Self {
            verbose_log: false,
            simulation_mode: true,
            rules: RiskRuleSet::default(),
        }
    }
}

const PRIORITY_LEVELS: [&str; 6] = ["min", "low", "medium", "high", "veryHigh", "unsafeMax"];

/// 0.01 SOL
const DEFAULT_BUY_LAMPORTS: NonZeroU64 = match NonZeroU64::new(10_000_000) {
    Some(lamports) => lamports,
    None => panic!("buy amount must be positive"),
};

fn default_buy_amount() -> SwapAmount {
    SwapAmount::from(DEFAULT_BUY_LAMPORTS)
}

/// Basis points written either as a number or as a quoted number
fn deserialize_bps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bps {
        Number(u16),
        Text(String),
    }

    match Bps::deserialize(deserializer)? {
        Bps::Number(n) => Ok(n),
        Bps::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid basis points: {}", s))),
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Environment error: {0}")]
    EnvError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidity_pool.program_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "liquidity_pool.program_id must not be empty".to_string(),
            ));
        }
        if self.liquidity_pool.quote_mint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "liquidity_pool.quote_mint must not be empty".to_string(),
            ));
        }

        if self.tx.fetch_tx_max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "tx.fetch_tx_max_retries must be > 0".to_string(),
            ));
        }
        if self.tx.get_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tx.get_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.tx.concurrent_transactions == 0 {
            return Err(ConfigError::ValidationError(
                "tx.concurrent_transactions must be > 0".to_string(),
            ));
        }
        if self.tx.confirmation_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tx.confirmation_timeout_ms must be > 0".to_string(),
            ));
        }

        for (section, bps) in [
            ("swap.slippage_bps", self.swap.slippage_bps),
            ("swap.dynamic_slippage_max_bps", self.swap.dynamic_slippage_max_bps),
            ("sell.slippage_bps", self.sell.slippage_bps),
        ] {
            if bps > 10_000 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be 0-10000, got {}",
                    section, bps
                )));
            }
        }

        for (section, level) in [
            ("swap.prio_level", &self.swap.prio_level),
            ("sell.prio_level", &self.sell.prio_level),
        ] {
            if !PRIORITY_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be one of {:?}, got {}",
                    section, PRIORITY_LEVELS, level
                )));
            }
        }

        if self.swap.token_not_tradable_400_error_retries == 0 {
            return Err(ConfigError::ValidationError(
                "swap.token_not_tradable_400_error_retries must be > 0".to_string(),
            ));
        }
        if self.swap.holdings_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "swap.holdings_path must not be empty".to_string(),
            ));
        }

        let rules = &self.rug_check.rules;
        if !(0.0..=100.0).contains(&rules.max_allowed_pct_topholders) {
            return Err(ConfigError::ValidationError(format!(
                "rug_check.max_allowed_pct_topholders must be 0-100, got {}",
                rules.max_allowed_pct_topholders
            )));
        }
        if rules.min_total_market_liquidity < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "rug_check.min_total_market_liquidity must be >= 0, got {}",
                rules.min_total_market_liquidity
            )));
        }
        if rules.max_score < 0 {
            return Err(ConfigError::ValidationError(format!(
                "rug_check.max_score must be >= 0 (0 disables), got {}",
                rules.max_score
            )));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.tx.get_timeout_ms)
    }

    /// Freeze into the values the pipeline components are built from
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            resolver: ResolverConfig {
                program_id: self.liquidity_pool.program_id.clone(),
                quote_mint: self.liquidity_pool.quote_mint.clone(),
                initial_delay: Duration::from_millis(self.tx.fetch_tx_initial_delay_ms),
                max_attempts: self.tx.fetch_tx_max_retries,
                backoff: Backoff::transaction_details(),
            },
            rules: Arc::new(self.rug_check.rules.clone()),
            tradability: TradabilityRetry {
                max_attempts: self.swap.token_not_tradable_400_error_retries,
                delay: Backoff::fixed_ms(self.swap.token_not_tradable_400_error_delay_ms),
            },
            detail_retry: RetryPolicy::new(
                self.tx.fetch_tx_max_retries,
                Backoff::fixed_ms(self.tx.retry_delay_ms),
            ),
            trade: TradeConfig {
                buy_amount: self.swap.amount.clone(),
                buy_slippage_bps: self.swap.slippage_bps,
                buy_priority_fee: PriorityFee {
                    max_lamports: self.swap.prio_fee_max_lamports,
                    level: self.swap.prio_level.clone(),
                },
                sell_slippage_bps: self.sell.slippage_bps,
                sell_priority_fee: PriorityFee {
                    max_lamports: self.sell.prio_fee_max_lamports,
                    level: self.sell.prio_level.clone(),
                },
                dynamic_slippage_max_bps: self.swap.dynamic_slippage_max_bps,
                swap_start_delay: Duration::from_millis(self.tx.swap_tx_initial_delay_ms),
                confirmation_timeout: Duration::from_millis(self.tx.confirmation_timeout_ms),
                simulation_mode: self.rug_check.simulation_mode,
            },
            risk_verbose_log: self.rug_check.verbose_log,
            swap_verbose_log: self.swap.verbose_log,
        }
    }
}
