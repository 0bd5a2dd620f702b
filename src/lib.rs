//! Raydium Sniper Library
//!
//! Buys tokens from newly created Raydium liquidity pools on Solana, after a
//! token-safety report passes the configured risk rules, and tracks the
//! resulting holdings until they are sold.
//!
//! # Modules
//!
//! - `domain`: Pool-mint extraction, risk rules, holdings and valuation
//! - `ports`: Trait abstractions (TransactionDetailSource, QuoteProvider, ChainPort, HoldingsLedger)
//! - `adapters`: External implementations (Helius, RugCheck, Jupiter, Solana, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Retry helper and the buy and sell pipelines

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
