//! Configuration Module
//!
//! Loads and validates the TOML tuning file and the environment endpoints.

pub mod env;
pub mod loader;

pub use env::{Endpoints, WalletSource};
pub use loader::{
    Config, ConfigError, LiquidityPoolSection, RugCheckSection, SellSection, SwapSection,
    TxSection, load_config,
};
