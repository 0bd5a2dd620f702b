//! Market data adapters
//!
//! - `jupiter_price`: reference prices
//! - `helius`: enhanced-transaction indexer
//! - `rugcheck`: token-safety reports

pub mod helius;
pub mod jupiter_price;
pub mod rugcheck;

pub use helius::HeliusClient;
pub use jupiter_price::JupiterPriceClient;
pub use rugcheck::RugCheckClient;
