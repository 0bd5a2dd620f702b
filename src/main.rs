//! Raydium Sniper
//!
//! Buys tokens from freshly created Raydium pools after a token-safety check.

use anyhow::Result;

use raydium_sniper::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (endpoints and the wallet key go here, not in the toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
