//! Environment endpoints and wallet
//!
//! Endpoint URLs and the wallet secret live in the environment (`.env` is
//! loaded by `main` through dotenvy). They are checked once at start-up.

use std::collections::HashMap;

use super::loader::ConfigError;
use crate::adapters::market_data::rugcheck::DEFAULT_RUGCHECK_URL;

/// Where the wallet key comes from
#[derive(Debug, Clone, PartialEq)]
pub enum WalletSource {
    /// Base58 secret key
    SecretKey(String),
    /// Solana CLI keypair file
    KeypairFile(String),
}

/// Validated endpoint set
#[derive(Clone, PartialEq)]
pub struct Endpoints {
    pub rpc_url: String,
    pub submit_rpc_url: String,
    pub transactions_url: String,
    pub quote_url: String,
    pub swap_url: String,
    pub price_url: String,
    pub rugcheck_url: String,
    pub wallet: WalletSource,
}

impl std::fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // URLs carry api keys
        f.debug_struct("Endpoints")
            .field("quote_url", &self.quote_url)
            .field("swap_url", &self.swap_url)
            .field("price_url", &self.price_url)
            .field("rugcheck_url", &self.rugcheck_url)
            .finish_non_exhaustive()
    }
}

impl Endpoints {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::EnvError(format!("{} is not set", key)))
        };

        let rpc_url = require("HELIUS_HTTPS_URI")?;
        check_https(&rpc_url, "HELIUS_HTTPS_URI")?;
        check_api_key(&rpc_url, "HELIUS_HTTPS_URI")?;

        let transactions_url = require("HELIUS_HTTPS_URI_TX")?;
        check_https(&transactions_url, "HELIUS_HTTPS_URI_TX")?;
        check_api_key(&transactions_url, "HELIUS_HTTPS_URI_TX")?;
        if transactions_url.contains("{function}") {
            return Err(ConfigError::EnvError(
                "HELIUS_HTTPS_URI_TX still contains the {function} placeholder".to_string(),
            ));
        }

        let submit_rpc_url = match get("HELIUS_HTTPS_URI_SUBMIT") {
            Some(url) => {
                check_https(url, "HELIUS_HTTPS_URI_SUBMIT")?;
                url.to_string()
            }
            None => rpc_url.clone(),
        };

        let quote_url = require("JUP_HTTPS_QUOTE_URI")?;
        check_https(&quote_url, "JUP_HTTPS_QUOTE_URI")?;
        let swap_url = require("JUP_HTTPS_SWAP_URI")?;
        check_https(&swap_url, "JUP_HTTPS_SWAP_URI")?;
        let price_url = require("JUP_HTTPS_PRICE_URI")?;
        check_https(&price_url, "JUP_HTTPS_PRICE_URI")?;

        let rugcheck_url = match get("RUGCHECK_HTTPS_URI") {
            Some(url) => {
                check_https(url, "RUGCHECK_HTTPS_URI")?;
                url.to_string()
            }
            None => DEFAULT_RUGCHECK_URL.to_string(),
        };

        let wallet = match (get("PRIV_KEY_WALLET"), get("SOLANA_KEYPAIR_PATH")) {
            (Some(key), _) => {
                if !(87..=88).contains(&key.len()) {
                    return Err(ConfigError::EnvError(format!(
                        "PRIV_KEY_WALLET must be 87 or 88 characters, got {}",
                        key.len()
                    )));
                }
                WalletSource::SecretKey(key.to_string())
            }
            (None, Some(path)) => WalletSource::KeypairFile(path.to_string()),
            (None, None) => {
                return Err(ConfigError::EnvError(
                    "set PRIV_KEY_WALLET or SOLANA_KEYPAIR_PATH".to_string(),
                ))
            }
        };

        Ok(Self {
            rpc_url,
            submit_rpc_url,
            transactions_url,
            quote_url,
            swap_url,
            price_url,
            rugcheck_url,
            wallet,
        })
    }
}

fn check_https(url: &str, key: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::EnvError(format!("{} must start with https://", key)))
    }
}

fn check_api_key(url: &str, key: &str) -> Result<(), ConfigError> {
    if url.contains("api-key=") {
        Ok(())
    } else {
        Err(ConfigError::EnvError(format!("{} must carry an api-key parameter", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_vars() -> HashMap<String, String> {
        [
            ("HELIUS_HTTPS_URI", "https://mainnet.helius-rpc.com/?api-key=abc"),
            ("HELIUS_HTTPS_URI_TX", "https://api.helius.xyz/v0/transactions/?api-key=abc"),
            ("JUP_HTTPS_QUOTE_URI", "https://quote-api.jup.ag/v6/quote"),
            ("JUP_HTTPS_SWAP_URI", "https://quote-api.jup.ag/v6/swap"),
            ("JUP_HTTPS_PRICE_URI", "https://api.jup.ag/price/v2"),
            ("PRIV_KEY_WALLET", "4".repeat(88).as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_valid_environment() {
        let endpoints = Endpoints::from_vars(&valid_vars()).unwrap();
        assert_eq!(endpoints.submit_rpc_url, endpoints.rpc_url);
        assert_eq!(endpoints.rugcheck_url, DEFAULT_RUGCHECK_URL);
        assert!(matches!(endpoints.wallet, WalletSource::SecretKey(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let mut vars = valid_vars();
        vars.insert("HELIUS_HTTPS_URI".into(), "https://mainnet.helius-rpc.com/".into());
        assert!(Endpoints::from_vars(&vars).is_err());
    }

    #[test]
    fn test_function_placeholder_rejected() {
        let mut vars = valid_vars();
        vars.insert(
            "HELIUS_HTTPS_URI_TX".into(),
            "https://api.helius.xyz/v0/{function}?api-key=abc".into(),
        );
        let err = Endpoints::from_vars(&vars).unwrap_err();
        assert!(err.to_string().contains("{function}"));
    }

    #[test]
    fn test_plain_http_rejected() {
        let mut vars = valid_vars();
        vars.insert("JUP_HTTPS_SWAP_URI".into(), "http://quote-api.jup.ag/v6/swap".into());
        assert!(Endpoints::from_vars(&vars).is_err());
    }

    #[test]
    fn test_wallet_key_length_and_fallback() {
        let mut vars = valid_vars();
        vars.insert("PRIV_KEY_WALLET".into(), "short".into());
        assert!(Endpoints::from_vars(&vars).is_err());

        vars.remove("PRIV_KEY_WALLET");
        vars.insert("SOLANA_KEYPAIR_PATH".into(), "~/.config/solana/id.json".into());
        let endpoints = Endpoints::from_vars(&vars).unwrap();
        assert_eq!(
            endpoints.wallet,
            WalletSource::KeypairFile("~/.config/solana/id.json".into())
        );

        vars.remove("SOLANA_KEYPAIR_PATH");
        assert!(Endpoints::from_vars(&vars).is_err());
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = valid_vars();
        vars.insert("HELIUS_HTTPS_URI_SUBMIT".into(), "https://staked.helius-rpc.com/?api-key=x".into());
        vars.insert("RUGCHECK_HTTPS_URI".into(), "https://rugcheck.example/v1".into());
        let endpoints = Endpoints::from_vars(&vars).unwrap();
        assert_eq!(endpoints.submit_rpc_url, "https://staked.helius-rpc.com/?api-key=x");
        assert_eq!(endpoints.rugcheck_url, "https://rugcheck.example/v1");
    }
}
