//! Trading wallet
//!
//! Holds the keypair that pays for and signs every swap. The key comes
//! either from a base58 secret (`PRIV_KEY_WALLET`) or from a Solana CLI
//! keypair file.

use std::path::Path;

use solana_sdk::{
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::VersionedTransaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from {path}: {reason}")]
    LoadError { path: String, reason: String },
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
}

pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Solana CLI keypair file (JSON byte array); `~` is expanded
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::tilde(&raw).into_owned();
        let keypair = read_keypair_file(&expanded).map_err(|e| WalletError::LoadError {
            path: expanded.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { keypair })
    }

    /// Base58 encoding of the 64-byte secret key, as wallets export it
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Not base58: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        Keypair::try_from(bytes)
            .map(|keypair| Self { keypair })
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))
    }

    /// Throwaway wallet for tests
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Sign a versioned message; the wallet must be its only required signer
    pub fn sign_versioned(&self, message: VersionedMessage) -> Result<VersionedTransaction, WalletError> {
        VersionedTransaction::try_new(message, &[&self.keypair])
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }

    /// Secret key bytes, in keypair-file order
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }
}
