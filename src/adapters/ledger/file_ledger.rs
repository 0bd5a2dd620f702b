//! JSON file holdings ledger
//!
//! The whole ledger is one JSON document rewritten on every mutation
//! (write to a sibling temp file, then rename). All access goes through one
//! async mutex, so upserts and removals for a mint never interleave.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{Holding, TokenRecord};
use crate::ports::ledger::{HoldingsLedger, LedgerError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    #[serde(default)]
    tokens: Vec<TokenRecord>,
    /// Keyed by mint: one holding per mint
    #[serde(default)]
    holdings: BTreeMap<String, Holding>,
}

pub struct FileLedger {
    path: Option<PathBuf>,
    state: Mutex<LedgerState>,
}

impl FileLedger {
    /// Open or create a ledger at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                LedgerState::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            LedgerState::default()
        };

        tracing::info!(
            "Ledger opened: {} ({} holdings, {} tokens)",
            path.display(),
            state.holdings.len(),
            state.tokens.len()
        );

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Ledger that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl HoldingsLedger for FileLedger {
    async fn insert_token_record(&self, record: TokenRecord) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        state.tokens.push(record);
        if let Err(e) = self.persist(&state).await {
            state.tokens.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn find_token_records(
        &self,
        name: &str,
        creator: &str,
    ) -> Result<Vec<TokenRecord>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.name == name || t.creator == creator)
            .cloned()
            .collect())
    }

    async fn find_token_records_by_mint(&self, mint: &str) -> Result<Vec<TokenRecord>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.tokens.iter().filter(|t| t.mint == mint).cloned().collect())
    }

    async fn upsert_holding(&self, holding: Holding) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let mint = holding.mint.clone();
        let previous = state.holdings.insert(mint.clone(), holding);
        if let Err(e) = self.persist(&state).await {
            match previous {
                Some(old) => state.holdings.insert(mint, old),
                None => state.holdings.remove(&mint),
            };
            return Err(e);
        }
        tracing::info!("Holding saved: {}", mint);
        Ok(())
    }

    async fn remove_holding(&self, mint: &str) -> Result<bool, LedgerError> {
        let mut state = self.state.lock().await;
        let Some(removed) = state.holdings.remove(mint) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&state).await {
            state.holdings.insert(mint.to_string(), removed);
            return Err(e);
        }
        tracing::info!("Holding removed: {}", mint);
        Ok(true)
    }

    async fn find_holding_by_mint(&self, mint: &str) -> Result<Option<Holding>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.holdings.get(mint).cloned())
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.holdings.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn holding(mint: &str, balance: f64) -> Holding {
        Holding {
            mint: mint.to_string(),
            token_name: "Token".to_string(),
            balance,
            sol_paid: 0.01,
            sol_fee_paid: 5_000,
            sol_paid_reference: 1.5,
            sol_fee_paid_reference: 0.00075,
            per_token_reference: 1.5 / balance,
            slot: 1,
            time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            program: None,
            entry_signature: "sig".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_never_duplicates() {
        let ledger = FileLedger::in_memory();
        ledger.upsert_holding(holding("MintA", 100.0)).await.unwrap();
        ledger.upsert_holding(holding("MintA", 250.0)).await.unwrap();

        let all = ledger.list_holdings().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].balance, 250.0);
    }

    #[tokio::test]
    async fn test_remove_reports_presence() {
        let ledger = FileLedger::in_memory();
        ledger.upsert_holding(holding("MintA", 100.0)).await.unwrap();

        assert!(ledger.remove_holding("MintA").await.unwrap());
        assert!(!ledger.remove_holding("MintA").await.unwrap());
        assert!(ledger.find_holding_by_mint("MintA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_record_queries() {
        let ledger = FileLedger::in_memory();
        ledger
            .insert_token_record(TokenRecord::new("M1", "Pepe", "C1", 1))
            .await
            .unwrap();
        ledger
            .insert_token_record(TokenRecord::new("M2", "Doge", "C2", 2))
            .await
            .unwrap();

        let by_name = ledger.find_token_records("Pepe", "nobody").await.unwrap();
        assert_eq!(by_name.len(), 1);
        let by_creator = ledger.find_token_records("nothing", "C2").await.unwrap();
        assert_eq!(by_creator[0].mint, "M2");
        assert_eq!(ledger.find_token_records_by_mint("M1").await.unwrap().len(), 1);
        assert!(ledger.find_token_records("x", "y").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("holdings.json");

        {
            let ledger = FileLedger::open(&path).unwrap();
            ledger.upsert_holding(holding("MintA", 100.0)).await.unwrap();
            ledger
                .insert_token_record(TokenRecord::new("MintA", "Pepe", "C1", 1))
                .await
                .unwrap();
        }

        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.find_holding_by_mint("MintA").await.unwrap(), Some(holding("MintA", 100.0)));
        assert_eq!(reopened.find_token_records_by_mint("MintA").await.unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_open_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holdings.json");
        std::fs::write(&path, "").unwrap();

        let ledger = FileLedger::open(&path).unwrap();
        assert!(ledger.list_holdings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holdings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(FileLedger::open(&path), Err(LedgerError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_concurrent_upsert_and_remove_stay_consistent() {
        let ledger = Arc::new(FileLedger::in_memory());
        let mut handles = Vec::new();
        for i in 0..50 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    ledger.upsert_holding(holding("MintA", i as f64 + 1.0)).await.unwrap();
                } else {
                    ledger.remove_holding("MintA").await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(ledger.list_holdings().await.unwrap().len() <= 1);
    }
}
