//! Per-mint async locks
//!
//! A buy recording its holding and a sell checking the balance for the same
//! mint take the same lock, so their ledger writes never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub struct MintLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MintLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, mint: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|key, lock| key == mint || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(mint.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
