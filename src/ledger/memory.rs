//! In-memory ledger implementation
//!
//! Test fixture mirroring the Postgres ledger's semantics: conditional
//! insert on `record`, single-holder boot lock. Supports injecting storage
//! failures to exercise the retry-next-boot paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};

use crate::error::{storage_error, AppResult};
use crate::ledger::{LedgerStore, UpgradeRecord};

#[derive(Default)]
struct FailureInjection {
    exists: HashSet<String>,
    record: HashSet<String>,
}

/// Shared in-memory ledger
#[derive(Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    failures: Arc<RwLock<FailureInjection>>,
    boot_lock: Arc<Semaphore>,
    held_permit: Arc<Mutex<Option<OwnedSemaphorePermit>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(FailureInjection::default())),
            boot_lock: Arc::new(Semaphore::new(1)),
            held_permit: Arc::new(Mutex::new(None)),
        }
    }

    /// Pre-seed a completion record.
    pub async fn seed(&self, id: impl Into<String>, applied_at: DateTime<Utc>) {
        self.records.write().await.insert(id.into(), applied_at);
    }

    /// Make `exists` fail for the given id.
    pub async fn fail_exists_for(&self, id: impl Into<String>) {
        self.failures.write().await.exists.insert(id.into());
    }

    /// Make `record` fail for the given id.
    pub async fn fail_record_for(&self, id: impl Into<String>) {
        self.failures.write().await.record.insert(id.into());
    }

    /// Stop failing `record` for the given id.
    pub async fn heal_record_for(&self, id: &str) {
        self.failures.write().await.record.remove(id);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        if self.failures.read().await.exists.contains(id) {
            return Err(storage_error(format!("injected failure on exists({})", id)));
        }
        Ok(self.records.read().await.contains_key(id))
    }

    async fn find_all(&self) -> AppResult<Vec<UpgradeRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<UpgradeRecord> = records
            .iter()
            .map(|(id, applied_at)| UpgradeRecord {
                id: id.clone(),
                applied_at: *applied_at,
            })
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn record(&self, id: &str, applied_at: DateTime<Utc>) -> AppResult<bool> {
        if self.failures.read().await.record.contains(id) {
            return Err(storage_error(format!("injected failure on record({})", id)));
        }
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Ok(false);
        }
        records.insert(id.to_string(), applied_at);
        Ok(true)
    }

    async fn acquire_boot_lock(&self) -> AppResult<()> {
        let permit = self
            .boot_lock
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| storage_error("Boot lock closed"))?;
        *self.held_permit.lock().await = Some(permit);
        Ok(())
    }

    async fn release_boot_lock(&self) -> AppResult<()> {
        self.held_permit.lock().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_is_insert_if_absent() {
        let ledger = InMemoryLedger::new();
        let now = Utc::now();

        assert!(ledger.record("X", now).await.unwrap());
        assert!(!ledger.record("X", now).await.unwrap());
        assert!(ledger.exists("X").await.unwrap());
        assert_eq!(ledger.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let ledger = InMemoryLedger::new();
        ledger.fail_exists_for("X").await;
        ledger.fail_record_for("Y").await;

        assert!(ledger.exists("X").await.is_err());
        assert!(ledger.record("Y", Utc::now()).await.is_err());
        assert!(!ledger.exists("Y").await.unwrap());

        ledger.heal_record_for("Y").await;
        assert!(ledger.record("Y", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_boot_lock_is_exclusive() {
        let ledger = InMemoryLedger::new();
        ledger.acquire_boot_lock().await.unwrap();

        let contender = ledger.clone();
        let waiter = tokio::spawn(async move {
            contender.acquire_boot_lock().await.unwrap();
            contender.release_boot_lock().await.unwrap();
        });

        // The contender cannot finish until the holder releases.
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        ledger.release_boot_lock().await.unwrap();
        waiter.await.unwrap();
    }
}
