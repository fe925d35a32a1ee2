//! Ledger store contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// One applied-upgrader record
///
/// Created once, immediately after an upgrader reports success; never
/// updated, never deleted (removing one to force a re-run is a manual
/// operator intervention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRecord {
    pub id: String,
    pub applied_at: DateTime<Utc>,
}

/// Persistent store of applied-upgrader records
///
/// Queried and written by every control-plane node against one shared
/// backing store. A storage error on either call is fatal to that
/// upgrader's cycle for this boot: it must never be read as "not yet
/// applied" (silent re-run) nor as "applied" (skipped work).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Whether a completion record exists for the given upgrader id.
    async fn exists(&self, id: &str) -> AppResult<bool>;

    /// Every completion record, ordered by upgrader id.
    async fn find_all(&self) -> AppResult<Vec<UpgradeRecord>>;

    /// Write a completion record, atomically, if none exists yet.
    ///
    /// Returns `Ok(true)` when this caller created the record and
    /// `Ok(false)` when another writer already had. The conditional insert
    /// is what makes the check-then-write sequence safe across nodes: the
    /// losing writer learns its execution was redundant and must not treat
    /// the conflict as an error.
    async fn record(&self, id: &str, applied_at: DateTime<Utc>) -> AppResult<bool>;

    /// Serialize orchestrator runs across nodes sharing this store.
    ///
    /// Held for the whole run; blocks until the holder finishes. The store
    /// must drop the lock on its own if the holding node dies mid-run.
    async fn acquire_boot_lock(&self) -> AppResult<()>;

    /// Release the boot lock taken by [`acquire_boot_lock`].
    ///
    /// [`acquire_boot_lock`]: LedgerStore::acquire_boot_lock
    async fn release_boot_lock(&self) -> AppResult<()>;
}
