//! PostgreSQL ledger implementation
//!
//! Records live in the `upgrade_records` table; the primary key on the
//! upgrader id is the at-most-one-record invariant. The boot lock is a
//! session-scoped advisory lock held on a dedicated pooled connection for
//! the duration of the run, so the server releases it automatically if the
//! holding node dies.

use chrono::{DateTime, Utc};

use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use tokio::sync::RwLock;

use crate::error::{storage_error, AppResult};
use crate::ledger::{LedgerStore, UpgradeRecord};

/// Advisory lock key shared by every control-plane node.
const BOOT_LOCK_KEY: i64 = 0x5550_4752_4144_4531;

/// Ledger backed by the control-plane database
pub struct PostgresLedger {
    pool: Pool,
    /// Connection holding the advisory lock while a run is in progress.
    lock_client: RwLock<Option<Object>>,
}

impl PostgresLedger {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            lock_client: RwLock::new(None),
        }
    }

    /// Create the ledger table if it does not exist yet.
    pub async fn init_schema(&self) -> AppResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS upgrade_records (
                    id TEXT PRIMARY KEY,
                    applied_at TIMESTAMPTZ NOT NULL
                )",
                &[],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    async fn exists(&self, id: &str) -> AppResult<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT id FROM upgrade_records WHERE id = $1", &[&id])
            .await?;
        Ok(row.is_some())
    }

    async fn find_all(&self) -> AppResult<Vec<UpgradeRecord>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT id, applied_at FROM upgrade_records ORDER BY id", &[])
            .await?;

        Ok(rows
            .iter()
            .map(|row| UpgradeRecord {
                id: row.get(0),
                applied_at: row.get(1),
            })
            .collect())
    }

    async fn record(&self, id: &str, applied_at: DateTime<Utc>) -> AppResult<bool> {
        let client = self.pool.get().await?;
        let inserted = client
            .execute(
                "INSERT INTO upgrade_records (id, applied_at) VALUES ($1, $2)
                 ON CONFLICT (id) DO NOTHING",
                &[&id, &applied_at],
            )
            .await?;
        Ok(inserted == 1)
    }

    async fn acquire_boot_lock(&self) -> AppResult<()> {
        let mut held = self.lock_client.write().await;
        if held.is_some() {
            return Err(storage_error("Boot lock already held by this process"));
        }

        // The lock is tied to the session, so the client object must stay
        // alive until release.
        let client = self.pool.get().await?;
        client
            .execute("SELECT pg_advisory_lock($1)", &[&BOOT_LOCK_KEY])
            .await?;
        *held = Some(client);
        Ok(())
    }

    async fn release_boot_lock(&self) -> AppResult<()> {
        let mut held = self.lock_client.write().await;
        if let Some(client) = held.take() {
            client
                .execute("SELECT pg_advisory_unlock($1)", &[&BOOT_LOCK_KEY])
                .await?;
        }
        Ok(())
    }
}
