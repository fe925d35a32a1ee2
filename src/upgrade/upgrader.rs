//! Upgrader contract

use async_trait::async_trait;

use crate::error::AppResult;

/// One versioned, idempotent data migration
///
/// Implementations must keep `id` stable across releases (the ledger is
/// keyed by it; renaming breaks idempotence) and must tolerate `execute`
/// being invoked on already-migrated data. The ledger check happens before
/// invocation, but a failed ledger write after a successful execution means
/// the same upgrader runs again on the next boot, so every transform has to
/// check current state before writing or use set-if-null style updates.
#[async_trait]
pub trait Upgrader: Send + Sync {
    /// Stable identifier, one per upgrader implementation.
    fn id(&self) -> &'static str;

    /// Total-order key. Upgraders run in non-decreasing order; ties are
    /// broken by registration sequence.
    fn order(&self) -> i32;

    /// Critical upgraders gate process startup when they fail.
    fn critical(&self) -> bool {
        false
    }

    /// Perform the migration.
    ///
    /// `Ok(true)` marks the upgrader done and writes the ledger record;
    /// `Ok(false)` and `Err` both mean the upgrader failed and will be
    /// retried on the next boot. Item-level problems inside the migration
    /// are logged and counted, not returned as failure.
    async fn execute(&self) -> AppResult<bool>;
}
