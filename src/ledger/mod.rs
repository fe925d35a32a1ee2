//! Upgrade ledger
//!
//! Durable, append-only record of which data upgraders have completed.
//! Presence of a record means the upgrader is permanently done and is never
//! invoked again, regardless of what the domain data looks like.

mod store;

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PostgresLedger;
pub use store::{LedgerStore, UpgradeRecord};
