//! Orchestrator - sequences and runs the registered upgraders
//!
//! One run per boot: take the boot lock, sort the registry, then for each
//! upgrader skip on a ledger hit or execute and record. A single upgrader
//! failing never aborts the sequence; most upgraders are independent and a
//! non-critical one must not keep the platform from starting.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::ledger::LedgerStore;
use crate::upgrade::{RegisteredUpgrader, Upgrader, UpgraderRegistry};

/// Terminal state of one upgrader for one boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeStatus {
    /// Executed and recorded this boot (or recorded by another node while
    /// this one was executing).
    Done,
    /// Ledger record already existed; not invoked.
    Skipped,
    /// Failed; no ledger record written, retried on the next boot.
    Failed,
}

/// Result of one upgrader for one boot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOutcome {
    pub id: &'static str,
    pub order: i32,
    pub critical: bool,
    pub status: UpgradeStatus,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Result of a whole orchestrator run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeReport {
    pub outcomes: Vec<UpgradeOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl UpgradeReport {
    /// False iff a critical upgrader failed. Non-critical failures are
    /// reported but do not fail boot.
    pub fn success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| o.critical && o.status == UpgradeStatus::Failed)
    }

    pub fn count(&self, status: UpgradeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Sequences the registered upgraders against the shared ledger
pub struct Orchestrator {
    ledger: Arc<dyn LedgerStore>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Run every pending upgrader once, in `(order, registration)` order.
    ///
    /// Only a boot-lock acquisition failure aborts the run; everything else
    /// is captured per upgrader in the report.
    pub async fn run(&self, registry: UpgraderRegistry) -> AppResult<UpgradeReport> {
        if registry.is_empty() {
            info!("No upgraders registered, skipping upgrade phase");
            return Ok(UpgradeReport {
                outcomes: Vec::new(),
                finished_at: Utc::now(),
            });
        }

        info!("Running upgrade phase ({} upgraders registered)", registry.len());
        self.ledger.acquire_boot_lock().await?;

        let report = self.run_locked(registry).await;

        if let Err(e) = self.ledger.release_boot_lock().await {
            warn!("Failed to release upgrade boot lock: {}", e);
        }

        info!(
            "Upgrade phase finished: {} applied, {} skipped, {} failed",
            report.count(UpgradeStatus::Done),
            report.count(UpgradeStatus::Skipped),
            report.count(UpgradeStatus::Failed),
        );
        Ok(report)
    }

    async fn run_locked(&self, registry: UpgraderRegistry) -> UpgradeReport {
        let mut entries = registry.into_entries();
        entries.sort_by_key(|entry| (entry.upgrader.order(), entry.discovery_index));

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in &entries {
            // Strictly sequential: later upgraders may depend on the
            // effects of earlier ones.
            outcomes.push(self.run_one(entry).await);
        }

        UpgradeReport {
            outcomes,
            finished_at: Utc::now(),
        }
    }

    async fn run_one(&self, entry: &RegisteredUpgrader) -> UpgradeOutcome {
        let upgrader = &entry.upgrader;
        let id = upgrader.id();
        let mut outcome = UpgradeOutcome {
            id,
            order: upgrader.order(),
            critical: upgrader.critical(),
            status: UpgradeStatus::Failed,
            error: None,
            duration_ms: 0,
        };

        match self.ledger.exists(id).await {
            Ok(true) => {
                debug!("Upgrader {} already applied, skipping", id);
                outcome.status = UpgradeStatus::Skipped;
                return outcome;
            }
            Ok(false) => {}
            Err(e) => {
                // The ledger's state cannot be read; neither "not yet
                // applied" nor "applied" may be assumed.
                error!("Upgrader {}: cannot query ledger, deferring to next boot: {}", id, e);
                outcome.error = Some(e.to_string());
                return outcome;
            }
        }

        let started = Instant::now();
        let executed = upgrader.execute().await;
        outcome.duration_ms = started.elapsed().as_millis() as u64;

        match executed {
            Ok(true) => match self.ledger.record(id, Utc::now()).await {
                Ok(true) => {
                    info!("Upgrader {} applied in {}ms", id, outcome.duration_ms);
                    outcome.status = UpgradeStatus::Done;
                }
                Ok(false) => {
                    // Another node recorded completion while this one was
                    // executing; this execution was redundant but idempotent.
                    info!("Upgrader {} was recorded by another node, discarding duplicate run", id);
                    outcome.status = UpgradeStatus::Done;
                }
                Err(e) => {
                    error!(
                        "Upgrader {} executed but its ledger record could not be written, \
                         it will re-run on the next boot: {}",
                        id, e
                    );
                    outcome.error = Some(e.to_string());
                }
            },
            Ok(false) => {
                error!("Upgrader {} reported failure, retrying on next boot", id);
            }
            Err(e) => {
                error!("Upgrader {} failed, retrying on next boot: {}", id, e);
                outcome.error = Some(e.to_string());
            }
        }

        outcome
    }
}
