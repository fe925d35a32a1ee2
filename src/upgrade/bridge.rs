//! Legacy status bridge
//!
//! Before the ledger existed, one-off migration scripts marked completion
//! by writing `"SUCCESS"` flags into the installation's
//! `additional_information` map. The bridge translates those flags into
//! ledger records exactly once, so pre-ledger migrations are not re-run by
//! the framework. It runs before every legacy-mapped upgrader and never
//! writes back to the installation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::domain::installation::LEGACY_FLAG_SUCCESS;
use crate::error::AppResult;
use crate::ledger::LedgerStore;
use crate::repository::InstallationRepository;
use crate::upgrade::Upgrader;

/// Order below every legacy-mapped upgrader (all of which use order >= 100),
/// guaranteeing the ledger is seeded before the orchestrator reaches them.
pub const BRIDGE_ORDER: i32 = -100;

/// Explicit flag-name -> upgrader-id translation table
///
/// Built once at startup and handed to the bridge; there is no ambient
/// static mapping. One entry per pre-ledger migration, frozen: legacy
/// scripts no longer produce new flags.
#[derive(Debug, Clone, Default)]
pub struct LegacyFlagMapping {
    entries: HashMap<&'static str, &'static str>,
}

impl LegacyFlagMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one flag -> upgrader-id entry (builder style).
    pub fn map(mut self, flag: &'static str, upgrader_id: &'static str) -> Self {
        self.entries.insert(flag, upgrader_id);
        self
    }

    pub fn resolve(&self, flag: &str) -> Option<&'static str> {
        self.entries.get(flag).copied()
    }
}

/// Seeds the ledger from the installation's legacy completion flags
pub struct InstallationFlagBridge {
    installation: Arc<dyn InstallationRepository>,
    ledger: Arc<dyn LedgerStore>,
    mapping: LegacyFlagMapping,
}

impl InstallationFlagBridge {
    pub fn new(
        installation: Arc<dyn InstallationRepository>,
        ledger: Arc<dyn LedgerStore>,
        mapping: LegacyFlagMapping,
    ) -> Self {
        Self {
            installation,
            ledger,
            mapping,
        }
    }
}

#[async_trait]
impl Upgrader for InstallationFlagBridge {
    fn id(&self) -> &'static str {
        "InstallationFlagBridge"
    }

    fn order(&self) -> i32 {
        BRIDGE_ORDER
    }

    async fn execute(&self) -> AppResult<bool> {
        let installation = self.installation.get().await?;

        // Deterministic iteration so repeated boots log identically.
        let mut flags: Vec<(&String, &String)> =
            installation.additional_information.iter().collect();
        flags.sort_by(|a, b| a.0.cmp(b.0));

        let mut seeded = 0;
        for (flag, value) in flags {
            if value.as_str() != LEGACY_FLAG_SUCCESS {
                debug!("Legacy flag '{}' has status '{}', not bridging", flag, value);
                continue;
            }

            let Some(upgrader_id) = self.mapping.resolve(flag) else {
                // An unknown flag is an operator curiosity, not a reason to
                // abandon the remaining flags.
                error!("No upgrader mapped to legacy flag '{}', skipping it", flag);
                continue;
            };

            if self.ledger.exists(upgrader_id).await? {
                continue;
            }
            if self.ledger.record(upgrader_id, Utc::now()).await? {
                info!("Seeded ledger record for {} from legacy flag '{}'", upgrader_id, flag);
                seeded += 1;
            }
        }

        if seeded > 0 {
            info!("Legacy bridge seeded {} ledger record(s)", seeded);
        }
        Ok(true)
    }
}
