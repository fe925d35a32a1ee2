//! Environment URLs upgrader
//!
//! Environments created before console/portal URLs were persisted per
//! environment carry neither. The values cannot be invented: the operator
//! has to provide them. Until the configuration is set this upgrader fails
//! with an actionable message and is retried on every boot; it never
//! partially applies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::UpgradeConfig;
use crate::error::{precondition_error, AppResult};
use crate::repository::EnvironmentRepository;
use crate::upgrade::Upgrader;

/// Seeds missing console/portal URLs from operator-supplied defaults
pub struct EnvironmentUrlsUpgrader {
    environments: Arc<dyn EnvironmentRepository>,
    config: UpgradeConfig,
}

impl EnvironmentUrlsUpgrader {
    pub fn new(environments: Arc<dyn EnvironmentRepository>, config: UpgradeConfig) -> Self {
        Self {
            environments,
            config,
        }
    }
}

#[async_trait]
impl Upgrader for EnvironmentUrlsUpgrader {
    fn id(&self) -> &'static str {
        "EnvironmentUrlsUpgrader"
    }

    fn order(&self) -> i32 {
        400
    }

    async fn execute(&self) -> AppResult<bool> {
        let environments = self.environments.find_all().await?;
        let affected: Vec<&str> = environments
            .iter()
            .filter(|environment| environment.console_url.is_none())
            .map(|environment| environment.id.as_str())
            .collect();

        if affected.is_empty() {
            return Ok(true);
        }

        if self.config.default_console_url.trim().is_empty() {
            return Err(precondition_error(format!(
                "UPGRADE_DEFAULT_CONSOLE_URL is not set; cannot seed console/portal URLs \
                 for {} environment(s): {}. Set UPGRADE_DEFAULT_CONSOLE_URL (and optionally \
                 UPGRADE_DEFAULT_PORTAL_URL) and restart",
                affected.len(),
                affected.join(", ")
            )));
        }

        let mut seeded = 0;
        for environment in environments {
            if environment.console_url.is_some() {
                continue;
            }
            let mut updated = environment;
            updated.console_url = Some(self.config.default_console_url.clone());
            if updated.portal_url.is_none() && !self.config.default_portal_url.trim().is_empty() {
                updated.portal_url = Some(self.config.default_portal_url.clone());
            }
            self.environments.update(updated).await?;
            seeded += 1;
        }

        info!("Seeded console/portal URLs on {} environment(s)", seeded);
        Ok(true)
    }
}
