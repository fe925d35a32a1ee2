//! Shipped upgrader fleet
//!
//! One module per migration plus the wiring that registers them. The
//! registration sequence below is load-bearing: it is the deterministic
//! tie-break for upgraders sharing an order key.

pub mod api_logging_condition;
pub mod application_api_key_mode;
pub mod default_roles;
pub mod environment_urls;
pub mod orphan_categories;

use std::sync::Arc;

pub use api_logging_condition::ApiLoggingConditionUpgrader;
pub use application_api_key_mode::ApplicationApiKeyModeUpgrader;
pub use default_roles::DefaultRolesUpgrader;
pub use environment_urls::EnvironmentUrlsUpgrader;
pub use orphan_categories::OrphanCategoryUpgrader;

use crate::config::UpgradeConfig;
use crate::ledger::LedgerStore;
use crate::repository::{
    ApiRepository, ApplicationRepository, CategoryRepository, EnvironmentRepository,
    InstallationRepository, OrganizationRepository, RoleRepository,
};
use crate::upgrade::{InstallationFlagBridge, LegacyFlagMapping, UpgraderRegistry};

/// Everything the shipped upgraders need, bundled for registration
pub struct UpgradeContext {
    pub ledger: Arc<dyn LedgerStore>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub environments: Arc<dyn EnvironmentRepository>,
    pub apis: Arc<dyn ApiRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub installation: Arc<dyn InstallationRepository>,
    pub config: UpgradeConfig,
}

/// Flag -> upgrader-id table for every migration that predates the ledger
pub fn legacy_flag_mapping() -> LegacyFlagMapping {
    LegacyFlagMapping::new()
        .map("orphan-category-upgrade", "OrphanCategoryUpgrader")
        .map("default-roles-setup", "DefaultRolesUpgrader")
        .map("api-logging-condition-fix", "ApiLoggingConditionUpgrader")
        .map(
            "application-api-key-mode-migration",
            "ApplicationApiKeyModeUpgrader",
        )
}

/// Register every shipped upgrader in its canonical sequence
pub fn build_registry(ctx: &UpgradeContext) -> UpgraderRegistry {
    let mut registry = UpgraderRegistry::new();

    registry.register(Arc::new(InstallationFlagBridge::new(
        ctx.installation.clone(),
        ctx.ledger.clone(),
        legacy_flag_mapping(),
    )));
    registry.register(Arc::new(DefaultRolesUpgrader::new(
        ctx.organizations.clone(),
        ctx.roles.clone(),
    )));
    registry.register(Arc::new(OrphanCategoryUpgrader::new(
        ctx.environments.clone(),
        ctx.categories.clone(),
        ctx.apis.clone(),
    )));
    registry.register(Arc::new(ApiLoggingConditionUpgrader::new(ctx.apis.clone())));
    registry.register(Arc::new(ApplicationApiKeyModeUpgrader::new(
        ctx.applications.clone(),
    )));
    registry.register(Arc::new(EnvironmentUrlsUpgrader::new(
        ctx.environments.clone(),
        ctx.config.clone(),
    )));

    registry
}
