//! ApiGate Management - API Management Control Plane
//!
//! Bootstrap binary: loads configuration, prepares the control-plane
//! store, then runs the upgrade phase - every registered data upgrader
//! that has not completed yet, in order, exactly once per installation.
//!
//! The upgrade phase runs before anything serves traffic. Concurrent nodes
//! starting against the same store serialize behind the ledger's boot
//! lock; whichever node runs first does the work, the rest observe the
//! ledger records and skip.

mod config;
mod db;
mod domain;
mod error;
mod ledger;
mod repository;
mod upgrade;
mod upgraders;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;
use crate::ledger::{LedgerStore, PostgresLedger};
use crate::repository::{
    PgApiRepository, PgApplicationRepository, PgCategoryRepository, PgEnvironmentRepository,
    PgInstallationRepository, PgOrganizationRepository, PgRoleRepository,
};
use crate::upgrade::Orchestrator;
use crate::upgraders::{build_registry, UpgradeContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting ApiGate Management control plane...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // Initialize database pool - REQUIRED, the ledger lives there
    let pool = match db::init_pool(&settings.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ FATAL: Failed to initialize database pool: {}", e);
            error!("DATABASE_URL must be set in .env and the database must be accessible");
            return Err(e.into());
        }
    };

    db::create_tables(&pool).await?;

    let ledger = PostgresLedger::new(pool.clone());
    ledger.init_schema().await?;
    let ledger: Arc<dyn LedgerStore> = Arc::new(ledger);

    let applied = ledger.find_all().await?;
    info!("📒 Upgrade ledger holds {} record(s)", applied.len());

    let ctx = UpgradeContext {
        ledger: ledger.clone(),
        organizations: Arc::new(PgOrganizationRepository::new(pool.clone())),
        environments: Arc::new(PgEnvironmentRepository::new(pool.clone())),
        apis: Arc::new(PgApiRepository::new(pool.clone())),
        applications: Arc::new(PgApplicationRepository::new(pool.clone())),
        categories: Arc::new(PgCategoryRepository::new(pool.clone())),
        roles: Arc::new(PgRoleRepository::new(pool.clone())),
        installation: Arc::new(PgInstallationRepository::new(pool.clone())),
        config: settings.upgrade.clone(),
    };

    let orchestrator = Orchestrator::new(ledger);
    let report = orchestrator.run(build_registry(&ctx)).await?;

    if !report.success() {
        if settings.upgrade.fail_on_critical {
            error!("❌ A critical upgrader failed, refusing to start");
            anyhow::bail!("critical upgrader failed, see log for details");
        }
        warn!("⚠️  A critical upgrader failed, starting anyway (UPGRADE_FAIL_ON_CRITICAL=false)");
    }

    info!("✅ Upgrade phase complete, control plane is ready");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,apigate_management=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}
